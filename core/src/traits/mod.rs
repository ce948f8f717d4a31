pub mod provider;
pub mod tool;

pub use provider::{CompletionRequest, OBSERVATION_STOP, Provider};
pub use tool::{Tool, ToolError};
