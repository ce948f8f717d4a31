pub mod error;
pub mod factory;
pub mod loop_;
pub mod parser;
pub mod prompt;
pub mod registry;

pub use error::ExecutionError;
pub use factory::{assemble_agent, create_agent};
pub use loop_::{AgentLoop, AgentOutput, ScratchEntry};
pub use parser::{AgentAction, ParseError, Step};
pub use prompt::{BASIC_TEMPLATE, DETAILED_TEMPLATE, PromptError, PromptTemplate};
pub use registry::ToolRegistry;
