pub mod agent;
pub mod config;
pub mod providers;
pub mod tools;
pub mod traits;

pub use agent::{AgentLoop, AgentOutput, ExecutionError, ToolRegistry, create_agent};
pub use config::{Config, ConfigError, Variant};
pub use providers::create_provider;
pub use traits::*;
