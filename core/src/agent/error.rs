use crate::agent::parser::ParseError;
use crate::agent::prompt::PromptError;
use thiserror::Error;

/// Why a single `invoke` failed. The caller decides whether to keep going.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("backend request failed: {0:#}")]
    Backend(#[source] anyhow::Error),
    #[error("malformed model output: {0}")]
    MalformedOutput(#[from] ParseError),
    #[error("model requested unknown tool '{name}', expected one of [{available}]")]
    UnknownTool { name: String, available: String },
    #[error("prompt rendering failed: {0}")]
    Prompt(#[from] PromptError),
    #[error("stopped after {iterations} iterations without a final answer")]
    IterationLimit { iterations: usize },
}
