use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    Execution(String),
}

impl ToolError {
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn invoke(&self, input: &str) -> Result<String, ToolError>;

    fn render(&self) -> String {
        format!("{}: {}", self.name(), self.description())
    }
}
