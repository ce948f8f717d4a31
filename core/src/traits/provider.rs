use async_trait::async_trait;

/// Stop sequence that ends a reasoning step before the model invents an observation.
pub const OBSERVATION_STOP: &str = "\nObservation";

#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub prompt: &'a str,
    pub stop: &'a [&'a str],
}

impl<'a> CompletionRequest<'a> {
    pub fn new(prompt: &'a str) -> Self {
        Self { prompt, stop: &[] }
    }

    pub fn with_stop(mut self, stop: &'a [&'a str]) -> Self {
        self.stop = stop;
        self
    }
}

#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: CompletionRequest<'_>) -> anyhow::Result<String>;
}
