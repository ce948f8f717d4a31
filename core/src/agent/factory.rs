use crate::agent::prompt::{BASIC_TEMPLATE, DETAILED_TEMPLATE, PromptTemplate};
use crate::agent::{AgentLoop, ToolRegistry};
use crate::config::{Config, Variant};
use crate::providers::create_provider;
use crate::tools::create_tools;
use crate::traits::Provider;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

pub fn template_for(variant: Variant) -> &'static str {
    match variant {
        Variant::Gemini => BASIC_TEMPLATE,
        Variant::Bedrock | Variant::OpenAI => DETAILED_TEMPLATE,
    }
}

pub fn assemble_agent(
    config: &Config,
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
) -> Result<AgentLoop> {
    let prompt = PromptTemplate::react(template_for(config.variant))?;
    info!(
        variant = %config.variant,
        provider = provider.name(),
        tools = %tools.names().join(", "),
        max_iterations = ?config.max_iterations,
        "Agent configured"
    );
    Ok(AgentLoop::new(provider, prompt, tools).with_max_iterations(config.max_iterations))
}

pub fn create_agent(config: &Config) -> Result<AgentLoop> {
    let provider = create_provider(config)?;
    let tools = create_tools(config)?;
    assemble_agent(config, provider, tools)
}
