use crate::agent::error::ExecutionError;
use crate::agent::parser::{self, AgentAction, Step};
use crate::agent::prompt::{
    PromptTemplate, SLOT_INPUT, SLOT_SCRATCHPAD, SLOT_TOOL_NAMES, SLOT_TOOLS,
};
use crate::agent::registry::ToolRegistry;
use crate::traits::{CompletionRequest, OBSERVATION_STOP, Provider};
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, info, warn};

const STOP: &[&str] = &[OBSERVATION_STOP];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchEntry {
    pub thought: String,
    pub action_name: String,
    pub action_input: String,
    pub observation: String,
    pub log: String,
}

impl ScratchEntry {
    fn new(action: AgentAction, observation: String) -> Self {
        Self {
            thought: action.thought,
            action_name: action.tool,
            action_input: action.input,
            observation,
            log: action.log,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentOutput {
    pub output: String,
    pub steps: Vec<ScratchEntry>,
}

pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    prompt: PromptTemplate,
    tools: ToolRegistry,
    max_iterations: Option<usize>,
}

impl AgentLoop {
    pub fn new(provider: Arc<dyn Provider>, prompt: PromptTemplate, tools: ToolRegistry) -> Self {
        Self {
            provider,
            prompt,
            tools,
            max_iterations: None,
        }
    }

    pub fn with_max_iterations(mut self, max: Option<usize>) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub async fn invoke(&self, question: &str) -> Result<AgentOutput, ExecutionError> {
        let mut scratch: Vec<ScratchEntry> = Vec::new();
        let mut iterations = 0;

        loop {
            if let Some(max) = self.max_iterations
                && iterations >= max
            {
                return Err(ExecutionError::IterationLimit { iterations });
            }
            iterations += 1;

            let prompt = self.render_prompt(question, &scratch)?;
            debug!(iteration = iterations, %prompt, "Sending prompt");

            let request = CompletionRequest::new(&prompt).with_stop(STOP);
            let text = self
                .provider
                .complete(request)
                .await
                .map_err(ExecutionError::Backend)?;

            match parser::parse(&text)? {
                Step::Finish { thought, answer } => {
                    info!(iteration = iterations, %thought, "Final answer reached");
                    return Ok(AgentOutput {
                        output: answer,
                        steps: scratch,
                    });
                }
                Step::Action(action) => {
                    info!(
                        iteration = iterations,
                        thought = %action.thought,
                        tool = %action.tool,
                        input = %action.input,
                        "Invoking tool"
                    );
                    let observation = self.run_action(&action).await?;
                    info!(tool = %action.tool, %observation, "Observation");
                    scratch.push(ScratchEntry::new(action, observation));
                }
            }
        }
    }

    async fn run_action(&self, action: &AgentAction) -> Result<String, ExecutionError> {
        let tool = self
            .tools
            .get(&action.tool)
            .ok_or_else(|| ExecutionError::UnknownTool {
                name: action.tool.clone(),
                available: self.tools.names().join(", "),
            })?;

        match tool.invoke(&action.input).await {
            Ok(output) => Ok(output),
            Err(e) => {
                warn!(tool = %action.tool, error = %e, "Tool failed");
                Ok(format!("Error: {}", e))
            }
        }
    }

    fn render_prompt(&self, question: &str, scratch: &[ScratchEntry]) -> Result<String, ExecutionError> {
        let tools = self.tools.descriptions();
        let tool_names = self.tools.names().join(", ");
        let scratchpad = render_scratchpad(scratch);

        let vars = HashMap::from([
            (SLOT_TOOLS, tools.as_str()),
            (SLOT_TOOL_NAMES, tool_names.as_str()),
            (SLOT_INPUT, question),
            (SLOT_SCRATCHPAD, scratchpad.as_str()),
        ]);
        Ok(self.prompt.render(&vars)?)
    }
}

fn render_scratchpad(scratch: &[ScratchEntry]) -> String {
    let mut out = String::new();
    for entry in scratch {
        let _ = write!(out, "{}\nObservation: {}\nThought: ", entry.log, entry.observation);
    }
    out
}
