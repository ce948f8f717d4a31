use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

const FINAL_ANSWER: &str = "Final Answer:";

static ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
        .unwrap()
});
static ACTION_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)").unwrap());
static ACTION_INPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)").unwrap());
static THOUGHT_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Action\s*\d*\s*:|Final Answer:").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("output contains both a final answer and an action: `{0}`")]
    FinalAnswerAndAction(String),
    #[error("missing 'Action:' after 'Thought:' in `{0}`")]
    MissingAction(String),
    #[error("missing 'Action Input:' after 'Action:' in `{0}`")]
    MissingActionInput(String),
    #[error("final answer is empty in `{0}`")]
    EmptyFinalAnswer(String),
    #[error("could not parse model output: `{0}`")]
    Unrecognised(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentAction {
    pub thought: String,
    pub tool: String,
    pub input: String,
    pub log: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Action(AgentAction),
    Finish { thought: String, answer: String },
}

/// Drops anything the model wrote after inventing its own observation.
fn truncate_at_observation(text: &str) -> &str {
    match text.find("\nObservation") {
        Some(idx) => &text[..idx],
        None => text,
    }
}

fn thought_of(text: &str) -> String {
    let end = THOUGHT_END.find(text).map_or(text.len(), |m| m.start());
    text[..end].trim().to_string()
}

pub fn parse(output: &str) -> Result<Step, ParseError> {
    let text = truncate_at_observation(output);
    let includes_answer = text.contains(FINAL_ANSWER);

    if let Some(caps) = ACTION.captures(text) {
        if includes_answer {
            return Err(ParseError::FinalAnswerAndAction(text.to_string()));
        }
        let tool = caps[1].trim().to_string();
        let input = caps[2].trim().trim_matches('"').to_string();
        return Ok(Step::Action(AgentAction {
            thought: thought_of(text),
            tool,
            input,
            log: text.to_string(),
        }));
    }

    if let Some(idx) = text.find(FINAL_ANSWER) {
        let answer = text[idx + FINAL_ANSWER.len()..].trim().to_string();
        if answer.is_empty() {
            return Err(ParseError::EmptyFinalAnswer(text.to_string()));
        }
        return Ok(Step::Finish {
            thought: thought_of(text),
            answer,
        });
    }

    if !ACTION_NAME.is_match(text) {
        return Err(ParseError::MissingAction(text.to_string()));
    }
    if !ACTION_INPUT.is_match(text) {
        return Err(ParseError::MissingActionInput(text.to_string()));
    }
    Err(ParseError::Unrecognised(text.to_string()))
}
