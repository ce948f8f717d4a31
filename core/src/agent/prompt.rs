use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;
use thiserror::Error;

static SLOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{(\w+)\}").unwrap());

pub const SLOT_TOOLS: &str = "tools";
pub const SLOT_TOOL_NAMES: &str = "tool_names";
pub const SLOT_INPUT: &str = "input";
pub const SLOT_SCRATCHPAD: &str = "agent_scratchpad";

const REACT_SLOTS: [&str; 4] = [SLOT_TOOLS, SLOT_TOOL_NAMES, SLOT_INPUT, SLOT_SCRATCHPAD];

pub const DETAILED_TEMPLATE: &str = r#"Você é um agente da Defesa Civil responsável por responder perguntas sobre a tábua de marés,
com base na cidade e na data informadas pelo usuário.

Você tem acesso às seguintes ferramentas:

{tools}

Use o seguinte formato nas suas respostas:

Question: a pergunta que você deve responder
Thought: pense sempre no que fazer a seguir.
Se a pergunta depender da data ou hora atual ("hoje", "agora", "neste momento"), use primeiro a ferramenta `get_current_datetime` para obter o momento exato.
Monte a URL da consulta no padrão "https://pt.tideschart.com/<país>/<estado>/<cidade>#_mares", onde <país> é o nome do país em inglês, <estado> é o estado da cidade e <cidade> é a cidade pedida pelo usuário, todos em minúsculas e separados por hífen.
Para obter as informações dessa URL, use a ferramenta `tavily_search_results_json`.
Não use nenhum link além do que foi montado.
Confirme que as informações correspondem exatamente ao dia pedido.
Responda sempre com uma tabela contendo o nível da maré e o horário, seguida dos links das fontes usadas.

Action: a ação a executar, deve ser uma de [{tool_names}]
Action Input: a entrada da ação
Observation: o resultado da ação
... (este ciclo Thought/Action/Action Input/Observation pode se repetir N vezes)
Thought: agora eu sei a resposta final
Final Answer: a resposta final para a pergunta original

Begin!

Question: {input}
Thought:{agent_scratchpad}"#;

pub const BASIC_TEMPLATE: &str = r#"Você é um agente da Defesa Civil responsável por responder perguntas sobre a tábua de marés,
com base na cidade e na data informadas pelo usuário.

Você tem acesso às seguintes ferramentas:

{tools}

Use o seguinte formato nas suas respostas:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question

Begin!

Question: {input}
Thought:{agent_scratchpad}"#;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("template is missing required slot {{{0}}}")]
    MissingSlot(String),
    #[error("template uses unknown slot {{{0}}}")]
    UnknownSlot(String),
    #[error("no value supplied for slot {{{0}}}")]
    MissingValue(String),
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    slots: BTreeSet<String>,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let slots = SLOT
            .captures_iter(&template)
            .map(|caps| caps[1].to_string())
            .collect();
        Self { template, slots }
    }

    pub fn react(template: impl Into<String>) -> Result<Self, PromptError> {
        let prompt = Self::new(template);
        for slot in REACT_SLOTS {
            if !prompt.slots.contains(slot) {
                return Err(PromptError::MissingSlot(slot.to_string()));
            }
        }
        if let Some(unknown) = prompt.slots.iter().find(|s| !REACT_SLOTS.contains(&s.as_str())) {
            return Err(PromptError::UnknownSlot(unknown.clone()));
        }
        Ok(prompt)
    }

    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(String::as_str)
    }

    pub fn render(&self, vars: &HashMap<&str, &str>) -> Result<String, PromptError> {
        if let Some(missing) = self.slots.iter().find(|s| !vars.contains_key(s.as_str())) {
            return Err(PromptError::MissingValue(missing.clone()));
        }

        let rendered = SLOT.replace_all(&self.template, |caps: &regex::Captures| {
            vars.get(&caps[1]).copied().unwrap_or_default().to_string()
        });
        Ok(rendered.into_owned())
    }
}
