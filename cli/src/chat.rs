use console::style;
use mare_core::AgentLoop;
use std::io::{BufRead, Write};
use termimad::MadSkin;
use tracing::error;

pub const EXIT_COMMAND: &str = "sair";
const QUESTION_PROMPT: &str = "Sua pergunta (Se possível, informe a cidade e a data): ";

pub fn is_exit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(EXIT_COMMAND)
}

pub struct Console {
    skin: Option<MadSkin>,
}

impl Console {
    pub fn styled() -> Self {
        Self {
            skin: Some(MadSkin::default()),
        }
    }

    pub fn plain() -> Self {
        Self { skin: None }
    }

    pub fn banner(&self, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(
            out,
            "{}",
            style("Bem-vindo ao Agente da Defesa Civil para Tábua de Marés!")
                .cyan()
                .bold()
        )?;
        writeln!(out, "Digite '{}' para encerrar.", EXIT_COMMAND)
    }

    pub fn answer(&self, out: &mut impl Write, answer: &str) -> std::io::Result<()> {
        writeln!(out, "\n{}", style("Resposta do Agente:").green().bold())?;
        match &self.skin {
            Some(skin) => write!(out, "{}", skin.term_text(answer)),
            None => writeln!(out, "{}", answer),
        }
    }

    pub fn failure(&self, out: &mut impl Write, cause: &dyn std::fmt::Display) -> std::io::Result<()> {
        writeln!(out, "{} {}", style("Ocorreu um erro:").red().bold(), cause)?;
        writeln!(
            out,
            "Por favor, verifique suas chaves de API e a conectividade."
        )
    }

    /// Read questions until EOF or the exit command. Failed invocations are
    /// reported and the loop keeps going. Returns how many questions were sent.
    pub async fn run<R, W>(&self, agent: &AgentLoop, mut input: R, out: &mut W) -> std::io::Result<usize>
    where
        R: BufRead,
        W: Write,
    {
        self.banner(out)?;
        let mut asked = 0;

        loop {
            write!(out, "\n{}", style(QUESTION_PROMPT).bold())?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                break;
            }
            if is_exit(&line) {
                break;
            }
            let question = line.trim();
            if question.is_empty() {
                continue;
            }

            asked += 1;
            match agent.invoke(question).await {
                Ok(response) => self.answer(out, &response.output)?,
                Err(e) => {
                    error!(error = %e, "Agent invocation failed");
                    self.failure(out, &e)?;
                }
            }
        }

        Ok(asked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mare_core::agent::{BASIC_TEMPLATE, PromptTemplate};
    use mare_core::{CompletionRequest, Provider, ToolRegistry};
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    struct Scripted {
        replies: Mutex<VecDeque<&'static str>>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl Provider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _request: CompletionRequest<'_>) -> anyhow::Result<String> {
            *self.calls.lock().unwrap() += 1;
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("connection refused"))
        }
    }

    fn agent(replies: &[&'static str]) -> (AgentLoop, Arc<Scripted>) {
        let provider = Arc::new(Scripted {
            replies: Mutex::new(replies.iter().copied().collect()),
            calls: Mutex::new(0),
        });
        let agent = AgentLoop::new(
            provider.clone(),
            PromptTemplate::react(BASIC_TEMPLATE).unwrap(),
            ToolRegistry::new(),
        );
        (agent, provider)
    }

    async fn drive(agent: &AgentLoop, input: &str) -> (usize, String) {
        let mut out = Vec::new();
        let asked = Console::plain()
            .run(agent, Cursor::new(input.as_bytes()), &mut out)
            .await
            .unwrap();
        (asked, String::from_utf8(out).unwrap())
    }

    #[test]
    fn exit_command_ignores_case_and_whitespace() {
        assert!(is_exit("sair"));
        assert!(is_exit("SAIR\n"));
        assert!(is_exit("  Sair  "));
        assert!(!is_exit("sair agora"));
        assert!(!is_exit("sai"));
    }

    #[tokio::test]
    async fn exit_command_stops_without_invoking_agent() {
        let (agent, provider) = agent(&[]);
        let (asked, out) = drive(&agent, "SaIr\nQual a maré?\n").await;

        assert_eq!(asked, 0);
        assert_eq!(*provider.calls.lock().unwrap(), 0);
        assert!(out.contains("Digite 'sair' para encerrar."));
    }

    #[tokio::test]
    async fn prints_answer_and_continues_after_failure() {
        let (agent, provider) = agent(&[" Sei.\nFinal Answer: Maré alta às 09:58."]);
        let (asked, out) = drive(&agent, "Qual a maré hoje em Santos?\n\nE amanhã?\nsair\n").await;

        assert_eq!(asked, 2);
        assert_eq!(*provider.calls.lock().unwrap(), 2);
        assert!(out.contains("Resposta do Agente:"));
        assert!(out.contains("Maré alta às 09:58."));
        assert!(out.contains("Ocorreu um erro:"));
        assert!(out.contains("connection refused"));
        assert!(out.contains("verifique suas chaves de API"));
    }

    #[tokio::test]
    async fn end_of_input_ends_loop() {
        let (agent, _) = agent(&[" ok\nFinal Answer: sim"]);
        let (asked, out) = drive(&agent, "pergunta").await;
        assert_eq!(asked, 1);
        assert!(out.contains("sim"));
    }
}
