use anyhow::Result;
use clap::{Parser, Subcommand};
use mare_core::{Config, Variant, create_agent};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod chat;

use crate::chat::Console;

#[derive(Parser)]
#[command(name = "mare")]
#[command(about = "mare - tide-table agent backed by a hosted LLM and web search", long_about = None)]
struct Cli {
    /// TOML config file (defaults to ~/.mare/config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend variant: bedrock, gemini or openai
    #[arg(long, global = true)]
    variant: Option<Variant>,

    /// Stop a question after this many reasoning steps (unbounded by default)
    #[arg(long, global = true)]
    max_iterations: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive question loop (default)
    Chat,
    /// Answer a single question and exit
    Ask { question: String },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mare_core=info,mare=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_overrides(cli.variant, cli.max_iterations);

    let agent = create_agent(&config)?;
    let ui = if console::Term::stdout().is_term() {
        Console::styled()
    } else {
        Console::plain()
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let stdin = std::io::stdin();
            ui.run(&agent, stdin.lock(), &mut out).await?;
        }
        Commands::Ask { question } => match agent.invoke(&question).await {
            Ok(response) => ui.answer(&mut out, &response.output)?,
            Err(e) => {
                ui.failure(&mut out, &e)?;
                out.flush()?;
                anyhow::bail!("Agent processing failed: {}", e);
            }
        },
    }

    out.flush()?;
    Ok(())
}
