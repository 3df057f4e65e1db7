use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lexbot::config::Config;
use lexbot::event::TaskEvent;
use lexbot::{handler, server};

#[derive(Parser)]
#[command(name = "lexbot", version, about = "Serverless browser-automation runner")]
struct Cli {
    /// Path to config.toml (defaults to ~/.lexbot/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one task descriptor and print the result mapping
    Run {
        /// Inline JSON task descriptor
        #[arg(long, conflicts_with = "event_file")]
        event: Option<String>,
        /// Read the task descriptor from a file
        #[arg(long)]
        event_file: Option<PathBuf>,
    },
    /// Serve the container invocation endpoint
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        #[arg(long, default_value_t = 9000, env = "PORT")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lexbot=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.clone())?;
    config.ensure_dirs()?;

    match cli.command.unwrap_or(Command::Run {
        event: None,
        event_file: None,
    }) {
        Command::Run { event, event_file } => {
            let event = load_event(event, event_file)?;
            let result = handler::handle(event, &config).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Serve { bind, port } => {
            let addr: SocketAddr = format!("{bind}:{port}")
                .parse()
                .with_context(|| format!("invalid bind address {bind}:{port}"))?;
            server::serve(config, addr).await?;
        }
    }

    Ok(())
}

fn load_event(inline: Option<String>, file: Option<PathBuf>) -> Result<TaskEvent> {
    let raw = match (inline, file) {
        (Some(json), _) => json,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read event file {}", path.display()))?,
        (None, None) => return Ok(TaskEvent::default()),
    };
    serde_json::from_str(&raw).context("invalid task descriptor")
}
