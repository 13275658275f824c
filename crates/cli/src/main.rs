//! Groundwire CLI — the main entry point.
//!
//! Commands:
//! - `chat`   — Interactive REPL with streaming answers
//! - `ask`    — Answer a single question and exit
//! - `config` — Show (or initialize) the configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "groundwire",
    about = "Groundwire — confidence-gated, memory-aware answer routing",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat with conversation memory
    Chat,

    /// Answer a single question and exit
    Ask {
        /// The question to answer
        question: String,
    },

    /// Show the active configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat => commands::chat::run().await?,
        Commands::Ask { question } => commands::ask::run(&question).await?,
        Commands::Config { init } => commands::config_cmd::run(init)?,
    }

    Ok(())
}
