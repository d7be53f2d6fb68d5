//! # accobot CLI
//!
//! ## Usage
//!
//! ```bash
//! accobot --config ./config/accobot.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `accobot scan <path>` | Validate and classify the XML files in a folder |
//! | `accobot ask "<question>"` | One-shot question to the answering service |
//! | `accobot chat` | Interactive conversation in the terminal |
//! | `accobot serve` | Start the local HTTP API |
//!
//! Logs go to stderr; command output goes to stdout.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use accobot::config::{self, LoggingConfig};
use accobot::{chat, ingest, server};

/// MyACCOBot backend: folder ingestion for financial XML documents and a
/// conversation session backed by a remote answering service.
#[derive(Parser)]
#[command(name = "accobot", version)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/accobot.toml`. Built-in defaults are used when
    /// the file does not exist.
    #[arg(long, global = true, default_value = "./config/accobot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a folder inside the sandbox and report every XML file.
    Scan {
        /// Folder to scan, absolute or relative to the working directory.
        path: String,

        /// Print the folder record as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Ask a single question and print the answer.
    Ask {
        /// The question text.
        query: String,
    },

    /// Start an interactive conversation.
    ///
    /// Plain lines are sent as questions. `/scan <path>` sets the active
    /// folder, `/history` prints the log, `/reset` clears it, `/quit` exits.
    Chat,

    /// Start the local HTTP API on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_or_minimal(&cli.config)?;

    init_tracing(&cfg.logging);
    info!(version = env!("CARGO_PKG_VERSION"), config = %cli.config.display(), "accobot starting");

    match cli.command {
        Commands::Scan { path, json } => {
            ingest::run_scan(&cfg, &path, json).await?;
        }
        Commands::Ask { query } => {
            chat::run_ask(&cfg, &query).await?;
        }
        Commands::Chat => {
            chat::run_chat(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

/// `RUST_LOG` wins over `[logging].level`; an unparsable level falls back to `info`.
fn init_tracing(logging: &LoggingConfig) {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match logging.level.parse::<EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: logging.level '{}' is not a valid tracing filter ({}); falling back to 'info'",
                    logging.level, e
                );
                EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
