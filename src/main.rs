//! Command-line host for rusty-payload.
//!
//! Loads configuration, initializes logging, opens a local shell and runs
//! catalogue payloads against it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use rusty_payload::config::Config;
use rusty_payload::shell::{self, LocalShell};
use rusty_payload::utils;
use rusty_payload::{Mode, PayloadCatalog};

#[derive(Parser, Debug)]
#[command(
    name = "rusty-payload",
    version,
    about = "Run capability-checked payloads against a shell"
)]
struct Cli {
    /// JSON config file (default: ~/.rusty-payload/config.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List payloads and what the shell is missing for each
    List,
    /// Show the capability gap of one payload
    Check { payload: String },
    /// Run a payload
    Run {
        payload: String,
        /// Argument passed to the payload
        #[arg(default_value = "")]
        argument: String,
        /// Structured (JSON) output instead of text
        #[arg(long)]
        api: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.config.as_deref())?;

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = utils::logger::init_logging(&config.log);

    // Payload invocations block on the shell; keep them off the async workers
    tokio::task::spawn_blocking(move || execute(cli.command, config))
        .await
        .context("Payload task panicked")?
}

fn execute(command: Command, config: Config) -> Result<()> {
    let catalog = PayloadCatalog::with_builtins();
    let local = LocalShell::new(config.shell);
    tracing::info!(
        shell = %local.config().program,
        capabilities = %shell::capabilities(&local),
        "opened local shell"
    );

    match command {
        Command::List => {
            for logic in catalog.iter() {
                let gap = catalog.bind(logic.name(), Some(&local))?.can_run();
                let status = if gap.is_empty() {
                    "ready".to_string()
                } else {
                    format!("missing {}", gap)
                };
                println!("{:<14} {:<24} {}", logic.name(), status, logic.description());
            }
        }
        Command::Check { payload } => {
            let payload = catalog.bind(&payload, Some(&local))?;
            for mode in [Mode::Interactive, Mode::Structured] {
                println!(
                    "{:<12} requires {:<24} missing {}",
                    mode.to_string(),
                    payload.requirements(mode).to_string(),
                    payload.can_run_mode(mode)
                );
            }
        }
        Command::Run {
            payload,
            argument,
            api,
        } => {
            let payload = catalog.bind(&payload, Some(&local))?;
            if api {
                let value = payload.run_api(&argument)?;
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                let text = payload.run(&argument)?;
                print!("{}", text);
                if !text.ends_with('\n') {
                    println!();
                }
            }
        }
    }

    Ok(())
}
