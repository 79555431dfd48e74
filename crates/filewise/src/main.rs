// SPDX-FileCopyrightText: 2026 Filewise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filewise - adaptive file recommendation and retrieval.
//!
//! Binary entry point: replays recorded interactions through the engine and
//! inspects configuration.

mod replay;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use filewise_config::{ConfigError, FilewiseConfig};

/// Filewise - adaptive file recommendation and retrieval.
#[derive(Parser, Debug)]
#[command(name = "filewise", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a JSON-lines event log and print what the engine suggests.
    Replay(replay::ReplayArgs),
    /// Validate the configuration and exit.
    CheckConfig,
    /// Show the effective configuration and the registered models.
    Status {
        /// Output JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<FilewiseConfig, Vec<ConfigError>> {
    match path {
        Some(path) => filewise_config::load_and_validate_path(path),
        None => filewise_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            filewise_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.engine.log_level);
    filewise_engine::recording::register_metrics();

    let result = match cli.command {
        Some(Commands::Replay(args)) => replay::run_replay(config, args).await,
        Some(Commands::CheckConfig) => {
            println!("filewise: configuration ok");
            Ok(())
        }
        Some(Commands::Status { json }) => status::run_status(config, json).await,
        None => {
            println!("filewise: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("filewise={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
