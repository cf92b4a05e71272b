// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tether - answer Slack mentions with a local coding agent.
//!
//! This is the binary entry point.

mod maintenance;
mod secrets;
mod serve;
mod status;
mod supervisor;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tether_config::TetherConfig;
use tether_core::{SecretField, TetherError};

/// Tether - answer Slack mentions with a local coding agent.
#[derive(Parser, Debug)]
#[command(name = "tether", version, about, long_about = None)]
struct Cli {
    /// Load this config file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bridge until interrupted.
    Serve {
        /// Connect even when `slack.auto_connect` is false.
        #[arg(long)]
        connect: bool,
    },
    /// Show recent tasks and mentions from the local history.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
        /// Number of tasks and mentions to show.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Manage task history.
    History {
        #[command(subcommand)]
        action: HistoryCommands,
    },
    /// Manage stored thread conversations.
    Memory {
        #[command(subcommand)]
        action: MemoryCommands,
    },
    /// Inspect or create configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
    /// Store or remove Slack tokens in the secret store.
    Secret {
        #[command(subcommand)]
        action: SecretCommands,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryCommands {
    /// Delete every stored task.
    Clear,
}

#[derive(Subcommand, Debug)]
enum MemoryCommands {
    /// Forget every thread conversation.
    Clear,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration with tokens redacted.
    Show,
    /// Write a default config file.
    Init {
        /// Destination (default: ~/.config/tether/tether.toml).
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum SecretCommands {
    /// Prompt for a token and store it.
    Set {
        /// `app_token` or `bot_token`.
        #[arg(value_parser = parse_secret_field)]
        field: SecretField,
    },
    /// Remove a stored token.
    Remove {
        #[arg(value_parser = parse_secret_field)]
        field: SecretField,
    },
}

fn parse_secret_field(raw: &str) -> Result<SecretField, String> {
    raw.parse()
        .map_err(|_| format!("unknown secret `{raw}`, expected `app_token` or `bot_token`"))
}

fn load_config(path: Option<&PathBuf>) -> TetherConfig {
    let loaded = match path {
        Some(path) => tether_config::load_and_validate_path(path),
        None => tether_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            tether_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let result: Result<(), TetherError> = match cli.command {
        Some(Commands::Serve { connect }) => serve::run_serve(config, connect).await,
        Some(Commands::Status { json, plain, limit }) => {
            status::run_status(&config, json, plain, limit).await
        }
        Some(Commands::History {
            action: HistoryCommands::Clear,
        }) => maintenance::clear_history(&config).await,
        Some(Commands::Memory {
            action: MemoryCommands::Clear,
        }) => maintenance::clear_memory(&config).await,
        Some(Commands::Config {
            action: ConfigCommands::Show,
        }) => maintenance::show_config(&config),
        Some(Commands::Config {
            action: ConfigCommands::Init { path, force },
        }) => maintenance::init_config(path, force),
        Some(Commands::Secret {
            action: SecretCommands::Set { field },
        }) => maintenance::set_secret(&config, field).await,
        Some(Commands::Secret {
            action: SecretCommands::Remove { field },
        }) => maintenance::remove_secret(&config, field).await,
        None => {
            println!("tether: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
