// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ircnostr - relays one IRC bot's channel messages to Nostr relays.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod config_cmd;
mod serve;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ircnostr_config::model::BridgeConfig;

/// ircnostr - relays one IRC bot's channel messages to Nostr relays.
#[derive(Parser, Debug)]
#[command(name = "ircnostr", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long = "config", global = true, value_name = "PATH")]
    config_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect to IRC and relay the target sender's messages to Nostr.
    Serve,
    /// Query a running instance's status endpoint.
    Status {
        /// Print machine-readable JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// Validate and print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) => {
            let config = load_or_exit(cli.config_path.as_deref());
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Status { json, plain }) => {
            // Status only needs the gateway address; a missing key is not fatal here.
            let config = status::load_lenient(cli.config_path.as_deref());
            if let Err(e) = status::run_status(&config, json, plain).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            let config = load_or_exit(cli.config_path.as_deref());
            match config_cmd::render_effective(&config) {
                Ok(text) => print!("{text}"),
                Err(e) => {
                    eprintln!("error: {e}");
                    std::process::exit(1);
                }
            }
        }
        None => {
            println!("ircnostr: use --help for available commands");
        }
    }
}

/// Loads and validates configuration, printing diagnostics and exiting 1 on failure.
fn load_or_exit(path: Option<&std::path::Path>) -> BridgeConfig {
    let loaded = match path {
        Some(path) => ircnostr_config::load_and_validate_path(path),
        None => ircnostr_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            ircnostr_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}
