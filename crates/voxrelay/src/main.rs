// SPDX-FileCopyrightText: 2026 Voxrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voxrelay - bridges phone calls to a realtime AI voice gateway.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod config_cmd;
mod serve;
mod shutdown;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use voxrelay_config::VoxrelayConfig;

/// Voxrelay - bridges phone calls to a realtime AI voice gateway.
#[derive(Parser, Debug)]
#[command(name = "voxrelay", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Accept calls and relay them (default).
    Serve,
    /// Validate configuration and print the effective settings.
    Config,
    /// Query a running server's health endpoint.
    Status {
        /// Print machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Config => {
            print!("{}", config_cmd::summary(&config));
            Ok(())
        }
        Commands::Status { json } => status::run_status(&config, json).await,
    };

    if let Err(e) = result {
        eprintln!("voxrelay: {e}");
        std::process::exit(1);
    }
}

/// Loads and validates configuration, exiting with rendered diagnostics on error.
fn load_config(path: Option<&std::path::Path>) -> VoxrelayConfig {
    let loaded = match path {
        Some(path) => voxrelay_config::load_and_validate_path(path),
        None => voxrelay_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            voxrelay_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}
