// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pinvault - a PIN-sealed credential vault.
//!
//! This is the binary entry point for the Pinvault CLI.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pinvault_config::model::PinvaultConfig;

/// Pinvault - a PIN-sealed credential vault.
#[derive(Parser, Debug)]
#[command(name = "pinvault", version, about, long_about = None)]
struct Cli {
    /// Identity whose vault is opened.
    #[arg(long, short)]
    user: String,

    /// Explicit config file instead of the standard lookup locations.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Set the master PIN.
    Enroll,
    /// Seal and store a new credential.
    Add {
        /// Entry title, unique per user.
        title: String,
        /// Account username.
        username: String,
        /// Folder to file the entry under.
        folder: String,
        /// Store a freshly generated password instead of prompting for one.
        #[arg(long)]
        generate: bool,
    },
    /// Print a random password.
    Generate {
        /// Password length (defaults to the configured length).
        #[arg(long)]
        length: Option<usize>,
    },
    /// List the entries in a folder.
    List {
        /// Folder name.
        folder: String,
    },
    /// List folders with their item counts, newest first.
    Folders,
    /// Decrypt and print an entry's password.
    Reveal {
        /// Entry title.
        title: String,
    },
    /// Delete an entry.
    Delete {
        /// Entry title.
        title: String,
    },
}

fn load_config(path: Option<&PathBuf>) -> PinvaultConfig {
    let loaded = match path {
        Some(path) => pinvault_config::load_and_validate_path(path),
        None => pinvault_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            pinvault_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pinvault={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    init_tracing(&config.general.log_level);

    if let Err(report) = commands::run(&config, &cli.user, cli.command).await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}
