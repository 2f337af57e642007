//! Spacer CLI - Encrypted PostgreSQL snapshots to S3-compatible storage
//!
//! This is the main entry point for the spacer command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let env_file = cli.env_file.as_deref();
    match cli.command {
        Commands::Run => commands::run::run(env_file).await,
        Commands::Backup => commands::backup::run(env_file).await,
        Commands::List(args) => commands::list::run(args, env_file).await,
        Commands::Restore(args) => commands::restore::run(args, env_file).await,
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
