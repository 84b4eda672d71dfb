//! Veil CLI
//!
//! Command-line interface for the Veil confidentiality overlay.

#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use veil_cli::commands::{self, Session};
use veil_cli::config_handlers::handle_config_command;
use veil_cli::{Cli, Command, ConfigManager, VeilConfig};

const DEFAULT_FILTER: &str = "info,veil=debug";

fn init_logging(cli: &Cli, config: &VeilConfig) {
    let fallback = if cli.verbose {
        "debug"
    } else {
        config.log.level.as_deref().unwrap_or(DEFAULT_FILTER)
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    if let Command::Config { action } = cli.command {
        return handle_config_command(config_path, action).context("config command failed");
    }

    let config = VeilConfig::load(config_path).context("failed to load configuration")?;
    init_logging(&cli, &config);
    let session = Session::open(&config, cli.fixture.as_deref()).await?;

    match &cli.command {
        Command::Check { user, kind, id, op } => {
            let decision = commands::check(&session, user, kind, id, op).await?;
            println!("{decision}");
        }
        Command::Filter { user, kind } => {
            let condition = commands::filter(&session, user, kind).await?;
            println!("{condition}");
        }
        Command::Resync => {
            let report = commands::resync(&session).await?;
            tracing::info!(fixture = %session.fixture().display(), "Resync saved");
            println!("{report}");
            for (kind, id) in &report.updated {
                println!("  updated {kind} {id}");
            }
            if !report.is_clean() {
                anyhow::bail!("{} dependents failed to update", report.failed.len());
            }
        }
        Command::Serve { addr } => {
            commands::serve(&session, &config, addr.as_deref()).await?;
        }
        Command::Config { .. } => {}
    }
    Ok(())
}
