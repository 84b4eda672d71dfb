//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Veil - confidentiality overlay for BOMs and their derived records
#[derive(Parser, Debug)]
#[command(name = "veil", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "VEIL_CONFIG")]
    pub config: Option<String>,

    /// Host fixture file, overriding `fixture` from the config
    #[arg(short, long, global = true)]
    pub fixture: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Evaluate one permission check
    Check {
        /// User to check as
        #[arg(short, long)]
        user: String,
        /// Record kind: bom, stock_entry or work_order
        kind: String,
        /// Record identity
        id: String,
        /// Operation to check
        #[arg(short, long, default_value = "read")]
        op: String,
    },
    /// Print the list condition for a user
    Filter {
        /// User to build the condition for
        #[arg(short, long)]
        user: String,
        /// Record kind: bom, stock_entry or work_order
        kind: String,
    },
    /// Re-propagate every BOM onto its dependents and save the fixture
    Resync,
    /// Serve the HTTP API
    Serve {
        /// Listen address, overriding `server.addr`
        #[arg(short, long)]
        addr: Option<String>,
    },
}

/// `veil config` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,
    /// Get a value by dotted key
    Get {
        /// Dotted key, e.g. `acl.cache_ttl_secs`
        key: String,
    },
    /// Set a value by dotted key
    Set {
        /// Dotted key
        key: String,
        /// New value
        value: String,
    },
    /// Write a default config file
    Init {
        /// Destination, defaults to the platform config path
        #[arg(long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config as environment variables
    Export {
        /// Format as `--env` flags for docker
        #[arg(long)]
        docker_env: bool,
    },
}
