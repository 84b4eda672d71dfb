//! # veil-cli
//!
//! Administration tooling for the Veil confidentiality overlay:
//! - Config file management (`veil config path|get|set|init|export`)
//! - One-off permission checks and list conditions against a host fixture
//! - Maintenance resync of BOM confidentiality onto dependents
//! - Serving the HTTP API

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_handlers;

pub use cli::{Cli, Command, ConfigAction};
pub use commands::Session;
pub use config::{ConfigManager, VeilConfig};
