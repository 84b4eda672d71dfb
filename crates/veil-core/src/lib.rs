//! Veil Core: shared types, traits, and errors.
//!
//! This crate provides the foundational types used across all Veil crates.
//! It has no internal Veil dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy and Result alias
//! - [`types`]: Records, roles, principals, decisions, settings
//! - [`traits`]: Host collaborator traits
//! - [`clock`]: Injectable time source
//! - [`schema`]: Host table/field names and limits

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod error;
pub mod schema;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use traits::{BomItemSource, RecordStore, RoleDirectory, SaveMode, SettingsStore};
pub use types::{
    BomItem, BomItemsRequest, Confidentiality, Decision, DependentRef, DocKind, LifecycleState,
    Operation, Principal, ProtectedRecord, RecordId, RoleGrant, RoleSet, Settings, StockPurpose,
};
