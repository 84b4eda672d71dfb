//! Veil Storage: an in-memory host.
//!
//! [`MemoryHost`] stands in for the host application: it stores records and
//! their role grants, the settings record, user roles and BOM explosions.
//! The CLI and HTTP service run against it, loaded from a JSON
//! [`Fixture`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixture;
pub mod memory;

pub use fixture::Fixture;
pub use memory::MemoryHost;
