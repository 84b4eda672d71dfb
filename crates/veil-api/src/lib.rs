//! # veil-api
//!
//! HTTP API for the Veil confidentiality overlay.
//!
//! Routes (all behind [`veil_auth::AuthLayer`]):
//! - `GET /api/bom/{bom}/permission`: whether the caller may see a BOM, as a JSON boolean
//! - `GET /api/bom/{bom}/items`: the guarded BOM explosion
//! - `GET /api/filter/{kind}`: the list condition for the caller
//! - `GET /health`

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod routes;
pub mod server;

pub use error::{Error, Result};
pub use routes::{AppState, FilterResponse, ItemsQuery, routes};
pub use server::{Server, app};
