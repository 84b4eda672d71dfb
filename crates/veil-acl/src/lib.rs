//! Veil ACL: the confidentiality overlay.
//!
//! Restricts BOMs and the stock movements and work orders derived from them
//! to principals holding one of a record's allowed roles.
//!
//! # Modules
//!
//! - [`settings`]: Cached protection switches
//! - [`cache`]: TTL memoization of decisions
//! - [`evaluator`]: ALLOW / DENY / DEFER per record
//! - [`filter`]: List query predicates
//! - [`validate`]: Save-time checks
//! - [`propagate`]: Copy-on-create and cascade from BOM to dependents
//! - [`guard`]: Permission check around the BOM explosion
//! - [`hooks`]: The facade the host calls
//! - [`events`]: Cache invalidation on lifecycle events
//! - [`debug_log`]: Diagnostics on the settings record
//!
//! # Example
//!
//! ```ignore
//! let hooks = ConfidentialityHooks::new(records, settings_store, &AclConfig::default());
//! let decision = hooks
//!     .has_permission(DocKind::Bom, Target::Id(&bom), &principal, Operation::Read)
//!     .await;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod debug_log;
pub mod evaluator;
pub mod events;
pub mod filter;
pub mod guard;
pub mod hooks;
pub mod propagate;
pub mod settings;
pub mod validate;

mod proptests;

pub use cache::{CacheKey, PermissionCache};
pub use config::AclConfig;
pub use debug_log::DebugLog;
pub use evaluator::{Evaluator, Target};
pub use events::LifecycleEvent;
pub use filter::{QueryFragment, filter_predicate};
pub use guard::GuardedBomItems;
pub use hooks::ConfidentialityHooks;
pub use propagate::{PropagationFailure, PropagationReport, Propagator};
pub use settings::SettingsProvider;
pub use validate::Validator;
