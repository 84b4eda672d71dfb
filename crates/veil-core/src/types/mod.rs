//! Core types for the confidentiality overlay.

mod ids;
mod kind;
mod proptests;
mod record;
mod roles;
mod settings;

pub use ids::RecordId;
pub use kind::{Decision, DocKind, LifecycleState, Operation, StockPurpose};
pub use record::{
    BomItem, BomItemsRequest, Confidentiality, DependentRef, ProtectedRecord, RoleGrant,
};
pub use roles::{Principal, RoleSet};
pub use settings::Settings;
