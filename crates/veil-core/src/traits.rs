//! Collaborator traits implemented by the host application.
//!
//! The overlay never owns persistence, users or the BOM explosion; it calls
//! into these traits. `veil-storage` provides an in-memory implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    BomItem, BomItemsRequest, Confidentiality, DependentRef, DocKind, Principal, ProtectedRecord,
    RecordId, RoleSet, Settings,
};

/// How a record write interacts with the host's own permission rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// A normal save, subject to the host's checks.
    Standard,
    /// A system-initiated save with permission checks bypassed.
    System,
}

/// The host's record persistence.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Single-field lookup of the flag.
    ///
    /// Returns [`crate::Error::RecordNotFound`] if the identity does not resolve.
    async fn is_confidential(&self, kind: DocKind, id: &RecordId) -> Result<bool>;

    /// Allowed roles, read from the role-grant join.
    async fn allowed_roles(&self, kind: DocKind, id: &RecordId) -> Result<RoleSet>;

    /// Loads a full record.
    async fn load(&self, kind: DocKind, id: &RecordId) -> Result<ProtectedRecord>;

    /// Every identity of a kind.
    async fn list(&self, kind: DocKind) -> Result<Vec<RecordId>>;

    /// Records of `kind` whose parent BOM is `bom`.
    async fn dependents_of(&self, kind: DocKind, bom: &RecordId) -> Result<Vec<DependentRef>>;

    /// Saves a record through the host's normal save path.
    ///
    /// Hosts refuse this for immutable (cancelled) records.
    async fn save(&self, record: &ProtectedRecord, mode: SaveMode) -> Result<()>;

    /// Writes the flag and replaces the role grants of `ids` directly,
    /// bypassing the save path, in one standalone transaction.
    async fn force_confidentiality(
        &self,
        kind: DocKind,
        ids: &[RecordId],
        target: &Confidentiality,
    ) -> Result<()>;
}

/// The singleton settings record.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Reads the protection switches.
    async fn load_settings(&self) -> Result<Settings>;

    /// Persists the protection switches.
    async fn save_settings(&self, settings: &Settings) -> Result<()>;

    /// Reads the debug log field.
    async fn debug_logs(&self) -> Result<String>;

    /// Overwrites the debug log field without touching anything else.
    async fn write_debug_logs(&self, logs: &str) -> Result<()>;
}

/// The host's user and role model.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Roles held by a user; unknown users have none.
    async fn roles_for(&self, user: &str) -> Result<RoleSet>;

    /// Resolves a user into a principal.
    async fn principal(&self, user: &str) -> Result<Principal> {
        Ok(Principal::new(user, self.roles_for(user).await?))
    }
}

/// The computed BOM explosion endpoint.
#[async_trait]
pub trait BomItemSource: Send + Sync {
    /// Explodes a BOM into its item lines.
    async fn bom_items(&self, principal: &Principal, request: &BomItemsRequest)
        -> Result<Vec<BomItem>>;
}

#[async_trait]
impl<T: BomItemSource + ?Sized> BomItemSource for std::sync::Arc<T> {
    async fn bom_items(
        &self,
        principal: &Principal,
        request: &BomItemsRequest,
    ) -> Result<Vec<BomItem>> {
        (**self).bom_items(principal, request).await
    }
}
