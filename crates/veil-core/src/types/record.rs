//! Protected records and the data attached to them.

use serde::{Deserialize, Serialize};

use crate::types::{DocKind, LifecycleState, RecordId, RoleSet, StockPurpose};

/// The confidentiality state of a record: its flag and allowed roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confidentiality {
    /// Whether the record is restricted
    pub is_confidential: bool,
    /// Roles allowed to access the record when restricted
    #[serde(default)]
    pub allowed_roles: RoleSet,
}

impl Confidentiality {
    /// Public (non-confidential, no roles).
    pub fn public() -> Self {
        Self::default()
    }

    /// Confidential and restricted to the given roles.
    pub fn restricted(roles: RoleSet) -> Self {
        Self {
            is_confidential: true,
            allowed_roles: roles,
        }
    }
}

/// A record of one of the managed kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectedRecord {
    /// Record kind
    pub kind: DocKind,
    /// Identity; `None` until the host assigns one on insert
    #[serde(default)]
    pub id: Option<RecordId>,
    /// Confidentiality flag
    #[serde(default)]
    pub is_confidential: bool,
    /// Allowed roles (persisted as role grants)
    #[serde(default)]
    pub allowed_roles: RoleSet,
    /// Lifecycle state; only meaningful for derived kinds
    #[serde(default)]
    pub lifecycle: LifecycleState,
    /// Parent bill of materials for derived kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bom_no: Option<RecordId>,
    /// Stock movement purpose
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<StockPurpose>,
}

impl ProtectedRecord {
    /// Creates a non-confidential draft record with an identity.
    pub fn new(kind: DocKind, id: impl Into<RecordId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::unsaved(kind)
        }
    }

    /// Creates a record the host has not inserted yet.
    pub fn unsaved(kind: DocKind) -> Self {
        Self {
            kind,
            id: None,
            is_confidential: false,
            allowed_roles: RoleSet::new(),
            lifecycle: LifecycleState::Draft,
            bom_no: None,
            purpose: None,
        }
    }

    /// Marks the record confidential with the given roles.
    pub fn confidential(mut self, roles: RoleSet) -> Self {
        self.is_confidential = true;
        self.allowed_roles = roles;
        self
    }

    /// Links the record to a parent bill of materials.
    pub fn with_bom(mut self, bom: impl Into<RecordId>) -> Self {
        self.bom_no = Some(bom.into());
        self
    }

    /// Sets the stock movement purpose.
    pub fn with_purpose(mut self, purpose: impl Into<StockPurpose>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    /// Sets the lifecycle state.
    pub fn with_state(mut self, state: LifecycleState) -> Self {
        self.lifecycle = state;
        self
    }

    /// Returns `true` if the host has not assigned an identity yet.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Snapshot of the flag and role set.
    pub fn confidentiality(&self) -> Confidentiality {
        Confidentiality {
            is_confidential: self.is_confidential,
            allowed_roles: self.allowed_roles.clone(),
        }
    }

    /// Replaces the flag and role set; never merges roles.
    pub fn set_confidentiality(&mut self, target: &Confidentiality) {
        self.is_confidential = target.is_confidential;
        self.allowed_roles = target.allowed_roles.clone();
    }

    /// Returns `true` if the flag or role set differs from `target`.
    pub fn needs_update(&self, target: &Confidentiality) -> bool {
        self.is_confidential != target.is_confidential || self.allowed_roles != target.allowed_roles
    }

    /// The BOM this stock movement consumes, if its purpose is a manufacturing one.
    pub fn manufacturing_bom(&self) -> Option<&RecordId> {
        match (&self.bom_no, &self.purpose) {
            (Some(bom), Some(purpose)) if purpose.is_manufacturing() => Some(bom),
            _ => None,
        }
    }

    /// The display label used in messages.
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => format!("{} {}", self.kind, id),
            None => format!("new {}", self.kind),
        }
    }
}

/// One persisted row of the role join: `role` is allowed on `(parent_kind, parent)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleGrant {
    /// Identity of the protected record
    pub parent: RecordId,
    /// Kind of the protected record
    pub parent_kind: DocKind,
    /// Allowed role name
    pub role: String,
}

/// A derived record that references a bill of materials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentRef {
    /// Kind of the derived record
    pub kind: DocKind,
    /// Identity of the derived record
    pub id: RecordId,
    /// Current lifecycle state
    pub lifecycle: LifecycleState,
}

/// Arguments of the BOM explosion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomItemsRequest {
    /// Bill of materials to explode
    pub bom: RecordId,
    /// Company the explosion is computed for
    #[serde(default)]
    pub company: String,
    /// Quantity of finished goods
    #[serde(default = "default_qty")]
    pub qty: f64,
    /// Whether to explode sub-assemblies
    #[serde(default = "default_fetch_exploded")]
    pub fetch_exploded: bool,
}

fn default_qty() -> f64 {
    1.0
}

fn default_fetch_exploded() -> bool {
    true
}

impl BomItemsRequest {
    /// Request for one unit of the BOM, exploded.
    pub fn new(bom: impl Into<RecordId>) -> Self {
        Self {
            bom: bom.into(),
            company: String::new(),
            qty: default_qty(),
            fetch_exploded: default_fetch_exploded(),
        }
    }
}

/// One line of a BOM explosion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomItem {
    /// Item code
    pub item_code: String,
    /// Quantity required
    pub qty: f64,
    /// Unit of measure
    #[serde(default)]
    pub uom: String,
}
