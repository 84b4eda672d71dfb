//! Record kinds, lifecycle states, operations and decisions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The record kinds this layer manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DocKind {
    /// Bill of materials, the parent of every derived record.
    #[serde(rename = "BOM")]
    Bom,
    /// Stock movement derived from a bill of materials.
    #[serde(rename = "Stock Entry")]
    StockEntry,
    /// Work order derived from a bill of materials.
    #[serde(rename = "Work Order")]
    WorkOrder,
}

impl DocKind {
    /// All managed kinds.
    pub const ALL: [DocKind; 3] = [DocKind::Bom, DocKind::StockEntry, DocKind::WorkOrder];

    /// Kinds that derive their confidentiality from a bill of materials.
    pub const DEPENDENTS: [DocKind; 2] = [DocKind::StockEntry, DocKind::WorkOrder];

    /// The host's doctype name.
    pub fn doctype(&self) -> &'static str {
        match self {
            DocKind::Bom => "BOM",
            DocKind::StockEntry => "Stock Entry",
            DocKind::WorkOrder => "Work Order",
        }
    }

    /// Returns `true` for kinds derived from a bill of materials.
    pub fn is_dependent(&self) -> bool {
        !matches!(self, DocKind::Bom)
    }
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.doctype())
    }
}

impl FromStr for DocKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "bom" => Ok(DocKind::Bom),
            "stock entry" => Ok(DocKind::StockEntry),
            "work order" => Ok(DocKind::WorkOrder),
            _ => Err(Error::config(format!("unknown record kind '{s}'"))),
        }
    }
}

/// Lifecycle state of a derived record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Editable, not yet submitted.
    #[default]
    Draft,
    /// Submitted; only after-submit updates are allowed.
    Submitted,
    /// Cancelled; immutable through the normal save path.
    Cancelled,
}

impl LifecycleState {
    /// Returns `true` if the host refuses normal saves for this state.
    pub fn is_immutable(&self) -> bool {
        matches!(self, LifecycleState::Cancelled)
    }

    /// The host's numeric document status.
    pub fn docstatus(&self) -> u8 {
        match self {
            LifecycleState::Draft => 0,
            LifecycleState::Submitted => 1,
            LifecycleState::Cancelled => 2,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Draft => write!(f, "draft"),
            LifecycleState::Submitted => write!(f, "submitted"),
            LifecycleState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// The operation a permission check is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Read a record.
    #[default]
    Read,
    /// Modify a record.
    Write,
    /// Create a record.
    Create,
    /// Submit a record.
    Submit,
    /// Cancel a record.
    Cancel,
    /// Delete a record.
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Create => "create",
            Operation::Submit => "submit",
            Operation::Cancel => "cancel",
            Operation::Delete => "delete",
        };
        f.write_str(s)
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(Operation::Read),
            "write" => Ok(Operation::Write),
            "create" => Ok(Operation::Create),
            "submit" => Ok(Operation::Submit),
            "cancel" => Ok(Operation::Cancel),
            "delete" => Ok(Operation::Delete),
            _ => Err(Error::config(format!("unknown operation '{s}'"))),
        }
    }
}

/// Outcome of a permission evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Access granted regardless of the host's baseline rules.
    Allow,
    /// Access refused.
    Deny,
    /// No opinion; the host's baseline rules decide.
    Defer,
}

impl Decision {
    /// Returns `true` for an explicit grant.
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Returns `true` for an explicit refusal.
    pub fn is_deny(&self) -> bool {
        matches!(self, Decision::Deny)
    }

    /// Returns `true` unless access was refused.
    pub fn permits(&self) -> bool {
        !self.is_deny()
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allow => write!(f, "ALLOW"),
            Decision::Deny => write!(f, "DENY"),
            Decision::Defer => write!(f, "DEFER"),
        }
    }
}

/// Purpose of a stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StockPurpose {
    /// Finished goods produced against a BOM.
    Manufacture,
    /// Raw material moved to work-in-progress for a BOM.
    MaterialTransferForManufacture,
    /// Any other purpose the host defines.
    Other(String),
}

impl StockPurpose {
    /// Returns `true` for purposes that consume a bill of materials.
    pub fn is_manufacturing(&self) -> bool {
        matches!(
            self,
            StockPurpose::Manufacture | StockPurpose::MaterialTransferForManufacture
        )
    }

    /// The host's purpose label.
    pub fn as_str(&self) -> &str {
        match self {
            StockPurpose::Manufacture => "Manufacture",
            StockPurpose::MaterialTransferForManufacture => "Material Transfer for Manufacture",
            StockPurpose::Other(s) => s,
        }
    }
}

impl From<String> for StockPurpose {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Manufacture" => StockPurpose::Manufacture,
            "Material Transfer for Manufacture" => StockPurpose::MaterialTransferForManufacture,
            _ => StockPurpose::Other(s),
        }
    }
}

impl From<&str> for StockPurpose {
    fn from(s: &str) -> Self {
        StockPurpose::from(s.to_string())
    }
}

impl From<StockPurpose> for String {
    fn from(p: StockPurpose) -> Self {
        p.as_str().to_string()
    }
}

impl fmt::Display for StockPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
