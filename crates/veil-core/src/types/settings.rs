//! The singleton settings record.

use serde::{Deserialize, Serialize};

use crate::types::DocKind;

fn enabled() -> bool {
    true
}

/// Protection switches and diagnostics, stored once per site.
///
/// Flags missing from the stored record default to enabled; use
/// [`Settings::safe_default`] when the record cannot be read at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Master switch for the whole layer
    #[serde(default = "enabled")]
    pub enable_confidential_protection: bool,
    /// Protect bills of materials
    #[serde(default = "enabled")]
    pub protect_bom: bool,
    /// Protect stock movements
    #[serde(default = "enabled")]
    pub protect_stock_entry: bool,
    /// Protect work orders
    #[serde(default = "enabled")]
    pub protect_work_order: bool,
    /// Append diagnostics to the settings record
    #[serde(default)]
    pub debug_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_confidential_protection: true,
            protect_bom: true,
            protect_stock_entry: true,
            protect_work_order: true,
            debug_mode: false,
        }
    }
}

impl Settings {
    /// Protection disabled everywhere; used when settings are unavailable.
    pub fn safe_default() -> Self {
        Self {
            enable_confidential_protection: false,
            protect_bom: false,
            protect_stock_entry: false,
            protect_work_order: false,
            debug_mode: false,
        }
    }

    /// Returns `true` if checks apply to records of this kind.
    pub fn protects(&self, kind: DocKind) -> bool {
        if !self.enable_confidential_protection {
            return false;
        }
        match kind {
            DocKind::Bom => self.protect_bom,
            DocKind::StockEntry => self.protect_stock_entry,
            DocKind::WorkOrder => self.protect_work_order,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_default_protects_nothing() {
        let s = Settings::safe_default();
        assert!(DocKind::ALL.iter().all(|k| !s.protects(*k)));
    }

    #[test]
    fn test_global_switch_overrides_kind_flags() {
        let s = Settings {
            enable_confidential_protection: false,
            ..Settings::default()
        };
        assert!(!s.protects(DocKind::Bom));
    }

    #[test]
    fn test_per_kind_flags() {
        let s = Settings {
            protect_stock_entry: false,
            ..Settings::default()
        };
        assert!(s.protects(DocKind::Bom));
        assert!(!s.protects(DocKind::StockEntry));
        assert!(s.protects(DocKind::WorkOrder));
    }

    #[test]
    fn test_missing_flags_default_to_enabled() {
        let s: Settings = serde_json::from_str(r#"{"protect_bom": false}"#).unwrap();
        assert!(s.enable_confidential_protection);
        assert!(!s.protect_bom);
        assert!(s.protect_work_order);
        assert!(!s.debug_mode);
    }
}
