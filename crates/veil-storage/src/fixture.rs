//! JSON snapshots of a [`MemoryHost`].
//!
//! ```json
//! {
//!   "settings": { "enable_confidential_protection": true },
//!   "records": [
//!     { "kind": "BOM", "id": "BOM-001", "is_confidential": true, "allowed_roles": ["Engineer"] }
//!   ],
//!   "users": { "ann@example.com": ["Engineer"] },
//!   "bom_items": { "BOM-001": [{ "item_code": "STEEL-PLATE", "qty": 2.0 }] }
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use veil_core::{BomItem, Error, ProtectedRecord, RecordId, Result, RoleSet, Settings};

use crate::memory::{MemoryHost, State};

/// Serializable contents of a host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    /// The settings record
    #[serde(default)]
    pub settings: Settings,
    /// The settings record's debug log
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub debug_logs: String,
    /// Records of every managed kind, roles inline
    #[serde(default)]
    pub records: Vec<ProtectedRecord>,
    /// Role assignments per user
    #[serde(default)]
    pub users: BTreeMap<String, RoleSet>,
    /// BOM explosions at quantity 1
    #[serde(default)]
    pub bom_items: BTreeMap<RecordId, Vec<BomItem>>,
}

impl Fixture {
    /// Read a fixture file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file can't be read, or a serialization
    /// error if it is not a valid fixture.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::io_with_path(e, path))?;
        let fixture = serde_json::from_str(&text)?;
        log::debug!("Loaded fixture from {}", path.display());
        Ok(fixture)
    }

    /// Write this fixture as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file can't be written.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, text)
            .await
            .map_err(|e| Error::io_with_path(e, path))?;
        log::debug!("Saved fixture to {}", path.display());
        Ok(())
    }

    /// Build a host holding this fixture's contents.
    ///
    /// # Errors
    ///
    /// Fails if a record has no identity.
    pub fn into_host(self) -> Result<MemoryHost> {
        let mut state = State {
            settings: self.settings,
            debug_logs: self.debug_logs,
            users: self.users,
            bom_items: self.bom_items.into_iter().collect::<HashMap<_, _>>(),
            ..State::default()
        };
        for record in self.records {
            state.put(record)?;
        }
        Ok(MemoryHost::from_state(state))
    }
}

impl MemoryHost {
    /// Load a host from a fixture file.
    ///
    /// # Errors
    ///
    /// See [`Fixture::load`] and [`Fixture::into_host`].
    pub async fn from_fixture(path: impl AsRef<Path>) -> Result<Self> {
        Fixture::load(path).await?.into_host()
    }

    /// Snapshot the host's contents.
    pub fn to_fixture(&self) -> Fixture {
        let state = self.state();
        Fixture {
            settings: state.settings.clone(),
            debug_logs: state.debug_logs.clone(),
            records: state.all_records(),
            users: state.users.clone(),
            bom_items: state
                .bom_items
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Write the host's contents to a fixture file.
    ///
    /// # Errors
    ///
    /// See [`Fixture::save`].
    pub async fn save_fixture(&self, path: impl AsRef<Path>) -> Result<()> {
        let fixture = self.to_fixture();
        fixture.save(path).await
    }
}
