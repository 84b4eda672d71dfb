//! In-memory host backend.
//!
//! [`MemoryHost`] implements every collaborator trait over plain maps.
//! Allowed roles live in a separate grant table, as they do in the host
//! database, so role reads go through the join. A few hooks support tests:
//! failure injection per record, an unavailable settings record, and
//! counters for lookups, writes and explosions.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use veil_core::{
    BomItem, BomItemSource, BomItemsRequest, Confidentiality, DependentRef, DocKind, Error,
    Principal, ProtectedRecord, RecordId, RecordStore, Result, RoleDirectory, RoleGrant, RoleSet,
    SaveMode, Settings, SettingsStore,
};

type Key = (DocKind, RecordId);

#[derive(Debug, Default)]
pub(crate) struct State {
    /// Records with `allowed_roles` left empty; roles live in `grants`.
    pub(crate) records: BTreeMap<Key, ProtectedRecord>,
    pub(crate) grants: Vec<RoleGrant>,
    pub(crate) settings: Settings,
    pub(crate) debug_logs: String,
    pub(crate) users: BTreeMap<String, RoleSet>,
    pub(crate) bom_items: HashMap<RecordId, Vec<BomItem>>,
    pub(crate) settings_unavailable: bool,
    pub(crate) failing: HashSet<Key>,
    pub(crate) writes: usize,
    pub(crate) flag_lookups: usize,
    pub(crate) explosions: usize,
}

impl State {
    fn check(&self, kind: DocKind, id: &RecordId) -> Result<()> {
        if self.failing.contains(&(kind, id.clone())) {
            return Err(Error::store(format!("injected failure on {kind} {id}")));
        }
        Ok(())
    }

    fn roles_of(&self, kind: DocKind, id: &RecordId) -> RoleSet {
        self.grants
            .iter()
            .filter(|g| g.parent_kind == kind && &g.parent == id)
            .map(|g| g.role.clone())
            .collect()
    }

    fn replace_grants(&mut self, kind: DocKind, id: &RecordId, roles: &RoleSet) {
        self.grants
            .retain(|g| !(g.parent_kind == kind && &g.parent == id));
        self.grants.extend(roles.iter().map(|role| RoleGrant {
            parent: id.clone(),
            parent_kind: kind,
            role: role.to_string(),
        }));
    }

    fn get(&self, kind: DocKind, id: &RecordId) -> Result<ProtectedRecord> {
        let mut record = self
            .records
            .get(&(kind, id.clone()))
            .cloned()
            .ok_or_else(|| Error::not_found(kind, id.clone()))?;
        record.allowed_roles = self.roles_of(kind, id);
        Ok(record)
    }

    pub(crate) fn put(&mut self, mut record: ProtectedRecord) -> Result<()> {
        let id = record
            .id
            .clone()
            .ok_or_else(|| Error::store(format!("cannot store {} without identity", record.label())))?;
        let roles = std::mem::take(&mut record.allowed_roles);
        self.replace_grants(record.kind, &id, &roles);
        self.records.insert((record.kind, id), record);
        Ok(())
    }

    pub(crate) fn all_records(&self) -> Vec<ProtectedRecord> {
        self.records
            .values()
            .filter_map(|r| r.id.as_ref().and_then(|id| self.get(r.kind, id).ok()))
            .collect()
    }
}

/// A complete host held in memory.
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<State>,
}

impl MemoryHost {
    /// An empty host with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_state(state: State) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace a record, rewriting its role grants.
    ///
    /// Records without an identity are ignored.
    pub fn insert(&self, record: ProtectedRecord) {
        if let Err(e) = self.state().put(record) {
            log::warn!("Ignoring record: {e}");
        }
    }

    /// A stored record with its roles, if present.
    pub fn record(&self, kind: DocKind, id: impl Into<RecordId>) -> Option<ProtectedRecord> {
        self.state().get(kind, &id.into()).ok()
    }

    /// Grant rows for one record.
    pub fn grants(&self, kind: DocKind, id: impl Into<RecordId>) -> Vec<RoleGrant> {
        let id = id.into();
        self.state()
            .grants
            .iter()
            .filter(|g| g.parent_kind == kind && g.parent == id)
            .cloned()
            .collect()
    }

    /// Assign roles to a user.
    pub fn set_user_roles(&self, user: impl Into<String>, roles: RoleSet) {
        self.state().users.insert(user.into(), roles);
    }

    /// Items returned when `bom` is exploded at quantity 1.
    pub fn set_bom_items(&self, bom: impl Into<RecordId>, items: Vec<BomItem>) {
        self.state().bom_items.insert(bom.into(), items);
    }

    /// Overwrite the settings record.
    pub fn set_settings(&self, settings: Settings) {
        self.state().settings = settings;
    }

    /// Make every settings read and write fail.
    pub fn set_settings_unavailable(&self, unavailable: bool) {
        self.state().settings_unavailable = unavailable;
    }

    /// Make every access to one record fail.
    pub fn fail_on(&self, kind: DocKind, id: impl Into<RecordId>) {
        self.state().failing.insert((kind, id.into()));
    }

    /// Records written through `save` or `force_confidentiality`.
    pub fn writes(&self) -> usize {
        self.state().writes
    }

    /// Calls to [`RecordStore::is_confidential`].
    pub fn flag_lookups(&self) -> usize {
        self.state().flag_lookups
    }

    /// Calls to [`BomItemSource::bom_items`].
    pub fn explosions(&self) -> usize {
        self.state().explosions
    }

    fn settings_state(&self) -> Result<MutexGuard<'_, State>> {
        let state = self.state();
        if state.settings_unavailable {
            return Err(Error::unavailable("settings record unavailable"));
        }
        Ok(state)
    }
}

#[async_trait]
impl RecordStore for MemoryHost {
    async fn is_confidential(&self, kind: DocKind, id: &RecordId) -> Result<bool> {
        let mut state = self.state();
        state.flag_lookups += 1;
        state.check(kind, id)?;
        state
            .records
            .get(&(kind, id.clone()))
            .map(|r| r.is_confidential)
            .ok_or_else(|| Error::not_found(kind, id.clone()))
    }

    async fn allowed_roles(&self, kind: DocKind, id: &RecordId) -> Result<RoleSet> {
        let state = self.state();
        state.check(kind, id)?;
        Ok(state.roles_of(kind, id))
    }

    async fn load(&self, kind: DocKind, id: &RecordId) -> Result<ProtectedRecord> {
        let state = self.state();
        state.check(kind, id)?;
        state.get(kind, id)
    }

    async fn list(&self, kind: DocKind) -> Result<Vec<RecordId>> {
        Ok(self
            .state()
            .records
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, id)| id.clone())
            .collect())
    }

    async fn dependents_of(&self, kind: DocKind, bom: &RecordId) -> Result<Vec<DependentRef>> {
        Ok(self
            .state()
            .records
            .iter()
            .filter(|((k, _), r)| *k == kind && r.bom_no.as_ref() == Some(bom))
            .map(|((k, id), r)| DependentRef {
                kind: *k,
                id: id.clone(),
                lifecycle: r.lifecycle,
            })
            .collect())
    }

    async fn save(&self, record: &ProtectedRecord, mode: SaveMode) -> Result<()> {
        let mut state = self.state();
        let Some(id) = &record.id else {
            return Err(Error::store("cannot save a record without identity"));
        };
        state.check(record.kind, id)?;
        if let Some(stored) = state.records.get(&(record.kind, id.clone()))
            && stored.lifecycle.is_immutable()
        {
            return Err(Error::validation(
                record.kind,
                Some(id.clone()),
                format!("Cannot edit a {} {}", stored.lifecycle, record.kind),
            ));
        }
        log::debug!("Saving {} ({mode:?})", record.label());
        state.put(record.clone())?;
        state.writes += 1;
        Ok(())
    }

    async fn force_confidentiality(
        &self,
        kind: DocKind,
        ids: &[RecordId],
        target: &Confidentiality,
    ) -> Result<()> {
        let mut state = self.state();
        for id in ids {
            state.check(kind, id)?;
            if !state.records.contains_key(&(kind, id.clone())) {
                return Err(Error::not_found(kind, id.clone()));
            }
        }
        for id in ids {
            if let Some(record) = state.records.get_mut(&(kind, id.clone())) {
                record.is_confidential = target.is_confidential;
            }
            state.replace_grants(kind, id, &target.allowed_roles);
        }
        state.writes += ids.len();
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemoryHost {
    async fn load_settings(&self) -> Result<Settings> {
        Ok(self.settings_state()?.settings.clone())
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.settings_state()?.settings = settings.clone();
        Ok(())
    }

    async fn debug_logs(&self) -> Result<String> {
        Ok(self.settings_state()?.debug_logs.clone())
    }

    async fn write_debug_logs(&self, logs: &str) -> Result<()> {
        self.settings_state()?.debug_logs = logs.to_string();
        Ok(())
    }
}

#[async_trait]
impl RoleDirectory for MemoryHost {
    async fn roles_for(&self, user: &str) -> Result<RoleSet> {
        Ok(self.state().users.get(user).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl BomItemSource for MemoryHost {
    async fn bom_items(
        &self,
        _principal: &Principal,
        request: &BomItemsRequest,
    ) -> Result<Vec<BomItem>> {
        let mut state = self.state();
        state.explosions += 1;
        if !state.records.contains_key(&(DocKind::Bom, request.bom.clone())) {
            return Err(Error::not_found(DocKind::Bom, request.bom.clone()));
        }
        Ok(state
            .bom_items
            .get(&request.bom)
            .map(|items| {
                items
                    .iter()
                    .map(|item| BomItem {
                        qty: item.qty * request.qty,
                        ..item.clone()
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
