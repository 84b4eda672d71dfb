//! The surface the host calls into.
//!
//! [`ConfidentialityHooks`] wires the settings provider, decision cache,
//! evaluator, validator and propagator over one pair of host stores and
//! exposes them as the permission, list and document-event hooks the host
//! invokes for the three managed kinds.

use std::sync::Arc;

use veil_core::{
    BomItemSource, Clock, Confidentiality, Decision, DocKind, Operation, Principal,
    ProtectedRecord, RecordId, RecordStore, Result, Settings, SettingsStore, SystemClock,
};

use crate::cache::PermissionCache;
use crate::config::AclConfig;
use crate::debug_log::DebugLog;
use crate::evaluator::{Evaluator, Target};
use crate::events::{self, LifecycleEvent};
use crate::filter::{self, QueryFragment};
use crate::guard::GuardedBomItems;
use crate::propagate::{PropagationReport, Propagator};
use crate::settings::SettingsProvider;
use crate::validate::Validator;

/// Host-facing entry point of the confidentiality layer.
pub struct ConfidentialityHooks {
    settings: Arc<SettingsProvider>,
    cache: Arc<PermissionCache>,
    debug: Arc<DebugLog>,
    evaluator: Arc<Evaluator>,
    validator: Validator,
    propagator: Propagator,
}

impl ConfidentialityHooks {
    /// Build the hooks on wall-clock time.
    pub fn new(
        records: Arc<dyn RecordStore>,
        settings_store: Arc<dyn SettingsStore>,
        config: &AclConfig,
    ) -> Self {
        Self::with_clock(records, settings_store, config, Arc::new(SystemClock))
    }

    /// Build the hooks with an explicit time source.
    pub fn with_clock(
        records: Arc<dyn RecordStore>,
        settings_store: Arc<dyn SettingsStore>,
        config: &AclConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let settings = Arc::new(SettingsProvider::new(settings_store.clone()));
        let cache = Arc::new(PermissionCache::new(config.cache_ttl_secs, clock.clone()));
        let debug = Arc::new(DebugLog::new(settings.clone(), settings_store, clock));
        let evaluator = Arc::new(Evaluator::new(
            settings.clone(),
            records.clone(),
            cache.clone(),
            debug.clone(),
            config.privileged_role.clone(),
        ));
        let validator = Validator::new(evaluator.clone(), records.clone());
        let propagator = Propagator::new(evaluator.clone(), records, cache.clone(), debug.clone());

        Self {
            settings,
            cache,
            debug,
            evaluator,
            validator,
            propagator,
        }
    }

    /// Per-record permission hook.
    pub async fn has_permission(
        &self,
        kind: DocKind,
        target: Target<'_>,
        principal: &Principal,
        operation: Operation,
    ) -> Decision {
        match kind {
            DocKind::StockEntry => {
                self.evaluator
                    .evaluate_stock_entry(target, principal, operation)
                    .await
            }
            _ => self.evaluator.evaluate(kind, target, principal, operation).await,
        }
    }

    /// List query hook; empty when protection is off for `kind`.
    pub async fn list_filter(&self, kind: DocKind, principal: &Principal) -> QueryFragment {
        if !self.settings.is_protection_enabled(kind).await {
            return QueryFragment::empty();
        }
        filter::filter_predicate(kind, principal, self.evaluator.privileged_role())
    }

    /// Validate hook, run before every save of a managed record.
    ///
    /// # Errors
    ///
    /// See [`Validator::on_validate`].
    pub async fn on_validate(&self, record: &ProtectedRecord, principal: &Principal) -> Result<()> {
        if !self.settings.is_protection_enabled(record.kind).await {
            return Ok(());
        }
        self.validator.on_validate(record, principal).await
    }

    /// Before-insert hook for dependents.
    ///
    /// # Errors
    ///
    /// See [`Propagator::on_before_insert`].
    pub async fn on_before_insert(
        &self,
        record: &mut ProtectedRecord,
        principal: &Principal,
    ) -> Result<()> {
        self.propagator.on_before_insert(record, principal).await
    }

    /// Hook run after a BOM is saved; `before` is its pre-save snapshot.
    ///
    /// Other kinds are ignored.
    pub async fn on_update_after_submit(
        &self,
        before: &Confidentiality,
        record: &ProtectedRecord,
    ) -> PropagationReport {
        if record.kind != DocKind::Bom {
            return PropagationReport::default();
        }
        self.propagator.on_bom_change(before, record).await
    }

    /// Whether `principal` may see `bom`, for client-side display decisions.
    pub async fn check_bom_permission(&self, bom: &RecordId, principal: &Principal) -> bool {
        self.has_permission(DocKind::Bom, Target::Id(bom), principal, Operation::Read)
            .await
            .permits()
    }

    /// Re-run propagation for every BOM.
    ///
    /// # Errors
    ///
    /// See [`Propagator::resync_all`].
    pub async fn resync_all(&self) -> Result<PropagationReport> {
        self.propagator.resync_all().await
    }

    /// Persist new settings and drop every cached decision.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the settings cannot be saved.
    pub async fn update_settings(&self, settings: &Settings) -> Result<()> {
        self.settings.update_settings(settings).await?;
        self.cache.clear();
        self.debug
            .record_with(
                "Confidential settings updated",
                serde_json::to_value(settings).ok(),
            )
            .await;
        Ok(())
    }

    /// React to a host lifecycle event.
    pub fn on_event(&self, event: &LifecycleEvent) {
        events::handle(event, &self.settings, &self.cache);
    }

    /// Wrap the host's BOM explosion with a permission check.
    pub fn guard_bom_items<S: BomItemSource>(&self, inner: S) -> GuardedBomItems<S> {
        GuardedBomItems::new(inner, self.evaluator.clone())
    }

    /// The settings provider.
    pub fn settings(&self) -> &SettingsProvider {
        &self.settings
    }

    /// The decision cache.
    pub fn cache(&self) -> &PermissionCache {
        &self.cache
    }

    /// The evaluator.
    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }
}
