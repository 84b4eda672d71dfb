//! Copying and cascading confidentiality from a BOM to its dependents.
//!
//! Dependents pick up their BOM's flag and role set when they are created,
//! and again whenever the BOM's confidentiality changes. Cascades are best
//! effort: one failing dependent never stops the others, and re-running a
//! cascade converges whatever an interrupted run left behind.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use veil_core::{
    Confidentiality, DocKind, Error, LifecycleState, Operation, Principal, ProtectedRecord,
    RecordId, RecordStore, Result, SaveMode,
};

use crate::cache::PermissionCache;
use crate::debug_log::DebugLog;
use crate::evaluator::{Evaluator, Target};

/// One dependent that could not be updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropagationFailure {
    /// Kind of the dependent
    pub kind: DocKind,
    /// Identity of the dependent
    pub id: RecordId,
    /// What went wrong
    pub message: String,
}

impl From<&PropagationFailure> for Error {
    fn from(f: &PropagationFailure) -> Self {
        Error::propagation(f.kind, f.id.clone(), f.message.clone())
    }
}

/// Outcome of a cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropagationReport {
    /// Dependents whose fields were rewritten
    pub updated: Vec<(DocKind, RecordId)>,
    /// Dependents already in sync
    pub unchanged: usize,
    /// Dependents that failed
    pub failed: Vec<PropagationFailure>,
}

impl PropagationReport {
    /// Number of records written.
    pub fn writes(&self) -> usize {
        self.updated.len()
    }

    /// Returns `true` if nothing failed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: PropagationReport) {
        self.updated.extend(other.updated);
        self.unchanged += other.unchanged;
        self.failed.extend(other.failed);
    }

    fn fail(&mut self, kind: DocKind, id: RecordId, error: &Error) {
        log::error!("Error propagating confidentiality to {kind} {id}: {error}");
        self.failed.push(PropagationFailure {
            kind,
            id,
            message: error.to_string(),
        });
    }
}

impl fmt::Display for PropagationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} updated, {} unchanged, {} failed",
            self.updated.len(),
            self.unchanged,
            self.failed.len()
        )
    }
}

/// Keeps dependents in step with their BOM.
pub struct Propagator {
    evaluator: Arc<Evaluator>,
    store: Arc<dyn RecordStore>,
    cache: Arc<PermissionCache>,
    debug: Arc<DebugLog>,
}

impl Propagator {
    /// Create a propagator.
    pub fn new(
        evaluator: Arc<Evaluator>,
        store: Arc<dyn RecordStore>,
        cache: Arc<PermissionCache>,
        debug: Arc<DebugLog>,
    ) -> Self {
        Self {
            evaluator,
            store,
            cache,
            debug,
        }
    }

    /// Copy the referenced BOM's confidentiality onto a dependent about to be
    /// inserted. Whatever the caller put in those fields is replaced.
    ///
    /// # Errors
    ///
    /// - [`Error::PermissionDenied`] if the BOM is confidential and `principal`
    ///   may not access it; nothing is copied in that case.
    /// - Store errors while loading the BOM, other than not-found.
    pub async fn on_before_insert(
        &self,
        record: &mut ProtectedRecord,
        principal: &Principal,
    ) -> Result<()> {
        if !record.kind.is_dependent() {
            return Ok(());
        }
        let Some(bom_id) = record.bom_no.clone() else {
            return Ok(());
        };

        let bom = match self.store.load(DocKind::Bom, &bom_id).await {
            Ok(bom) => bom,
            Err(Error::RecordNotFound { .. }) => {
                log::debug!("{} references unknown BOM {bom_id}", record.label());
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if bom.is_confidential {
            let decision = self
                .evaluator
                .evaluate(DocKind::Bom, Target::Record(&bom), principal, Operation::Read)
                .await;
            if decision.is_deny() {
                self.debug
                    .record(&format!(
                        "{principal} denied creating {} for confidential BOM {bom_id}",
                        record.kind
                    ))
                    .await;
                return Err(Error::permission_denied(
                    DocKind::Bom,
                    bom_id,
                    format!(
                        "You don't have permission to create {} for this confidential BOM.",
                        plural(record.kind)
                    ),
                ));
            }
        }

        record.set_confidentiality(&bom.confidentiality());
        if bom.is_confidential {
            self.debug
                .record(&format!(
                    "Setting {} as confidential based on BOM {bom_id}",
                    record.label()
                ))
                .await;
        }
        Ok(())
    }

    /// Cascade a BOM save whose confidentiality differs from `before`.
    pub async fn on_bom_change(
        &self,
        before: &Confidentiality,
        bom: &ProtectedRecord,
    ) -> PropagationReport {
        let after = bom.confidentiality();
        match &bom.id {
            Some(id) if *before != after => {
                // Decisions on the BOM itself are stale even with no dependents.
                self.cache.clear();
                self.cascade(id, &after).await
            }
            _ => PropagationReport::default(),
        }
    }

    /// Force `target` onto every dependent of `bom`.
    ///
    /// Draft and submitted dependents go through the host's save path in
    /// system mode. Cancelled ones are immutable there, so they are rewritten
    /// directly in one bulk call per kind.
    pub async fn cascade(&self, bom: &RecordId, target: &Confidentiality) -> PropagationReport {
        let mut report = PropagationReport::default();

        for kind in DocKind::DEPENDENTS {
            let dependents = match self.store.dependents_of(kind, bom).await {
                Ok(d) => d,
                Err(e) => {
                    report.fail(kind, bom.clone(), &e);
                    continue;
                }
            };

            let mut cancelled = Vec::new();
            for dep in dependents {
                if dep.lifecycle == LifecycleState::Cancelled {
                    match self.store.load(kind, &dep.id).await {
                        Ok(r) if r.needs_update(target) => cancelled.push(dep.id),
                        Ok(_) => report.unchanged += 1,
                        Err(e) => report.fail(kind, dep.id, &e),
                    }
                    continue;
                }

                match self.update_open(kind, &dep.id, target).await {
                    Ok(true) => report.updated.push((kind, dep.id)),
                    Ok(false) => report.unchanged += 1,
                    Err(e) => report.fail(kind, dep.id, &e),
                }
            }

            if cancelled.is_empty() {
                continue;
            }
            match self
                .store
                .force_confidentiality(kind, &cancelled, target)
                .await
            {
                Ok(()) => report
                    .updated
                    .extend(cancelled.into_iter().map(|id| (kind, id))),
                Err(e) => {
                    for id in cancelled {
                        report.fail(kind, id, &e);
                    }
                }
            }
        }

        if report.writes() > 0 {
            self.cache.clear();
        }
        log::info!("Propagated confidentiality of BOM {bom}: {report}");
        self.debug
            .record_with(
                &format!("Propagated confidentiality of BOM {bom}: {report}"),
                serde_json::to_value(&report).ok(),
            )
            .await;
        report
    }

    async fn update_open(&self, kind: DocKind, id: &RecordId, target: &Confidentiality) -> Result<bool> {
        let mut record = self.store.load(kind, id).await?;
        if !record.needs_update(target) {
            return Ok(false);
        }
        record.set_confidentiality(target);
        self.store.save(&record, SaveMode::System).await?;
        Ok(true)
    }

    /// Re-run the cascade for every BOM.
    ///
    /// # Errors
    ///
    /// Fails only if the BOMs cannot be listed; per-record failures land in
    /// the report.
    pub async fn resync_all(&self) -> Result<PropagationReport> {
        let mut report = PropagationReport::default();
        for bom in self.store.list(DocKind::Bom).await? {
            match self.store.load(DocKind::Bom, &bom).await {
                Ok(record) => {
                    let target = record.confidentiality();
                    report.merge(self.cascade(&bom, &target).await);
                }
                Err(e) => report.fail(DocKind::Bom, bom, &e),
            }
        }
        log::info!("Resync complete: {report}");
        Ok(report)
    }
}

fn plural(kind: DocKind) -> &'static str {
    match kind {
        DocKind::Bom => "BOMs",
        DocKind::StockEntry => "Stock Entries",
        DocKind::WorkOrder => "Work Orders",
    }
}
