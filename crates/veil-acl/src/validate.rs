//! Save-time consistency checks on confidentiality fields.

use std::sync::Arc;

use veil_core::{
    DocKind, Error, Operation, Principal, ProtectedRecord, RecordStore, Result,
};

use crate::evaluator::{Evaluator, Target};

/// Runs the checks the host invokes before saving a managed record.
pub struct Validator {
    evaluator: Arc<Evaluator>,
    store: Arc<dyn RecordStore>,
}

impl Validator {
    /// Create a validator.
    pub fn new(evaluator: Arc<Evaluator>, store: Arc<dyn RecordStore>) -> Self {
        Self { evaluator, store }
    }

    /// Validate `record` as it is about to be saved by `principal`.
    ///
    /// # Errors
    ///
    /// - [`Error::ValidationFailed`] if a confidential record has no allowed
    ///   roles, or if a non-privileged principal changed the flag or role set
    ///   of an existing record.
    /// - Store errors other than not-found while loading the stored copy.
    pub async fn on_validate(&self, record: &ProtectedRecord, principal: &Principal) -> Result<()> {
        if self.evaluator.is_privileged(principal) {
            return Ok(());
        }

        if record.is_confidential
            && record.allowed_roles.is_empty()
            && !self.cleared_through_bom(record, principal).await
        {
            log::warn!("{} marked confidential without allowed roles", record.label());
            return Err(Error::validation(
                record.kind,
                record.id.clone(),
                format!(
                    "You must specify at least one allowed role for a confidential {}.",
                    record.kind
                ),
            ));
        }

        let Some(id) = &record.id else {
            return Ok(());
        };

        let stored = match self.store.load(record.kind, id).await {
            Ok(stored) => stored,
            Err(Error::RecordNotFound { .. }) => return Ok(()),
            Err(e) => return Err(e),
        };

        if stored.needs_update(&record.confidentiality()) {
            log::warn!(
                "{principal} tried to change confidentiality of {}",
                record.label()
            );
            return Err(Error::validation(
                record.kind,
                Some(id.clone()),
                format!(
                    "Only {} can change the confidentiality status or allowed roles of an existing {}.",
                    self.evaluator.privileged_role(),
                    record.kind
                ),
            ));
        }

        Ok(())
    }

    /// A derived record whose BOM the principal may access skips the
    /// empty-roles check. Stock movements qualify only for manufacturing.
    async fn cleared_through_bom(&self, record: &ProtectedRecord, principal: &Principal) -> bool {
        let bom = match record.kind {
            DocKind::Bom => None,
            DocKind::StockEntry => record.manufacturing_bom(),
            DocKind::WorkOrder => record.bom_no.as_ref(),
        };
        match bom {
            Some(bom) => self
                .evaluator
                .evaluate(DocKind::Bom, Target::Id(bom), principal, Operation::Read)
                .await
                .is_allow(),
            None => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cache::PermissionCache;
    use crate::debug_log::DebugLog;
    use crate::settings::SettingsProvider;
    use veil_core::{ManualClock, RoleSet};
    use veil_storage::MemoryHost;

    fn validator(host: &Arc<MemoryHost>) -> Validator {
        let clock = Arc::new(ManualClock::default());
        let settings = Arc::new(SettingsProvider::new(host.clone()));
        let debug = Arc::new(DebugLog::new(settings.clone(), host.clone(), clock.clone()));
        let cache = Arc::new(PermissionCache::new(300, clock));
        let evaluator = Arc::new(Evaluator::new(settings, host.clone(), cache, debug, "System Manager"));
        Validator::new(evaluator, host.clone())
    }

    fn user(roles: &[&str]) -> Principal {
        Principal::new("ann", roles.iter().copied().collect())
    }

    fn host() -> Arc<MemoryHost> {
        let host = Arc::new(MemoryHost::new());
        host.insert(
            ProtectedRecord::new(DocKind::Bom, "BOM-001").confidential(RoleSet::from(["Engineer"])),
        );
        host
    }

    #[tokio::test]
    async fn test_confidential_without_roles_rejected() {
        let host = host();
        let v = validator(&host);
        let rec = ProtectedRecord::unsaved(DocKind::Bom).confidential(RoleSet::new());
        let err = v.on_validate(&rec, &user(&["Engineer"])).await.unwrap_err();
        assert!(matches!(err, Error::ValidationFailed { kind: DocKind::Bom, .. }));
        assert!(err.to_string().contains("at least one allowed role"));
    }

    #[tokio::test]
    async fn test_privileged_skips_validation() {
        let host = host();
        let v = validator(&host);
        let rec = ProtectedRecord::new(DocKind::Bom, "BOM-001").confidential(RoleSet::new());
        v.on_validate(&rec, &user(&["System Manager"])).await.unwrap();
    }

    #[tokio::test]
    async fn test_role_change_on_existing_rejected() {
        let host = host();
        let v = validator(&host);
        let rec = ProtectedRecord::new(DocKind::Bom, "BOM-001")
            .confidential(RoleSet::from(["Engineer", "Viewer"]));
        let err = v.on_validate(&rec, &user(&["Engineer"])).await.unwrap_err();
        assert!(err.to_string().contains("Only System Manager can change"));
    }

    #[tokio::test]
    async fn test_unchanged_existing_passes() {
        let host = host();
        let v = validator(&host);
        let rec = ProtectedRecord::new(DocKind::Bom, "BOM-001").confidential(RoleSet::from(["Engineer"]));
        v.on_validate(&rec, &user(&["Engineer"])).await.unwrap();
    }

    #[tokio::test]
    async fn test_bom_access_skips_empty_roles_check() {
        let host = host();
        let v = validator(&host);
        let wo = ProtectedRecord::unsaved(DocKind::WorkOrder)
            .with_bom("BOM-001")
            .confidential(RoleSet::new());
        v.on_validate(&wo, &user(&["Engineer"])).await.unwrap();
        assert!(v.on_validate(&wo, &user(&["Viewer"])).await.is_err());

        let receipt = ProtectedRecord::unsaved(DocKind::StockEntry)
            .with_bom("BOM-001")
            .with_purpose("Material Receipt")
            .confidential(RoleSet::new());
        assert!(v.on_validate(&receipt, &user(&["Engineer"])).await.is_err());
    }

    #[tokio::test]
    async fn test_identity_not_yet_stored_is_new() {
        let host = host();
        let v = validator(&host);
        let rec = ProtectedRecord::new(DocKind::Bom, "BOM-NEW").confidential(RoleSet::from(["QA"]));
        v.on_validate(&rec, &user(&["Engineer"])).await.unwrap();
    }
}
