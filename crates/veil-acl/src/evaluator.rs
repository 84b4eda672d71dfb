//! Permission evaluation for confidential records.
//!
//! [`Evaluator::evaluate`] answers ALLOW, DENY or DEFER for one principal and
//! one record. DEFER means the host's baseline rules apply. Lookup failures
//! fail closed.

use std::borrow::Cow;
use std::sync::Arc;

use veil_core::{Decision, DocKind, Operation, Principal, ProtectedRecord, RecordId, RecordStore};

use crate::cache::{CacheKey, PermissionCache};
use crate::debug_log::DebugLog;
use crate::settings::SettingsProvider;

/// The record a check is made for: already loaded, or by identity only.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// The caller already holds the record.
    Record(&'a ProtectedRecord),
    /// Only the identity is known.
    Id(&'a RecordId),
}

impl<'a> Target<'a> {
    /// Identity of the target, if it has one.
    pub fn id(&self) -> Option<&'a RecordId> {
        match self {
            Target::Record(r) => r.id.as_ref(),
            Target::Id(id) => Some(id),
        }
    }

    /// Returns `true` for a record the host has not inserted yet.
    pub fn is_new(&self) -> bool {
        self.id().is_none()
    }

    fn loaded_flag(&self) -> Option<bool> {
        match self {
            Target::Record(r) => Some(r.is_confidential),
            Target::Id(_) => None,
        }
    }
}

impl<'a> From<&'a ProtectedRecord> for Target<'a> {
    fn from(record: &'a ProtectedRecord) -> Self {
        Target::Record(record)
    }
}

impl<'a> From<&'a RecordId> for Target<'a> {
    fn from(id: &'a RecordId) -> Self {
        Target::Id(id)
    }
}

/// Decides access to confidential records.
pub struct Evaluator {
    settings: Arc<SettingsProvider>,
    store: Arc<dyn RecordStore>,
    cache: Arc<PermissionCache>,
    debug: Arc<DebugLog>,
    privileged_role: String,
}

impl Evaluator {
    /// Create an evaluator.
    pub fn new(
        settings: Arc<SettingsProvider>,
        store: Arc<dyn RecordStore>,
        cache: Arc<PermissionCache>,
        debug: Arc<DebugLog>,
        privileged_role: impl Into<String>,
    ) -> Self {
        Self {
            settings,
            store,
            cache,
            debug,
            privileged_role: privileged_role.into(),
        }
    }

    /// The role that bypasses every check.
    pub fn privileged_role(&self) -> &str {
        &self.privileged_role
    }

    /// Returns `true` if the principal holds the privileged role.
    pub fn is_privileged(&self, principal: &Principal) -> bool {
        principal.has_role(&self.privileged_role)
    }

    /// Evaluate a principal's access to one record.
    pub async fn evaluate(
        &self,
        kind: DocKind,
        target: Target<'_>,
        principal: &Principal,
        operation: Operation,
    ) -> Decision {
        if !self.settings.is_protection_enabled(kind).await {
            return Decision::Defer;
        }

        if operation == Operation::Create && target.is_new() {
            return Decision::Defer;
        }

        if self.is_privileged(principal) {
            self.debug
                .record(&format!("{kind} ALLOW: privileged access for {principal}"))
                .await;
            return Decision::Allow;
        }

        let Some(id) = target.id() else {
            return Decision::Defer;
        };

        // A caller-held record may carry unsaved edits; only stored state is memoized.
        if let Some(flag) = target.loaded_flag() {
            return self.decide(kind, id, Some(flag), principal).await;
        }

        let key = CacheKey::new(kind, id.clone(), principal.user.clone());
        if let Some(decision) = self.cache.get(&key) {
            log::debug!("{kind} {id} decision for {principal} from cache: {decision}");
            return decision;
        }

        let decision = self.decide(kind, id, None, principal).await;
        self.cache.insert(key, decision);
        decision
    }

    async fn decide(
        &self,
        kind: DocKind,
        id: &RecordId,
        loaded_flag: Option<bool>,
        principal: &Principal,
    ) -> Decision {
        let is_confidential = match loaded_flag {
            Some(flag) => flag,
            None => match self.store.is_confidential(kind, id).await {
                Ok(flag) => flag,
                Err(e) => {
                    log::error!("Error checking confidentiality of {kind} {id}: {e}");
                    self.debug
                        .record(&format!("{kind} {id} DENY: confidentiality lookup failed: {e}"))
                        .await;
                    return Decision::Deny;
                }
            },
        };

        if !is_confidential {
            return Decision::Defer;
        }

        let allowed = match self.store.allowed_roles(kind, id).await {
            Ok(roles) => roles,
            Err(e) => {
                log::error!("Error checking roles for {kind} {id}: {e}");
                self.debug
                    .record(&format!("{kind} {id} DENY: role lookup failed: {e}"))
                    .await;
                return Decision::Deny;
            }
        };

        let decision = if allowed.is_empty() {
            Decision::Deny
        } else if principal.roles.intersects(&allowed) {
            Decision::Allow
        } else {
            Decision::Deny
        };

        self.debug
            .record_with(
                &format!("{kind} {id} {decision} for {principal}"),
                Some(serde_json::json!({
                    "user_roles": principal.roles,
                    "allowed_roles": allowed,
                })),
            )
            .await;
        decision
    }

    /// Evaluate access to a stock movement.
    ///
    /// A confidential movement that consumes a BOM for manufacturing is
    /// allowed when the principal is allowed on that BOM, whatever the
    /// movement's own role set says. Everything else follows [`Self::evaluate`].
    pub async fn evaluate_stock_entry(
        &self,
        target: Target<'_>,
        principal: &Principal,
        operation: Operation,
    ) -> Decision {
        let kind = DocKind::StockEntry;
        if !self.settings.is_protection_enabled(kind).await {
            return Decision::Defer;
        }

        if operation == Operation::Create && target.is_new() {
            return Decision::Defer;
        }

        if self.is_privileged(principal) {
            self.debug
                .record(&format!("{kind} ALLOW: privileged access for {principal}"))
                .await;
            return Decision::Allow;
        }

        let record: Cow<'_, ProtectedRecord> = match target {
            Target::Record(r) => Cow::Borrowed(r),
            Target::Id(id) => match self.store.load(kind, id).await {
                Ok(r) => Cow::Owned(r),
                Err(e) => {
                    log::error!("Error loading {kind} {id} for permission check: {e}");
                    return Decision::Deny;
                }
            },
        };

        if !record.is_confidential {
            return Decision::Defer;
        }

        if let Some(bom) = record.manufacturing_bom() {
            let on_bom = self
                .evaluate(DocKind::Bom, Target::Id(bom), principal, Operation::Read)
                .await;
            if on_bom.is_allow() {
                self.debug
                    .record(&format!(
                        "{} ALLOW: {principal} has access to BOM {bom}",
                        record.label()
                    ))
                    .await;
                return Decision::Allow;
            }
        }

        // Re-evaluate by identity when the record came from the store so the
        // decision stays cacheable.
        let own = match target {
            Target::Id(_) => target,
            Target::Record(_) => Target::Record(&record),
        };
        self.evaluate(kind, own, principal, operation).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use veil_core::{ManualClock, RoleSet, Settings, SettingsStore};
    use veil_storage::MemoryHost;

    fn evaluator(host: &Arc<MemoryHost>) -> (Evaluator, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let settings = Arc::new(SettingsProvider::new(host.clone()));
        let debug = Arc::new(DebugLog::new(settings.clone(), host.clone(), clock.clone()));
        let cache = Arc::new(PermissionCache::new(300, clock.clone()));
        let ev = Evaluator::new(settings, host.clone(), cache, debug, "System Manager");
        (ev, clock)
    }

    fn principal(roles: &[&str]) -> Principal {
        Principal::new("user@example.com", roles.iter().copied().collect())
    }

    fn seeded() -> Arc<MemoryHost> {
        let host = Arc::new(MemoryHost::new());
        host.insert(
            ProtectedRecord::new(DocKind::Bom, "BOM-001").confidential(RoleSet::from(["Engineer"])),
        );
        host.insert(ProtectedRecord::new(DocKind::Bom, "BOM-PUBLIC"));
        host.insert(ProtectedRecord::new(DocKind::Bom, "BOM-EMPTY").confidential(RoleSet::new()));
        host
    }

    #[tokio::test]
    async fn test_role_match_allows_and_mismatch_denies() {
        let host = seeded();
        let (ev, _) = evaluator(&host);
        let id = RecordId::new("BOM-001");

        let d = ev
            .evaluate(DocKind::Bom, Target::Id(&id), &principal(&["Engineer"]), Operation::Read)
            .await;
        assert_eq!(d, Decision::Allow);

        let d = ev
            .evaluate(DocKind::Bom, Target::Id(&id), &principal(&["Viewer"]), Operation::Read)
            .await;
        assert_eq!(d, Decision::Deny);
    }

    #[tokio::test]
    async fn test_non_confidential_defers() {
        let host = seeded();
        let (ev, _) = evaluator(&host);
        let id = RecordId::new("BOM-PUBLIC");
        let d = ev
            .evaluate(DocKind::Bom, Target::Id(&id), &principal(&["Viewer"]), Operation::Write)
            .await;
        assert_eq!(d, Decision::Defer);
    }

    #[tokio::test]
    async fn test_empty_roles_deny() {
        let host = seeded();
        let (ev, _) = evaluator(&host);
        let id = RecordId::new("BOM-EMPTY");
        let d = ev
            .evaluate(DocKind::Bom, Target::Id(&id), &principal(&["Engineer"]), Operation::Read)
            .await;
        assert_eq!(d, Decision::Deny);
    }

    #[tokio::test]
    async fn test_privileged_allows_even_empty_roles() {
        let host = seeded();
        let (ev, _) = evaluator(&host);
        let id = RecordId::new("BOM-EMPTY");
        let d = ev
            .evaluate(DocKind::Bom, Target::Id(&id), &principal(&["System Manager"]), Operation::Read)
            .await;
        assert_eq!(d, Decision::Allow);
    }

    #[tokio::test]
    async fn test_missing_record_fails_closed() {
        let host = seeded();
        let (ev, _) = evaluator(&host);
        let id = RecordId::new("BOM-NOPE");
        let d = ev
            .evaluate(DocKind::Bom, Target::Id(&id), &principal(&["Engineer"]), Operation::Read)
            .await;
        assert_eq!(d, Decision::Deny);
    }

    #[tokio::test]
    async fn test_create_of_new_record_defers() {
        let host = seeded();
        let (ev, _) = evaluator(&host);
        let new = ProtectedRecord::unsaved(DocKind::Bom).confidential(RoleSet::new());
        let d = ev
            .evaluate(DocKind::Bom, Target::Record(&new), &principal(&[]), Operation::Create)
            .await;
        assert_eq!(d, Decision::Defer);
    }

    #[tokio::test]
    async fn test_protection_disabled_defers() {
        let host = seeded();
        host.set_settings(Settings {
            protect_bom: false,
            ..Settings::default()
        });
        let (ev, _) = evaluator(&host);
        let id = RecordId::new("BOM-001");
        let d = ev
            .evaluate(DocKind::Bom, Target::Id(&id), &principal(&["Viewer"]), Operation::Read)
            .await;
        assert_eq!(d, Decision::Defer);
    }

    #[tokio::test]
    async fn test_loaded_record_flag_preferred() {
        let host = seeded();
        let (ev, _) = evaluator(&host);
        // In memory the record is public even though the stored copy is confidential.
        let loaded = ProtectedRecord::new(DocKind::Bom, "BOM-001");
        let d = ev
            .evaluate(DocKind::Bom, Target::Record(&loaded), &principal(&["Viewer"]), Operation::Read)
            .await;
        assert_eq!(d, Decision::Defer);
        assert_eq!(host.flag_lookups(), 0);
    }

    #[tokio::test]
    async fn test_unsaved_edit_does_not_leak_into_cache() {
        let host = seeded();
        let (ev, _) = evaluator(&host);
        let viewer = principal(&["Viewer"]);
        let id = RecordId::new("BOM-001");

        // An edited copy with the flag cleared, checked before the save is validated.
        let edited = ProtectedRecord::new(DocKind::Bom, "BOM-001");
        let d = ev
            .evaluate(DocKind::Bom, Target::Record(&edited), &viewer, Operation::Write)
            .await;
        assert_eq!(d, Decision::Defer);

        let d = ev
            .evaluate(DocKind::Bom, Target::Id(&id), &viewer, Operation::Read)
            .await;
        assert_eq!(d, Decision::Deny);
    }

    #[tokio::test]
    async fn test_stock_entry_by_id_is_memoized() {
        let host = seeded();
        host.insert(
            ProtectedRecord::new(DocKind::StockEntry, "SE-3")
                .confidential(RoleSet::from(["Storekeeper"]))
                .with_purpose("Material Receipt"),
        );
        let (ev, _) = evaluator(&host);
        let id = RecordId::new("SE-3");
        let keeper = principal(&["Storekeeper"]);

        assert!(ev.evaluate_stock_entry(Target::Id(&id), &keeper, Operation::Read).await.is_allow());
        let lookups = host.flag_lookups();
        assert!(ev.evaluate_stock_entry(Target::Id(&id), &keeper, Operation::Read).await.is_allow());
        assert_eq!(host.flag_lookups(), lookups);
    }

    #[tokio::test]
    async fn test_stock_entry_privileged_access_is_logged() {
        let host = seeded();
        host.set_settings(Settings {
            debug_mode: true,
            ..Settings::default()
        });
        host.insert(
            ProtectedRecord::new(DocKind::StockEntry, "SE-4").confidential(RoleSet::new()),
        );
        let (ev, _) = evaluator(&host);
        let id = RecordId::new("SE-4");
        let d = ev
            .evaluate_stock_entry(Target::Id(&id), &principal(&["System Manager"]), Operation::Read)
            .await;
        assert_eq!(d, Decision::Allow);
        let logs = host.debug_logs().await.unwrap();
        assert!(logs.contains("Stock Entry ALLOW: privileged access"));
    }

    #[tokio::test]
    async fn test_decisions_are_memoized_until_ttl() {
        let host = seeded();
        let (ev, clock) = evaluator(&host);
        let id = RecordId::new("BOM-001");
        let viewer = principal(&["Viewer"]);

        assert!(ev.evaluate(DocKind::Bom, Target::Id(&id), &viewer, Operation::Read).await.is_deny());
        assert_eq!(host.flag_lookups(), 1);

        host.insert(ProtectedRecord::new(DocKind::Bom, "BOM-001").confidential(RoleSet::from(["Viewer"])));
        assert!(ev.evaluate(DocKind::Bom, Target::Id(&id), &viewer, Operation::Read).await.is_deny());
        assert_eq!(host.flag_lookups(), 1, "served from cache");

        clock.advance(chrono::Duration::seconds(301));
        assert!(ev.evaluate(DocKind::Bom, Target::Id(&id), &viewer, Operation::Read).await.is_allow());
        assert_eq!(host.flag_lookups(), 2);
    }

    #[tokio::test]
    async fn test_stock_entry_allowed_through_bom() {
        let host = seeded();
        // The movement's own roles were never propagated.
        host.insert(
            ProtectedRecord::new(DocKind::StockEntry, "SE-1")
                .confidential(RoleSet::from(["Storekeeper"]))
                .with_bom("BOM-001")
                .with_purpose("Manufacture"),
        );
        let (ev, _) = evaluator(&host);
        let id = RecordId::new("SE-1");

        let d = ev
            .evaluate_stock_entry(Target::Id(&id), &principal(&["Engineer"]), Operation::Submit)
            .await;
        assert_eq!(d, Decision::Allow);

        let d = ev
            .evaluate_stock_entry(Target::Id(&id), &principal(&["Viewer"]), Operation::Read)
            .await;
        assert_eq!(d, Decision::Deny);
    }

    #[tokio::test]
    async fn test_stock_entry_non_manufacturing_uses_own_roles() {
        let host = seeded();
        host.insert(
            ProtectedRecord::new(DocKind::StockEntry, "SE-2")
                .confidential(RoleSet::from(["Storekeeper"]))
                .with_bom("BOM-001")
                .with_purpose("Material Receipt"),
        );
        let (ev, _) = evaluator(&host);
        let id = RecordId::new("SE-2");

        let d = ev
            .evaluate_stock_entry(Target::Id(&id), &principal(&["Engineer"]), Operation::Read)
            .await;
        assert_eq!(d, Decision::Deny);

        let d = ev
            .evaluate_stock_entry(Target::Id(&id), &principal(&["Storekeeper"]), Operation::Read)
            .await;
        assert_eq!(d, Decision::Allow);
    }

    #[tokio::test]
    async fn test_stock_entry_missing_fails_closed() {
        let host = seeded();
        let (ev, _) = evaluator(&host);
        let id = RecordId::new("SE-404");
        let d = ev
            .evaluate_stock_entry(Target::Id(&id), &principal(&["Engineer"]), Operation::Read)
            .await;
        assert_eq!(d, Decision::Deny);
    }

    #[tokio::test]
    async fn test_debug_mode_records_decisions() {
        let host = seeded();
        host.set_settings(Settings {
            debug_mode: true,
            ..Settings::default()
        });
        let (ev, _) = evaluator(&host);
        let id = RecordId::new("BOM-001");
        ev.evaluate(DocKind::Bom, Target::Id(&id), &principal(&["Viewer"]), Operation::Read)
            .await;
        let logs = host.debug_logs().await.unwrap();
        assert!(logs.contains("BOM BOM-001 DENY"));
    }
}
