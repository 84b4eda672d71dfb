//! Common test utilities and harness for the overlay's integration tests.

use std::sync::Arc;

use veil_acl::{AclConfig, ConfidentialityHooks};
use veil_core::{DocKind, LifecycleState, ManualClock, Principal, ProtectedRecord, RoleSet};
use veil_storage::MemoryHost;

/// A seeded host with hooks wired over it.
///
/// The seed holds `BOM-001`, confidential to `Engineer`, and the public
/// `BOM-002`.
pub struct TestHarness {
    /// The in-memory host
    pub host: Arc<MemoryHost>,
    /// Hooks under test
    pub hooks: ConfidentialityHooks,
    /// Time source of the decision cache
    pub clock: Arc<ManualClock>,
}

impl TestHarness {
    /// Creates a harness with the default seed.
    pub fn new() -> Self {
        let host = Arc::new(MemoryHost::new());
        host.insert(bom("BOM-001", &["Engineer"]));
        host.insert(ProtectedRecord::new(DocKind::Bom, "BOM-002"));
        Self::with_host(host)
    }

    /// Creates a harness over an existing host.
    pub fn with_host(host: Arc<MemoryHost>) -> Self {
        let clock = Arc::new(ManualClock::default());
        let hooks = ConfidentialityHooks::with_clock(
            host.clone(),
            host.clone(),
            &AclConfig::default(),
            clock.clone(),
        );
        Self { host, hooks, clock }
    }

    /// Adds a dependent of `BOM-001` in the given state.
    pub fn dependent(
        &self,
        kind: DocKind,
        id: &str,
        state: LifecycleState,
        roles: &[&str],
    ) -> &Self {
        let mut record = ProtectedRecord::new(kind, id)
            .with_bom("BOM-001")
            .with_state(state);
        if !roles.is_empty() {
            record = record.confidential(roles.iter().copied().collect());
        }
        if kind == DocKind::StockEntry {
            record = record.with_purpose("Manufacture");
        }
        self.host.insert(record);
        self
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// A confidential BOM with the given roles.
pub fn bom(id: &str, roles: &[&str]) -> ProtectedRecord {
    ProtectedRecord::new(DocKind::Bom, id).confidential(roles.iter().copied().collect())
}

/// A principal holding `roles`.
pub fn principal(user: &str, roles: &[&str]) -> Principal {
    Principal::new(user, roles.iter().copied().collect::<RoleSet>())
}

/// Holds `Engineer`.
pub fn engineer() -> Principal {
    principal("ann@example.com", &["Engineer"])
}

/// Holds `Viewer`.
pub fn viewer() -> Principal {
    principal("bob@example.com", &["Viewer"])
}

/// Holds the privileged role.
pub fn admin() -> Principal {
    principal("Administrator", &["System Manager"])
}
