//! Copy-on-create and cascades from a BOM to its dependents.

use veil_core::{Confidentiality, DocKind, LifecycleState, ProtectedRecord, RoleSet};

use crate::common::{TestHarness, bom, engineer, principal, viewer};

#[tokio::test]
async fn test_flag_cleared_on_submitted_entry() {
    let harness = TestHarness::new();
    harness.dependent(DocKind::StockEntry, "SE-100", LifecycleState::Submitted, &["Engineer"]);

    let before = Confidentiality::restricted(RoleSet::from(["Engineer"]));
    let after = ProtectedRecord::new(DocKind::Bom, "BOM-001");
    harness.host.insert(after.clone());

    let report = harness.hooks.on_update_after_submit(&before, &after).await;
    assert!(report.is_clean());
    assert_eq!(report.writes(), 1);

    let se = harness.host.record(DocKind::StockEntry, "SE-100").unwrap();
    assert!(!se.is_confidential);
    assert!(se.allowed_roles.is_empty());
}

#[tokio::test]
async fn test_roles_replaced_on_cancelled_order() {
    let harness = TestHarness::new();
    harness.dependent(DocKind::WorkOrder, "WO-200", LifecycleState::Cancelled, &["Engineer"]);

    let before = Confidentiality::restricted(RoleSet::from(["Engineer"]));
    let after = bom("BOM-001", &["QA"]);
    harness.host.insert(after.clone());

    let report = harness.hooks.on_update_after_submit(&before, &after).await;
    assert!(report.is_clean(), "{:?}", report.failed);

    let grants = harness.host.grants(DocKind::WorkOrder, "WO-200");
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].role, "QA");
}

#[tokio::test]
async fn test_cascade_is_idempotent() {
    let harness = TestHarness::new();
    harness
        .dependent(DocKind::StockEntry, "SE-1", LifecycleState::Draft, &[])
        .dependent(DocKind::WorkOrder, "WO-1", LifecycleState::Submitted, &["Old"])
        .dependent(DocKind::WorkOrder, "WO-2", LifecycleState::Cancelled, &[]);

    let first = harness.hooks.resync_all().await.unwrap();
    assert_eq!(first.writes(), 3);
    let writes = harness.host.writes();

    let second = harness.hooks.resync_all().await.unwrap();
    assert_eq!(second.writes(), 0);
    assert_eq!(second.unchanged, 3);
    assert_eq!(harness.host.writes(), writes);
}

#[tokio::test]
async fn test_creation_denied_before_copy() {
    let harness = TestHarness::new();
    let mut se = ProtectedRecord::unsaved(DocKind::StockEntry)
        .with_bom("BOM-001")
        .with_purpose("Manufacture");

    let err = harness.hooks.on_before_insert(&mut se, &viewer()).await.unwrap_err();
    assert!(err.is_permission_error());
    assert!(!se.is_confidential);
    assert!(se.allowed_roles.is_empty());
}

#[tokio::test]
async fn test_creation_copies_roles_exactly() {
    let harness = TestHarness::new();
    harness.host.insert(bom("BOM-003", &["A", "B"]));

    let mut wo = ProtectedRecord::unsaved(DocKind::WorkOrder)
        .with_bom("BOM-003")
        .confidential(RoleSet::from(["C"]));
    let creator = principal("ann@example.com", &["A"]);
    harness.hooks.on_before_insert(&mut wo, &creator).await.unwrap();
    assert!(wo.is_confidential);
    assert_eq!(wo.allowed_roles, RoleSet::from(["A", "B"]));

    // The copied record passes validation for the same principal.
    harness.hooks.on_validate(&wo, &creator).await.unwrap();
}

#[tokio::test]
async fn test_public_bom_copies_public_state() {
    let harness = TestHarness::new();
    let mut wo = ProtectedRecord::unsaved(DocKind::WorkOrder)
        .with_bom("BOM-002")
        .confidential(RoleSet::from(["Stale"]));
    harness.hooks.on_before_insert(&mut wo, &viewer()).await.unwrap();
    assert!(!wo.is_confidential);
    assert!(wo.allowed_roles.is_empty());
}

#[tokio::test]
async fn test_cascade_clears_cached_decisions() {
    let harness = TestHarness::new();
    harness.dependent(DocKind::WorkOrder, "WO-1", LifecycleState::Draft, &["Engineer"]);
    assert!(
        harness
            .hooks
            .check_bom_permission(&"BOM-001".into(), &engineer())
            .await
    );
    assert!(!harness.hooks.cache().is_empty());

    let after = bom("BOM-001", &["QA"]);
    harness.host.insert(after.clone());
    harness
        .hooks
        .on_update_after_submit(&Confidentiality::restricted(RoleSet::from(["Engineer"])), &after)
        .await;
    assert!(harness.hooks.cache().is_empty());
}
