//! Permission checks and list filters.

use veil_acl::Target;
use veil_core::{
    BomItem, BomItemSource, BomItemsRequest, Decision, DocKind, Operation, ProtectedRecord,
    RecordId, RoleSet,
};

use crate::common::{TestHarness, admin, engineer, principal, viewer};

#[tokio::test]
async fn test_bom_scenario() {
    let harness = TestHarness::new();
    let bom = RecordId::new("BOM-001");

    for (p, expected) in [
        (engineer(), Decision::Allow),
        (viewer(), Decision::Deny),
        (admin(), Decision::Allow),
    ] {
        let d = harness
            .hooks
            .has_permission(DocKind::Bom, Target::Id(&bom), &p, Operation::Read)
            .await;
        assert_eq!(d, expected, "{p}");
    }
}

#[tokio::test]
async fn test_rejected_edit_does_not_expose_bom() {
    let harness = TestHarness::new();
    let bom = RecordId::new("BOM-001");

    // A viewer's edited copy with the flag cleared, checked before validation.
    let edited = ProtectedRecord::new(DocKind::Bom, "BOM-001");
    let d = harness
        .hooks
        .has_permission(DocKind::Bom, Target::Record(&edited), &viewer(), Operation::Write)
        .await;
    assert_eq!(d, Decision::Defer);
    assert!(harness.hooks.on_validate(&edited, &viewer()).await.is_err());

    let d = harness
        .hooks
        .has_permission(DocKind::Bom, Target::Id(&bom), &viewer(), Operation::Read)
        .await;
    assert_eq!(d, Decision::Deny);
    assert!(!harness.hooks.check_bom_permission(&bom, &viewer()).await);
}

#[tokio::test]
async fn test_public_bom_defers_for_everyone() {
    let harness = TestHarness::new();
    let bom = RecordId::new("BOM-002");
    for p in [engineer(), viewer(), principal("guest", &[])] {
        let d = harness
            .hooks
            .has_permission(DocKind::Bom, Target::Id(&bom), &p, Operation::Read)
            .await;
        assert_eq!(d, Decision::Defer, "{p}");
    }
}

#[tokio::test]
async fn test_list_filter_by_principal() {
    let harness = TestHarness::new();

    assert!(harness.hooks.list_filter(DocKind::Bom, &admin()).await.is_empty());

    let f = harness.hooks.list_filter(DocKind::Bom, &engineer()).await;
    assert!(f.as_str().contains("IN ('Engineer')"));

    let f = harness
        .hooks
        .list_filter(DocKind::Bom, &principal("guest", &[]))
        .await;
    assert!(!f.as_str().contains("EXISTS"));
}

#[tokio::test]
async fn test_manufacturing_entry_follows_bom_access() {
    let harness = TestHarness::new();
    harness.host.insert(
        ProtectedRecord::new(DocKind::StockEntry, "SE-1")
            .with_bom("BOM-001")
            .with_purpose("Material Transfer for Manufacture")
            .confidential(RoleSet::from(["Storekeeper"])),
    );
    let se = RecordId::new("SE-1");

    let d = harness
        .hooks
        .has_permission(DocKind::StockEntry, Target::Id(&se), &engineer(), Operation::Submit)
        .await;
    assert_eq!(d, Decision::Allow);

    let d = harness
        .hooks
        .has_permission(
            DocKind::StockEntry,
            Target::Id(&se),
            &principal("sam", &["Storekeeper"]),
            Operation::Read,
        )
        .await;
    assert_eq!(d, Decision::Allow);

    let d = harness
        .hooks
        .has_permission(DocKind::StockEntry, Target::Id(&se), &viewer(), Operation::Read)
        .await;
    assert_eq!(d, Decision::Deny);
}

#[tokio::test]
async fn test_guarded_explosion() {
    let harness = TestHarness::new();
    harness.host.set_bom_items(
        "BOM-001",
        vec![BomItem {
            item_code: "RESIN".into(),
            qty: 1.5,
            uom: "Kg".into(),
        }],
    );
    let guarded = harness.hooks.guard_bom_items(harness.host.clone());
    let request = BomItemsRequest::new("BOM-001");

    let err = guarded.bom_items(&viewer(), &request).await.unwrap_err();
    assert!(err.is_permission_error());
    assert_eq!(harness.host.explosions(), 0);

    let items = guarded.bom_items(&engineer(), &request).await.unwrap();
    assert_eq!(items[0].item_code, "RESIN");
    assert_eq!(harness.host.explosions(), 1);
}

#[tokio::test]
async fn test_cached_decision_expires() {
    let harness = TestHarness::new();
    let bom = RecordId::new("BOM-001");
    let qa = principal("quinn", &["QA"]);

    assert!(!harness.hooks.check_bom_permission(&bom, &qa).await);

    // A direct store change is only picked up once the cached decision ages out.
    harness.host.insert(crate::common::bom("BOM-001", &["QA"]));
    assert!(!harness.hooks.check_bom_permission(&bom, &qa).await);

    harness.clock.advance(chrono::Duration::seconds(300));
    assert!(harness.hooks.check_bom_permission(&bom, &qa).await);
}
