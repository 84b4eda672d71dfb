//! Save-time validation, settings and lifecycle events.

use veil_acl::LifecycleEvent;
use veil_core::{
    DocKind, Error, ProtectedRecord, RecordId, RoleSet, Settings, SettingsStore,
};

use crate::common::{TestHarness, admin, bom, engineer, viewer};

#[tokio::test]
async fn test_validation_rules() {
    let harness = TestHarness::new();

    let empty = ProtectedRecord::unsaved(DocKind::Bom).confidential(RoleSet::new());
    let err = harness.hooks.on_validate(&empty, &engineer()).await.unwrap_err();
    assert!(matches!(err, Error::ValidationFailed { .. }));
    harness.hooks.on_validate(&empty, &admin()).await.unwrap();

    let widened = bom("BOM-001", &["Engineer", "Viewer"]);
    let err = harness.hooks.on_validate(&widened, &engineer()).await.unwrap_err();
    assert!(err.is_user_facing());
    harness.hooks.on_validate(&widened, &admin()).await.unwrap();
}

#[tokio::test]
async fn test_validation_skipped_when_protection_off() {
    let harness = TestHarness::new();
    harness.host.set_settings(Settings {
        enable_confidential_protection: false,
        ..Settings::default()
    });
    let empty = ProtectedRecord::unsaved(DocKind::Bom).confidential(RoleSet::new());
    harness.hooks.on_validate(&empty, &viewer()).await.unwrap();
}

#[tokio::test]
async fn test_login_event_picks_up_new_settings() {
    let harness = TestHarness::new();
    let bom = RecordId::new("BOM-001");

    assert!(!harness.hooks.check_bom_permission(&bom, &viewer()).await);

    harness.host.set_settings(Settings {
        protect_bom: false,
        ..Settings::default()
    });
    assert!(!harness.hooks.check_bom_permission(&bom, &viewer()).await);

    harness.hooks.on_event(&LifecycleEvent::Login {
        user: "bob@example.com".into(),
    });
    assert!(harness.hooks.check_bom_permission(&bom, &viewer()).await);
}

#[tokio::test]
async fn test_unavailable_settings_disable_protection() {
    let harness = TestHarness::new();
    harness.host.set_settings_unavailable(true);
    harness.hooks.on_event(&LifecycleEvent::Migrate);

    let bom = RecordId::new("BOM-001");
    assert!(harness.hooks.check_bom_permission(&bom, &viewer()).await);
    assert!(harness.hooks.list_filter(DocKind::Bom, &viewer()).await.is_empty());
}

#[tokio::test]
async fn test_disabling_debug_clears_log() {
    let harness = TestHarness::new();
    harness
        .hooks
        .update_settings(&Settings {
            debug_mode: true,
            ..Settings::default()
        })
        .await
        .unwrap();
    harness
        .hooks
        .check_bom_permission(&RecordId::new("BOM-001"), &viewer())
        .await;
    assert!(!harness.host.debug_logs().await.unwrap().is_empty());

    harness.hooks.update_settings(&Settings::default()).await.unwrap();
    assert_eq!(harness.host.debug_logs().await.unwrap(), "");
}
