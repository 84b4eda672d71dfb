//! Common test utilities for the API integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, Response};
use tower::ServiceExt;
use veil_acl::{AclConfig, ConfidentialityHooks};
use veil_api::{AppState, app};
use veil_auth::{AuthConfig, AuthLayer, DirectoryResolver};
use veil_core::{BomItem, DocKind, ProtectedRecord, RoleSet};
use veil_storage::MemoryHost;

/// A seeded host served through the full router.
pub struct TestHarness {
    /// The in-memory host
    pub host: Arc<MemoryHost>,
    /// Router with auth enabled
    pub router: Router,
}

impl TestHarness {
    /// `BOM-001` is confidential to `Engineer`; ann is an engineer, bob a viewer,
    /// root a system manager. Each user's token is `tok-<user>`.
    pub fn new() -> Self {
        let host = Arc::new(MemoryHost::new());
        host.insert(
            ProtectedRecord::new(DocKind::Bom, "BOM-001").confidential(RoleSet::from(["Engineer"])),
        );
        host.set_bom_items(
            "BOM-001",
            vec![BomItem {
                item_code: "STEEL-PLATE".into(),
                qty: 2.0,
                uom: "Nos".into(),
            }],
        );
        host.set_user_roles("ann", RoleSet::from(["Engineer"]));
        host.set_user_roles("bob", RoleSet::from(["Viewer"]));
        host.set_user_roles("root", RoleSet::from(["System Manager"]));

        let hooks = Arc::new(ConfidentialityHooks::new(
            host.clone(),
            host.clone(),
            &AclConfig::default(),
        ));
        let state = AppState::new(hooks, host.clone());
        let auth = AuthLayer::new(
            Arc::new(DirectoryResolver::new(host.clone())),
            AuthConfig {
                enabled: true,
                tokens: [("ann", "tok-ann"), ("bob", "tok-bob"), ("root", "tok-root")]
                    .into_iter()
                    .map(|(user, token)| (token.to_string(), user.to_string()))
                    .collect(),
                ..AuthConfig::default()
            },
        );
        Self {
            host,
            router: app(state, auth),
        }
    }

    /// Send a GET as `user`, using the token configured for them.
    pub async fn get(&self, uri: &str, user: Option<&str>) -> Response<Body> {
        self.get_with_token(uri, user.map(|u| format!("tok-{u}")).as_deref())
            .await
    }

    /// Send a GET with a raw bearer token (no Authorization header when `None`).
    pub async fn get_with_token(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }
}

/// Read a response body as JSON.
pub async fn json(resp: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
