//! Route handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use veil_acl::ConfidentialityHooks;
use veil_core::{BomItem, BomItemSource, BomItemsRequest, DocKind, Principal, RecordId};

use crate::error::{Error, Result};

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    /// The overlay
    pub hooks: Arc<ConfidentialityHooks>,
    /// The host's BOM explosion, already guarded
    pub items: Arc<dyn BomItemSource>,
}

impl AppState {
    /// State over `hooks`; `explosion` is wrapped in the BOM permission guard.
    pub fn new(hooks: Arc<ConfidentialityHooks>, explosion: Arc<dyn BomItemSource>) -> Self {
        let items = Arc::new(hooks.guard_bom_items(explosion));
        Self { hooks, items }
    }
}

/// Query parameters of the item listing.
#[derive(Debug, Default, Deserialize)]
pub struct ItemsQuery {
    /// Company the explosion is computed for
    pub company: Option<String>,
    /// Quantity of finished goods
    pub qty: Option<f64>,
    /// Whether to explode sub-assemblies
    pub fetch_exploded: Option<bool>,
}

/// Body of the list-filter endpoint.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterResponse {
    /// Record kind the condition applies to
    pub kind: DocKind,
    /// SQL condition; empty means unrestricted
    pub condition: String,
}

/// Build the API routes (without auth).
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/bom/{bom}/permission", get(bom_permission))
        .route("/api/bom/{bom}/items", get(bom_items))
        .route("/api/filter/{kind}", get(list_filter))
        .route("/health", get(health))
        .with_state(state)
}

async fn bom_permission(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(bom): Path<String>,
) -> Json<bool> {
    let bom = RecordId::from(bom);
    Json(state.hooks.check_bom_permission(&bom, &principal).await)
}

async fn bom_items(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(bom): Path<String>,
    Query(query): Query<ItemsQuery>,
) -> Result<Json<Vec<BomItem>>> {
    let mut request = BomItemsRequest::new(bom);
    if let Some(company) = query.company {
        request.company = company;
    }
    if let Some(qty) = query.qty {
        request.qty = qty;
    }
    if let Some(fetch_exploded) = query.fetch_exploded {
        request.fetch_exploded = fetch_exploded;
    }
    let items = state.items.bom_items(&principal, &request).await?;
    Ok(Json(items))
}

async fn list_filter(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(kind): Path<String>,
) -> Result<Json<FilterResponse>> {
    let kind: DocKind = kind
        .parse()
        .map_err(|e: veil_core::Error| Error::BadRequest(e.to_string()))?;
    let condition = state.hooks.list_filter(kind, &principal).await;
    Ok(Json(FilterResponse {
        kind,
        condition: condition.into(),
    }))
}

async fn health() -> &'static str {
    "ok"
}
