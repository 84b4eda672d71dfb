//! Permission guard around the host's BOM explosion.
//!
//! The host's per-record hook never sees calls to the explosion endpoint, so
//! the endpoint is wrapped where it is registered.

use std::sync::Arc;

use async_trait::async_trait;
use veil_core::{
    BomItem, BomItemSource, BomItemsRequest, DocKind, Error, Operation, Principal,
    ProtectedRecord, Result,
};

use crate::evaluator::{Evaluator, Target};

/// Message returned when the explosion of a confidential BOM is refused.
pub const BOM_ACCESS_DENIED: &str = "You don't have permission to access this confidential BOM.";

/// A [`BomItemSource`] that checks BOM permission before delegating.
pub struct GuardedBomItems<S> {
    inner: S,
    evaluator: Arc<Evaluator>,
}

impl<S: BomItemSource> GuardedBomItems<S> {
    /// Wrap `inner`.
    pub fn new(inner: S, evaluator: Arc<Evaluator>) -> Self {
        Self { inner, evaluator }
    }

    /// Items for a stock movement.
    ///
    /// A manufacturing movement whose BOM the principal may not access gets
    /// an empty list rather than an error. Movements without a manufacturing
    /// BOM have nothing to explode.
    pub async fn stock_entry_items(
        &self,
        entry: &ProtectedRecord,
        principal: &Principal,
    ) -> Result<Vec<BomItem>> {
        let Some(bom) = entry.manufacturing_bom() else {
            return Ok(Vec::new());
        };

        match self.bom_items(principal, &BomItemsRequest::new(bom.clone())).await {
            Err(e) if e.is_permission_error() => {
                log::debug!("No permission to access BOM {bom} for {}", entry.label());
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// The wrapped source.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: BomItemSource> BomItemSource for GuardedBomItems<S> {
    async fn bom_items(
        &self,
        principal: &Principal,
        request: &BomItemsRequest,
    ) -> Result<Vec<BomItem>> {
        log::debug!("BOM items request: bom={}, user={}", request.bom, principal.user);
        let decision = self
            .evaluator
            .evaluate(DocKind::Bom, Target::Id(&request.bom), principal, Operation::Read)
            .await;
        if decision.is_deny() {
            return Err(Error::permission_denied(
                DocKind::Bom,
                request.bom.clone(),
                BOM_ACCESS_DENIED,
            ));
        }
        self.inner.bom_items(principal, request).await
    }
}
