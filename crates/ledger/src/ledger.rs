//! The stock ledger: plan-then-commit quantity adjustments.
//!
//! Planning is pure — it validates the request, resolves the product and
//! computes the post-adjustment row without touching the store. All
//! mutation happens in a single [`LedgerStore::commit`] call, so a
//! multi-item plan either lands completely or not at all.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use wareflow_core::{DomainError, DomainResult, ExpectedVersion, ProductId, Versioned};
use wareflow_products::Product;

use crate::movement::{MovementDirection, StockMovement};
use crate::store::{LedgerStore, StockAdjustment};

/// How many times `adjust_stock` re-plans after a version conflict before
/// surfacing `Conflict` to the caller.
const MAX_CONFLICT_RETRIES: u32 = 3;

/// One requested quantity change, before planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentRequest {
    pub product_id: ProductId,
    pub direction: MovementDirection,
    pub quantity: u32,
    pub reason: Option<String>,
}

impl AdjustmentRequest {
    pub fn new(
        product_id: ProductId,
        direction: MovementDirection,
        quantity: u32,
        reason: impl Into<Option<String>>,
    ) -> Self {
        Self {
            product_id,
            direction,
            quantity,
            reason: reason.into(),
        }
    }
}

/// Stock ledger service over a transactional store.
#[derive(Debug)]
pub struct StockLedger<S> {
    store: S,
}

impl<S> StockLedger<S>
where
    S: LedgerStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validate and apply a single adjustment.
    ///
    /// On a version conflict (another writer got to the product first) the
    /// ledger re-reads and re-plans against fresh state, a bounded number
    /// of times. A retry can therefore turn into `InsufficientStock` if the
    /// competing writer consumed the stock — that is the correct outcome.
    pub fn adjust_stock(
        &self,
        product_id: ProductId,
        direction: MovementDirection,
        quantity: u32,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<StockMovement> {
        let request = AdjustmentRequest::new(product_id, direction, quantity, reason);

        let mut attempt = 0;
        loop {
            let plan = self.plan(&request, now)?;
            let movement = plan.movement().clone();
            match self.store.commit(vec![plan]) {
                Ok(()) => {
                    debug!(
                        product_id = %product_id,
                        direction = %direction,
                        quantity,
                        "stock adjusted"
                    );
                    return Ok(movement);
                }
                Err(DomainError::Conflict(msg)) if attempt < MAX_CONFLICT_RETRIES => {
                    attempt += 1;
                    debug!(product_id = %product_id, attempt, "retrying after version conflict: {msg}");
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// Plan a single adjustment without committing it.
    pub fn plan(
        &self,
        request: &AdjustmentRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<StockAdjustment> {
        if request.quantity == 0 {
            return Err(DomainError::validation(
                "quantity must be greater than zero",
            ));
        }

        let product = self
            .store
            .product(&request.product_id)?
            .ok_or(DomainError::NotFound)?;

        plan_against(product, request, now)
    }

    /// Plan a batch of adjustments as one failure domain.
    ///
    /// Products are loaded once and chained through the working set, so a
    /// batch may reference the same product repeatedly and the emitted
    /// expected-versions still line up for an in-order commit. Any
    /// invalid request fails the whole batch with nothing planned.
    pub fn plan_batch(
        &self,
        requests: &[AdjustmentRequest],
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<StockAdjustment>> {
        let mut working: HashMap<ProductId, Product> = HashMap::new();
        let mut plans = Vec::with_capacity(requests.len());

        for request in requests {
            if request.quantity == 0 {
                return Err(DomainError::validation(
                    "quantity must be greater than zero",
                ));
            }

            let product = match working.remove(&request.product_id) {
                Some(p) => p,
                None => self
                    .store
                    .product(&request.product_id)?
                    .ok_or(DomainError::NotFound)?,
            };

            let plan = plan_against(product, request, now)?;
            working.insert(request.product_id, plan.product().clone());
            plans.push(plan);
        }

        Ok(plans)
    }

    /// Commit previously planned adjustments as one atomic unit.
    pub fn commit(&self, batch: Vec<StockAdjustment>) -> DomainResult<()> {
        self.store.commit(batch)
    }

    /// Every committed movement.
    pub fn movements(&self) -> DomainResult<Vec<StockMovement>> {
        self.store.movements()
    }

    /// Movement history for one product, most recent first.
    pub fn movements_for_product(
        &self,
        product_id: ProductId,
    ) -> DomainResult<Vec<StockMovement>> {
        if self.store.product(&product_id)?.is_none() {
            return Err(DomainError::NotFound);
        }
        self.store.movements_for_product(&product_id)
    }
}

fn plan_against(
    product: Product,
    request: &AdjustmentRequest,
    now: DateTime<Utc>,
) -> DomainResult<StockAdjustment> {
    let expected = ExpectedVersion::Exact(product.version());

    let mut updated = product;
    match request.direction {
        MovementDirection::In => updated.receive_stock(request.quantity)?,
        MovementDirection::Out => updated.issue_stock(request.quantity)?,
    }

    let movement = StockMovement::record(
        request.product_id,
        request.direction,
        request.quantity,
        request.reason.clone(),
        now,
    );

    Ok(StockAdjustment {
        product: updated,
        expected,
        movement,
    })
}
