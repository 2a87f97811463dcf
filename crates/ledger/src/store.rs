//! Transactional seam between the ledger and its backing store.

use std::sync::Arc;

use wareflow_core::{DomainResult, ExpectedVersion, ProductId};
use wareflow_products::Product;

use crate::movement::StockMovement;

/// One planned quantity change: the post-mutation product row, the version
/// the row must still be at for the plan to apply, and the movement that
/// explains the change.
///
/// Only the ledger constructs these (via its planning step), so a committed
/// adjustment is always the pair "quantity write + movement append".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    pub(crate) product: Product,
    pub(crate) expected: ExpectedVersion,
    pub(crate) movement: StockMovement,
}

impl StockAdjustment {
    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn expected(&self) -> ExpectedVersion {
        self.expected
    }

    pub fn movement(&self) -> &StockMovement {
        &self.movement
    }

    pub fn into_parts(self) -> (Product, ExpectedVersion, StockMovement) {
        (self.product, self.expected, self.movement)
    }
}

/// Ledger persistence boundary.
///
/// `commit` is the single atomic unit of the whole engine: every adjustment
/// in the batch has its `ExpectedVersion` checked against the
/// in-transaction state, then all product writes and movement appends become
/// visible together — or none do. Adjustments are applied in batch order,
/// so a batch may touch the same product more than once as long as the
/// planner chained the versions.
pub trait LedgerStore: Send + Sync {
    fn product(&self, id: &ProductId) -> DomainResult<Option<Product>>;

    fn commit(&self, batch: Vec<StockAdjustment>) -> DomainResult<()>;

    /// Every movement ever committed. No global ordering is contracted.
    fn movements(&self) -> DomainResult<Vec<StockMovement>>;

    /// Movements for one product, most recent first.
    fn movements_for_product(&self, id: &ProductId) -> DomainResult<Vec<StockMovement>>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn product(&self, id: &ProductId) -> DomainResult<Option<Product>> {
        (**self).product(id)
    }

    fn commit(&self, batch: Vec<StockAdjustment>) -> DomainResult<()> {
        (**self).commit(batch)
    }

    fn movements(&self) -> DomainResult<Vec<StockMovement>> {
        (**self).movements()
    }

    fn movements_for_product(&self, id: &ProductId) -> DomainResult<Vec<StockMovement>> {
        (**self).movements_for_product(id)
    }
}
