//! Purchase order persistence seam.

use std::sync::Arc;

use wareflow_core::{DomainResult, ExpectedVersion, PurchaseOrderId};
use wareflow_ledger::StockAdjustment;

use crate::order::PurchaseOrder;

/// Purchase order persistence boundary.
pub trait PurchaseOrderStore: Send + Sync {
    fn find_by_id(&self, id: &PurchaseOrderId) -> DomainResult<Option<PurchaseOrder>>;

    fn save(&self, order: PurchaseOrder, expected: ExpectedVersion) -> DomainResult<()>;

    fn list(&self) -> DomainResult<Vec<PurchaseOrder>>;

    /// Persist the received order together with its IN adjustments as one
    /// atomic unit: the status transition and every ledger write become
    /// visible together, or none do.
    fn commit_receipt(
        &self,
        order: PurchaseOrder,
        expected: ExpectedVersion,
        adjustments: Vec<StockAdjustment>,
    ) -> DomainResult<()>;
}

impl<S> PurchaseOrderStore for Arc<S>
where
    S: PurchaseOrderStore + ?Sized,
{
    fn find_by_id(&self, id: &PurchaseOrderId) -> DomainResult<Option<PurchaseOrder>> {
        (**self).find_by_id(id)
    }

    fn save(&self, order: PurchaseOrder, expected: ExpectedVersion) -> DomainResult<()> {
        (**self).save(order, expected)
    }

    fn list(&self) -> DomainResult<Vec<PurchaseOrder>> {
        (**self).list()
    }

    fn commit_receipt(
        &self,
        order: PurchaseOrder,
        expected: ExpectedVersion,
        adjustments: Vec<StockAdjustment>,
    ) -> DomainResult<()> {
        (**self).commit_receipt(order, expected, adjustments)
    }
}
