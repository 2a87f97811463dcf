//! Sales order persistence seam.

use std::sync::Arc;

use wareflow_core::{DomainResult, ExpectedVersion, SalesOrderId};
use wareflow_ledger::StockAdjustment;

use crate::order::SalesOrder;

/// Sales order persistence boundary.
pub trait SalesOrderStore: Send + Sync {
    fn find_by_id(&self, id: &SalesOrderId) -> DomainResult<Option<SalesOrder>>;

    fn save(&self, order: SalesOrder, expected: ExpectedVersion) -> DomainResult<()>;

    fn list(&self) -> DomainResult<Vec<SalesOrder>>;

    /// Persist a state transition together with its ledger adjustments as
    /// one atomic unit (OUT batch on confirm, compensating IN batch on a
    /// confirmed cancellation, empty batch on a plain transition).
    fn commit_transition(
        &self,
        order: SalesOrder,
        expected: ExpectedVersion,
        adjustments: Vec<StockAdjustment>,
    ) -> DomainResult<()>;
}

impl<S> SalesOrderStore for Arc<S>
where
    S: SalesOrderStore + ?Sized,
{
    fn find_by_id(&self, id: &SalesOrderId) -> DomainResult<Option<SalesOrder>> {
        (**self).find_by_id(id)
    }

    fn save(&self, order: SalesOrder, expected: ExpectedVersion) -> DomainResult<()> {
        (**self).save(order, expected)
    }

    fn list(&self) -> DomainResult<Vec<SalesOrder>> {
        (**self).list()
    }

    fn commit_transition(
        &self,
        order: SalesOrder,
        expected: ExpectedVersion,
        adjustments: Vec<StockAdjustment>,
    ) -> DomainResult<()> {
        (**self).commit_transition(order, expected, adjustments)
    }
}
