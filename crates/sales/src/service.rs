//! Sales order workflow: create, confirm (stock out), ship, complete,
//! cancel.

use std::time::Instant;

use chrono::{DateTime, Datelike, Utc};
use tracing::{info, warn};

use wareflow_core::{
    DomainError, DomainResult, ExpectedVersion, OrderNumber, OrderPrefix, SalesOrderId,
    SequenceProvider, Versioned,
};
use wareflow_events::{EventBus, NoticeLine, NotificationEvent, SalesOrderNotice};
use wareflow_ledger::{AdjustmentRequest, LedgerStore, MovementDirection, StockLedger};
use wareflow_products::ProductStore;

use crate::order::{SalesOrder, SalesOrderLine, SalesOrderStatus};
use crate::picking::PickingSlip;
use crate::store::SalesOrderStore;

/// Caller input for a new sales order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSalesOrder {
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub lines: Vec<SalesOrderLine>,
}

/// Sales order workflow service.
///
/// Confirmation follows plan-then-commit: every line's OUT adjustment is
/// planned first, so an insufficient line anywhere in the list aborts the
/// whole confirmation before anything is written. Cancelling a confirmed
/// order reverses its OUT movements with compensating IN movements in the
/// same atomic fashion.
#[derive(Debug)]
pub struct SalesOrders<S, P, L, Q, B> {
    orders: S,
    products: P,
    ledger: StockLedger<L>,
    sequences: Q,
    bus: B,
}

impl<S, P, L, Q, B> SalesOrders<S, P, L, Q, B>
where
    S: SalesOrderStore,
    P: ProductStore,
    L: LedgerStore,
    Q: SequenceProvider,
    B: EventBus<NotificationEvent>,
{
    pub fn new(orders: S, products: P, ledger: StockLedger<L>, sequences: Q, bus: B) -> Self {
        Self {
            orders,
            products,
            ledger,
            sequences,
            bus,
        }
    }

    /// Create a new order. No stock is touched until confirmation.
    pub fn create(&self, input: NewSalesOrder, now: DateTime<Utc>) -> DomainResult<SalesOrder> {
        if input.lines.is_empty() {
            return Err(DomainError::validation(
                "sales order must have at least one item",
            ));
        }

        for line in &input.lines {
            if self.products.find_by_id(&line.product_id)?.is_none() {
                return Err(DomainError::NotFound);
            }
        }

        let year = now.year();
        let sequence = self.sequences.next(OrderPrefix::Sales, year)?;
        let number = OrderNumber::new(OrderPrefix::Sales, year, sequence);

        let order = SalesOrder::create(
            SalesOrderId::new(),
            number,
            input.customer_name,
            input.customer_email,
            input.lines,
            now,
        )?;
        self.orders.save(order.clone(), ExpectedVersion::Exact(0))?;
        info!(order_id = %order.id_typed(), number = %order.number(), "sales order created");

        Ok(order)
    }

    /// Confirm the order: one OUT movement per line, all-or-nothing.
    pub fn confirm(
        &self,
        order_id: SalesOrderId,
        now: DateTime<Utc>,
    ) -> DomainResult<SalesOrder> {
        self.confirm_with_deadline(order_id, now, None)
    }

    /// Deadline-aware confirmation. An expired deadline aborts before the
    /// commit point and leaves the order and the ledger untouched.
    pub fn confirm_with_deadline(
        &self,
        order_id: SalesOrderId,
        now: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> DomainResult<SalesOrder> {
        let mut order = self
            .orders
            .find_by_id(&order_id)?
            .ok_or(DomainError::NotFound)?;
        order.ensure_confirmable()?;
        check_deadline(deadline)?;

        let requests: Vec<AdjustmentRequest> = order
            .lines()
            .iter()
            .map(|line| {
                AdjustmentRequest::new(
                    line.product_id,
                    MovementDirection::Out,
                    line.quantity,
                    Some(order.number().to_string()),
                )
            })
            .collect();

        let plans = self.ledger.plan_batch(&requests, now)?;
        check_deadline(deadline)?;

        let expected = ExpectedVersion::Exact(order.version());
        order.mark_confirmed(now)?;
        self.orders.commit_transition(order.clone(), expected, plans)?;
        info!(
            order_id = %order.id_typed(),
            number = %order.number(),
            lines = order.lines().len(),
            "sales order confirmed"
        );

        self.publish(NotificationEvent::SalesOrderConfirmed(
            self.notice_for(&order),
        ));

        Ok(order)
    }

    /// Transition `Confirmed` -> `Shipped`.
    pub fn ship(&self, order_id: SalesOrderId) -> DomainResult<SalesOrder> {
        let mut order = self
            .orders
            .find_by_id(&order_id)?
            .ok_or(DomainError::NotFound)?;
        let expected = ExpectedVersion::Exact(order.version());
        order.mark_shipped()?;
        self.orders.save(order.clone(), expected)?;
        Ok(order)
    }

    /// Transition `Shipped` -> `Completed`.
    pub fn complete(&self, order_id: SalesOrderId) -> DomainResult<SalesOrder> {
        let mut order = self
            .orders
            .find_by_id(&order_id)?
            .ok_or(DomainError::NotFound)?;
        let expected = ExpectedVersion::Exact(order.version());
        order.mark_completed()?;
        self.orders.save(order.clone(), expected)?;
        Ok(order)
    }

    /// Cancel the order.
    ///
    /// A `New` order is simply marked cancelled. A `Confirmed` order also
    /// gets its OUT movements reversed with compensating IN movements, so
    /// the ledger keeps explaining the product quantities instead of
    /// implying stock was consumed for a dead order. Terminal states are
    /// rejected.
    pub fn cancel(&self, order_id: SalesOrderId, now: DateTime<Utc>) -> DomainResult<SalesOrder> {
        let mut order = self
            .orders
            .find_by_id(&order_id)?
            .ok_or(DomainError::NotFound)?;

        let plans = match order.status() {
            SalesOrderStatus::New => Vec::new(),
            SalesOrderStatus::Confirmed => {
                let requests: Vec<AdjustmentRequest> = order
                    .lines()
                    .iter()
                    .map(|line| {
                        AdjustmentRequest::new(
                            line.product_id,
                            MovementDirection::In,
                            line.quantity,
                            Some(format!("{} cancelled", order.number())),
                        )
                    })
                    .collect();
                self.ledger.plan_batch(&requests, now)?
            }
            other => {
                return Err(DomainError::invalid_state(format!(
                    "cannot cancel sales order in state {other}"
                )));
            }
        };

        let expected = ExpectedVersion::Exact(order.version());
        order.mark_cancelled()?;
        self.orders.commit_transition(order.clone(), expected, plans)?;
        info!(order_id = %order.id_typed(), number = %order.number(), "sales order cancelled");

        self.publish(NotificationEvent::SalesOrderCancelled(
            self.notice_for(&order),
        ));

        Ok(order)
    }

    pub fn get(&self, order_id: SalesOrderId) -> DomainResult<SalesOrder> {
        self.orders
            .find_by_id(&order_id)?
            .ok_or(DomainError::NotFound)
    }

    pub fn list(&self) -> DomainResult<Vec<SalesOrder>> {
        self.orders.list()
    }

    /// Picking document data for the rendering collaborator. Pure read.
    pub fn picking_slip(&self, order_id: SalesOrderId) -> DomainResult<PickingSlip> {
        let order = self
            .orders
            .find_by_id(&order_id)?
            .ok_or(DomainError::NotFound)?;
        Ok(PickingSlip::for_order(&order, |id| {
            self.products.find_by_id(id).ok().flatten()
        }))
    }

    fn notice_for(&self, order: &SalesOrder) -> SalesOrderNotice {
        let lines = order
            .lines()
            .iter()
            .map(|line| NoticeLine {
                product_name: self
                    .products
                    .find_by_id(&line.product_id)
                    .ok()
                    .flatten()
                    .map(|p| p.name().to_string())
                    .unwrap_or_else(|| "-".to_string()),
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();

        SalesOrderNotice {
            order_number: order.number().to_string(),
            customer_name: order.customer_name().to_string(),
            customer_email: order.customer_email().map(str::to_string),
            status: order.status().to_string(),
            created_at: order.created_at(),
            confirmed_at: order.confirmed_at(),
            lines,
        }
    }

    fn publish(&self, event: NotificationEvent) {
        // Post-commit, best-effort: delivery problems never reach the caller.
        if let Err(e) = self.bus.publish(event) {
            warn!("failed to publish sales order notification: {e:?}");
        }
    }
}

fn check_deadline(deadline: Option<Instant>) -> DomainResult<()> {
    match deadline {
        Some(d) if Instant::now() >= d => Err(DomainError::Timeout),
        _ => Ok(()),
    }
}
