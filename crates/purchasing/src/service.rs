//! Purchase order workflow: create drafts, receive stock.

use std::time::Instant;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::{info, warn};

use wareflow_core::{
    DomainError, DomainResult, ExpectedVersion, OrderNumber, OrderPrefix, PurchaseOrderId,
    SequenceProvider, Versioned,
};
use wareflow_events::{EventBus, NoticeLine, NotificationEvent, PurchaseOrderNotice};
use wareflow_ledger::{AdjustmentRequest, LedgerStore, MovementDirection, StockLedger};
use wareflow_products::ProductStore;

use crate::order::{PurchaseOrder, PurchaseOrderLine};
use crate::store::PurchaseOrderStore;

/// Caller input for a new purchase order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPurchaseOrder {
    pub vendor_name: String,
    pub vendor_email: Option<String>,
    pub expected_date: NaiveDate,
    pub lines: Vec<PurchaseOrderLine>,
}

/// Purchase order workflow service.
///
/// Receipt follows plan-then-commit: every line's IN adjustment is planned
/// first (pure), then the status transition and the whole batch commit
/// through the store as one unit.
#[derive(Debug)]
pub struct PurchaseOrders<S, P, L, Q, B> {
    orders: S,
    products: P,
    ledger: StockLedger<L>,
    sequences: Q,
    bus: B,
}

impl<S, P, L, Q, B> PurchaseOrders<S, P, L, Q, B>
where
    S: PurchaseOrderStore,
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

    /// Create a draft order and announce it to the vendor.
    pub fn create(
        &self,
        input: NewPurchaseOrder,
        now: DateTime<Utc>,
    ) -> DomainResult<PurchaseOrder> {
        if input.lines.is_empty() {
            return Err(DomainError::validation(
                "purchase order must have at least one item",
            ));
        }

        // Resolve every referenced product up front; names feed the notice.
        let mut notice_lines = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let product = self
                .products
                .find_by_id(&line.product_id)?
                .ok_or(DomainError::NotFound)?;
            notice_lines.push(NoticeLine {
                product_name: product.name().to_string(),
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
        }

        let year = now.year();
        let sequence = self.sequences.next(OrderPrefix::Purchase, year)?;
        let number = OrderNumber::new(OrderPrefix::Purchase, year, sequence);

        let order = PurchaseOrder::create(
            PurchaseOrderId::new(),
            number,
            input.vendor_name,
            input.vendor_email,
            input.expected_date,
            input.lines,
            now,
        )?;
        self.orders.save(order.clone(), ExpectedVersion::Exact(0))?;
        info!(order_id = %order.id_typed(), number = %order.number(), "purchase order created");

        self.publish(NotificationEvent::PurchaseOrderCreated(PurchaseOrderNotice {
            order_number: order.number().to_string(),
            vendor_name: order.vendor_name().to_string(),
            vendor_email: order.vendor_email().map(str::to_string),
            expected_date: order.expected_date(),
            status: "DRAFT".to_string(),
            lines: notice_lines,
        }));

        Ok(order)
    }

    /// Receive the order: one IN movement per line, then `Received`.
    pub fn receive(
        &self,
        order_id: PurchaseOrderId,
        now: DateTime<Utc>,
    ) -> DomainResult<PurchaseOrder> {
        self.receive_with_deadline(order_id, now, None)
    }

    /// Deadline-aware receipt. An expired deadline aborts before the commit
    /// point and leaves the order and the ledger in their pre-call state.
    pub fn receive_with_deadline(
        &self,
        order_id: PurchaseOrderId,
        now: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> DomainResult<PurchaseOrder> {
        let mut order = self
            .orders
            .find_by_id(&order_id)?
            .ok_or(DomainError::NotFound)?;
        order.ensure_receivable()?;
        check_deadline(deadline)?;

        let requests: Vec<AdjustmentRequest> = order
            .lines()
            .iter()
            .map(|line| {
                AdjustmentRequest::new(
                    line.product_id,
                    MovementDirection::In,
                    line.quantity,
                    Some(order.number().to_string()),
                )
            })
            .collect();

        let plans = self.ledger.plan_batch(&requests, now)?;
        check_deadline(deadline)?;

        let expected = ExpectedVersion::Exact(order.version());
        order.mark_received(now)?;
        self.orders.commit_receipt(order.clone(), expected, plans)?;
        info!(
            order_id = %order.id_typed(),
            number = %order.number(),
            lines = order.lines().len(),
            "purchase order received"
        );

        Ok(order)
    }

    pub fn get(&self, order_id: PurchaseOrderId) -> DomainResult<PurchaseOrder> {
        self.orders
            .find_by_id(&order_id)?
            .ok_or(DomainError::NotFound)
    }

    pub fn list(&self) -> DomainResult<Vec<PurchaseOrder>> {
        self.orders.list()
    }

    fn publish(&self, event: NotificationEvent) {
        // Post-commit, best-effort: delivery problems never reach the caller.
        if let Err(e) = self.bus.publish(event) {
            warn!("failed to publish purchase order notification: {e:?}");
        }
    }
}

fn check_deadline(deadline: Option<Instant>) -> DomainResult<()> {
    match deadline {
        Some(d) if Instant::now() >= d => Err(DomainError::Timeout),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::{Arc, RwLock};
    use std::time::Duration;

    use wareflow_core::ProductId;
    use wareflow_events::InMemoryEventBus;
    use wareflow_ledger::{StockAdjustment, StockMovement};
    use wareflow_products::{Product, ProductDraft};

    use crate::order::PurchaseOrderStatus;

    /// Map-backed backend implementing every seam the workflow needs.
    #[derive(Default)]
    struct TestBackend {
        state: RwLock<State>,
    }

    #[derive(Default)]
    struct State {
        products: HashMap<ProductId, Product>,
        movements: Vec<StockMovement>,
        orders: HashMap<PurchaseOrderId, PurchaseOrder>,
        sequences: HashMap<(OrderPrefix, i32), u32>,
    }

    impl TestBackend {
        fn seed_product(&self, stock: u32) -> ProductId {
            let product = Product::create(
                ProductId::new(),
                ProductDraft {
                    name: "Pallet Jack".to_string(),
                    sku: format!("PJ-{}", self.state.read().unwrap().products.len()),
                    stock_quantity: stock,
                    unit_price: 120_00,
                    location_code: None,
                    perishable: false,
                    expiry_date: None,
                },
            )
            .unwrap();
            let id = product.id_typed();
            self.state.write().unwrap().products.insert(id, product);
            id
        }

        fn product(&self, id: &ProductId) -> Product {
            self.state.read().unwrap().products[id].clone()
        }

        fn movements(&self) -> Vec<StockMovement> {
            self.state.read().unwrap().movements.clone()
        }

        fn apply_adjustments(
            state: &mut State,
            adjustments: Vec<StockAdjustment>,
        ) -> DomainResult<()> {
            let mut products = state.products.clone();
            let mut appended = Vec::with_capacity(adjustments.len());
            for adjustment in adjustments {
                let (product, expected, movement) = adjustment.into_parts();
                let current = products
                    .get(&product.id_typed())
                    .map(|p| p.version())
                    .unwrap_or(0);
                expected.check(current)?;
                products.insert(product.id_typed(), product);
                appended.push(movement);
            }
            state.products = products;
            state.movements.extend(appended);
            Ok(())
        }
    }

    impl ProductStore for TestBackend {
        fn find_by_id(&self, id: &ProductId) -> DomainResult<Option<Product>> {
            Ok(self.state.read().unwrap().products.get(id).cloned())
        }

        fn exists_by_sku(&self, sku: &str) -> DomainResult<bool> {
            Ok(self
                .state
                .read()
                .unwrap()
                .products
                .values()
                .any(|p| p.sku() == sku))
        }

        fn save(&self, product: Product, expected: ExpectedVersion) -> DomainResult<()> {
            let mut state = self.state.write().unwrap();
            let current = state
                .products
                .get(&product.id_typed())
                .map(|p| p.version())
                .unwrap_or(0);
            expected.check(current)?;
            state.products.insert(product.id_typed(), product);
            Ok(())
        }

        fn delete(&self, id: &ProductId) -> DomainResult<()> {
            self.state
                .write()
                .unwrap()
                .products
                .remove(id)
                .map(|_| ())
                .ok_or(DomainError::NotFound)
        }

        fn find_near_expiry(
            &self,
            from: chrono::NaiveDate,
            to: chrono::NaiveDate,
        ) -> DomainResult<Vec<Product>> {
            Ok(self
                .state
                .read()
                .unwrap()
                .products
                .values()
                .filter(|p| p.expires_within(from, to))
                .cloned()
                .collect())
        }

        fn list(&self) -> DomainResult<Vec<Product>> {
            Ok(self.state.read().unwrap().products.values().cloned().collect())
        }
    }

    impl LedgerStore for TestBackend {
        fn product(&self, id: &ProductId) -> DomainResult<Option<Product>> {
            Ok(self.state.read().unwrap().products.get(id).cloned())
        }

        fn commit(&self, batch: Vec<StockAdjustment>) -> DomainResult<()> {
            let mut state = self.state.write().unwrap();
            Self::apply_adjustments(&mut state, batch)
        }

        fn movements(&self) -> DomainResult<Vec<StockMovement>> {
            Ok(self.state.read().unwrap().movements.clone())
        }

        fn movements_for_product(&self, id: &ProductId) -> DomainResult<Vec<StockMovement>> {
            let mut hits: Vec<StockMovement> = self
                .state
                .read()
                .unwrap()
                .movements
                .iter()
                .filter(|m| m.product_id() == *id)
                .cloned()
                .collect();
            hits.sort_by_key(|m| std::cmp::Reverse(m.created_at()));
            Ok(hits)
        }
    }

    impl PurchaseOrderStore for TestBackend {
        fn find_by_id(&self, id: &PurchaseOrderId) -> DomainResult<Option<PurchaseOrder>> {
            Ok(self.state.read().unwrap().orders.get(id).cloned())
        }

        fn save(&self, order: PurchaseOrder, expected: ExpectedVersion) -> DomainResult<()> {
            let mut state = self.state.write().unwrap();
            let current = state
                .orders
                .get(&order.id_typed())
                .map(|o| o.version())
                .unwrap_or(0);
            expected.check(current)?;
            state.orders.insert(order.id_typed(), order);
            Ok(())
        }

        fn list(&self) -> DomainResult<Vec<PurchaseOrder>> {
            Ok(self.state.read().unwrap().orders.values().cloned().collect())
        }

        fn commit_receipt(
            &self,
            order: PurchaseOrder,
            expected: ExpectedVersion,
            adjustments: Vec<StockAdjustment>,
        ) -> DomainResult<()> {
            let mut state = self.state.write().unwrap();
            let current = state
                .orders
                .get(&order.id_typed())
                .map(|o| o.version())
                .unwrap_or(0);
            expected.check(current)?;
            Self::apply_adjustments(&mut state, adjustments)?;
            state.orders.insert(order.id_typed(), order);
            Ok(())
        }
    }

    impl SequenceProvider for TestBackend {
        fn next(&self, prefix: OrderPrefix, year: i32) -> DomainResult<u32> {
            let mut state = self.state.write().unwrap();
            let counter = state.sequences.entry((prefix, year)).or_insert(0);
            *counter += 1;
            Ok(*counter)
        }
    }

    type Service = PurchaseOrders<
        Arc<TestBackend>,
        Arc<TestBackend>,
        Arc<TestBackend>,
        Arc<TestBackend>,
        Arc<InMemoryEventBus<NotificationEvent>>,
    >;

    fn service() -> (Service, Arc<TestBackend>, Arc<InMemoryEventBus<NotificationEvent>>) {
        let backend = Arc::new(TestBackend::default());
        let bus = Arc::new(InMemoryEventBus::new());
        let svc = PurchaseOrders::new(
            backend.clone(),
            backend.clone(),
            StockLedger::new(backend.clone()),
            backend.clone(),
            bus.clone(),
        );
        (svc, backend, bus)
    }

    fn input(lines: Vec<PurchaseOrderLine>) -> NewPurchaseOrder {
        NewPurchaseOrder {
            vendor_name: "Acme Supplies".to_string(),
            vendor_email: Some("orders@acme.test".to_string()),
            expected_date: "2025-07-01".parse().unwrap(),
            lines,
        }
    }

    fn line(product_id: ProductId, quantity: u32) -> PurchaseOrderLine {
        PurchaseOrderLine {
            product_id,
            quantity,
            unit_price: 10_00,
        }
    }

    #[test]
    fn create_rejects_empty_orders() {
        let (svc, _, _) = service();
        let err = svc.create(input(vec![]), Utc::now()).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn create_fails_when_a_product_is_missing() {
        let (svc, _, _) = service();
        let err = svc
            .create(input(vec![line(ProductId::new(), 5)]), Utc::now())
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn create_allocates_sequential_numbers_and_notifies_the_vendor() {
        let (svc, backend, bus) = service();
        let sub = bus.subscribe();
        let product = backend.seed_product(0);
        let now = "2025-03-01T10:00:00Z".parse().unwrap();

        let first = svc.create(input(vec![line(product, 5)]), now).unwrap();
        let second = svc.create(input(vec![line(product, 2)]), now).unwrap();

        assert_eq!(first.number().to_string(), "PO-2025-0001");
        assert_eq!(second.number().to_string(), "PO-2025-0002");
        assert_eq!(first.status(), PurchaseOrderStatus::Draft);

        match sub.try_recv().unwrap() {
            NotificationEvent::PurchaseOrderCreated(notice) => {
                assert_eq!(notice.order_number, "PO-2025-0001");
                assert_eq!(notice.vendor_email.as_deref(), Some("orders@acme.test"));
                assert_eq!(notice.lines.len(), 1);
                assert_eq!(notice.lines[0].product_name, "Pallet Jack");
            }
            other => panic!("expected PurchaseOrderCreated, got {other:?}"),
        }
    }

    #[test]
    fn creation_does_not_touch_stock() {
        let (svc, backend, _) = service();
        let product = backend.seed_product(3);
        svc.create(input(vec![line(product, 5)]), Utc::now()).unwrap();

        assert_eq!((*backend).product(&product).stock_quantity(), 3);
        assert!((*backend).movements().is_empty());
    }

    #[test]
    fn receive_applies_one_in_movement_per_line_in_order() {
        let (svc, backend, _) = service();
        let a = backend.seed_product(0);
        let b = backend.seed_product(1);
        let now = Utc::now();

        let order = svc
            .create(input(vec![line(a, 5), line(b, 2)]), now)
            .unwrap();
        let received = svc.receive(order.id_typed(), now).unwrap();

        assert_eq!(received.status(), PurchaseOrderStatus::Received);
        assert!(received.received_at().is_some());
        assert_eq!((*backend).product(&a).stock_quantity(), 5);
        assert_eq!((*backend).product(&b).stock_quantity(), 3);

        let movements = (*backend).movements();
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[0].product_id(), a);
        assert_eq!(movements[0].quantity(), 5);
        assert_eq!(movements[0].reason(), Some(order.number().to_string().as_str()));
        assert_eq!(movements[1].product_id(), b);
        assert_eq!(movements[1].quantity(), 2);
    }

    #[test]
    fn receive_is_rejected_for_unknown_orders() {
        let (svc, _, _) = service();
        let err = svc.receive(PurchaseOrderId::new(), Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn receiving_twice_fails_invalid_state_without_new_movements() {
        let (svc, backend, _) = service();
        let product = backend.seed_product(0);
        let order = svc
            .create(input(vec![line(product, 5)]), Utc::now())
            .unwrap();

        svc.receive(order.id_typed(), Utc::now()).unwrap();
        let err = svc.receive(order.id_typed(), Utc::now()).unwrap_err();

        match err {
            DomainError::InvalidState(_) => {}
            other => panic!("expected InvalidState, got {other:?}"),
        }
        assert_eq!((*backend).movements().len(), 1);
        assert_eq!((*backend).product(&product).stock_quantity(), 5);
    }

    #[test]
    fn expired_deadline_aborts_before_any_mutation() {
        let (svc, backend, _) = service();
        let product = backend.seed_product(0);
        let order = svc
            .create(input(vec![line(product, 5)]), Utc::now())
            .unwrap();

        let expired = Instant::now() - Duration::from_millis(1);
        let err = svc
            .receive_with_deadline(order.id_typed(), Utc::now(), Some(expired))
            .unwrap_err();

        assert_eq!(err, DomainError::Timeout);
        assert!((*backend).movements().is_empty());
        assert_eq!(
            svc.get(order.id_typed()).unwrap().status(),
            PurchaseOrderStatus::Draft
        );
    }

    #[test]
    fn two_lines_on_the_same_product_both_land() {
        let (svc, backend, _) = service();
        let product = backend.seed_product(0);
        let order = svc
            .create(input(vec![line(product, 5), line(product, 7)]), Utc::now())
            .unwrap();

        svc.receive(order.id_typed(), Utc::now()).unwrap();
        assert_eq!((*backend).product(&product).stock_quantity(), 12);
        assert_eq!((*backend).movements().len(), 2);
    }
}
