//! In-memory transactional warehouse store.
//!
//! One `RwLock`ed state struct backs every persistence seam, so a combined
//! commit (order transition + ledger adjustments) holds the write lock once
//! and is all-or-nothing by construction. Intended for tests and embedding;
//! not optimized for large catalogs.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use tracing::debug;

use wareflow_core::{
    DomainError, DomainResult, ExpectedVersion, OrderPrefix, ProductId, PurchaseOrderId,
    SalesOrderId, SequenceProvider, Versioned,
};
use wareflow_ledger::{LedgerStore, StockAdjustment, StockMovement};
use wareflow_products::{Product, ProductStore};
use wareflow_purchasing::{PurchaseOrder, PurchaseOrderStore};
use wareflow_sales::{SalesOrder, SalesOrderStore};

#[derive(Debug, Default)]
struct WarehouseState {
    products: HashMap<ProductId, Product>,
    movements: Vec<StockMovement>,
    purchase_orders: HashMap<PurchaseOrderId, PurchaseOrder>,
    sales_orders: HashMap<SalesOrderId, SalesOrder>,
    sequences: HashMap<(OrderPrefix, i32), u32>,
}

/// In-memory warehouse store.
#[derive(Debug, Default)]
pub struct InMemoryWarehouse {
    state: RwLock<WarehouseState>,
}

impl InMemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, WarehouseState>> {
        self.state
            .read()
            .map_err(|_| DomainError::conflict("store lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, WarehouseState>> {
        self.state
            .write()
            .map_err(|_| DomainError::conflict("store lock poisoned"))
    }
}

/// Apply a batch of ledger adjustments against a staged copy; the caller's
/// state is replaced only when every version check passes.
fn apply_adjustments(
    state: &mut WarehouseState,
    adjustments: Vec<StockAdjustment>,
) -> DomainResult<()> {
    let mut staged = state.products.clone();
    let mut appended = Vec::with_capacity(adjustments.len());

    for adjustment in adjustments {
        let (product, expected, movement) = adjustment.into_parts();
        let current = staged
            .get(&product.id_typed())
            .map(|p| p.version())
            .unwrap_or(0);
        expected.check(current)?;
        staged.insert(product.id_typed(), product);
        appended.push(movement);
    }

    debug!(movements = appended.len(), "ledger batch committed");
    state.products = staged;
    state.movements.extend(appended);
    Ok(())
}

fn check_version<T: Versioned>(
    map: &HashMap<T::Id, T>,
    id: &T::Id,
    expected: ExpectedVersion,
) -> DomainResult<()> {
    let current = map.get(id).map(|v| v.version()).unwrap_or(0);
    expected.check(current)
}

impl ProductStore for InMemoryWarehouse {
    fn find_by_id(&self, id: &ProductId) -> DomainResult<Option<Product>> {
        Ok(self.read()?.products.get(id).cloned())
    }

    fn exists_by_sku(&self, sku: &str) -> DomainResult<bool> {
        Ok(self.read()?.products.values().any(|p| p.sku() == sku))
    }

    fn save(&self, product: Product, expected: ExpectedVersion) -> DomainResult<()> {
        let mut state = self.write()?;
        check_version(&state.products, &product.id_typed(), expected)?;

        // SKU uniqueness is a storage invariant, not just a catalog check.
        let duplicate = state
            .products
            .values()
            .any(|p| p.sku() == product.sku() && p.id_typed() != product.id_typed());
        if duplicate {
            return Err(DomainError::conflict(format!(
                "SKU already exists: {}",
                product.sku()
            )));
        }

        state.products.insert(product.id_typed(), product);
        Ok(())
    }

    fn delete(&self, id: &ProductId) -> DomainResult<()> {
        self.write()?
            .products
            .remove(id)
            .map(|_| ())
            .ok_or(DomainError::NotFound)
    }

    fn find_near_expiry(&self, from: NaiveDate, to: NaiveDate) -> DomainResult<Vec<Product>> {
        Ok(self
            .read()?
            .products
            .values()
            .filter(|p| p.expires_within(from, to))
            .cloned()
            .collect())
    }

    fn list(&self) -> DomainResult<Vec<Product>> {
        Ok(self.read()?.products.values().cloned().collect())
    }
}

impl LedgerStore for InMemoryWarehouse {
    fn product(&self, id: &ProductId) -> DomainResult<Option<Product>> {
        Ok(self.read()?.products.get(id).cloned())
    }

    fn commit(&self, batch: Vec<StockAdjustment>) -> DomainResult<()> {
        let mut state = self.write()?;
        apply_adjustments(&mut state, batch)
    }

    fn movements(&self) -> DomainResult<Vec<StockMovement>> {
        Ok(self.read()?.movements.clone())
    }

    fn movements_for_product(&self, id: &ProductId) -> DomainResult<Vec<StockMovement>> {
        let state = self.read()?;
        let mut hits: Vec<(usize, StockMovement)> = state
            .movements
            .iter()
            .enumerate()
            .filter(|(_, m)| m.product_id() == *id)
            .map(|(i, m)| (i, m.clone()))
            .collect();
        // Most recent first; append position breaks timestamp ties.
        hits.sort_by_key(|(i, m)| std::cmp::Reverse((m.created_at(), *i)));
        Ok(hits.into_iter().map(|(_, m)| m).collect())
    }
}

impl PurchaseOrderStore for InMemoryWarehouse {
    fn find_by_id(&self, id: &PurchaseOrderId) -> DomainResult<Option<PurchaseOrder>> {
        Ok(self.read()?.purchase_orders.get(id).cloned())
    }

    fn save(&self, order: PurchaseOrder, expected: ExpectedVersion) -> DomainResult<()> {
        let mut state = self.write()?;
        check_version(&state.purchase_orders, &order.id_typed(), expected)?;
        ensure_unique_po_number(&state, &order)?;
        state.purchase_orders.insert(order.id_typed(), order);
        Ok(())
    }

    fn list(&self) -> DomainResult<Vec<PurchaseOrder>> {
        Ok(self.read()?.purchase_orders.values().cloned().collect())
    }

    fn commit_receipt(
        &self,
        order: PurchaseOrder,
        expected: ExpectedVersion,
        adjustments: Vec<StockAdjustment>,
    ) -> DomainResult<()> {
        let mut state = self.write()?;
        check_version(&state.purchase_orders, &order.id_typed(), expected)?;
        apply_adjustments(&mut state, adjustments)?;
        state.purchase_orders.insert(order.id_typed(), order);
        Ok(())
    }
}

impl SalesOrderStore for InMemoryWarehouse {
    fn find_by_id(&self, id: &SalesOrderId) -> DomainResult<Option<SalesOrder>> {
        Ok(self.read()?.sales_orders.get(id).cloned())
    }

    fn save(&self, order: SalesOrder, expected: ExpectedVersion) -> DomainResult<()> {
        let mut state = self.write()?;
        check_version(&state.sales_orders, &order.id_typed(), expected)?;
        ensure_unique_so_number(&state, &order)?;
        state.sales_orders.insert(order.id_typed(), order);
        Ok(())
    }

    fn list(&self) -> DomainResult<Vec<SalesOrder>> {
        Ok(self.read()?.sales_orders.values().cloned().collect())
    }

    fn commit_transition(
        &self,
        order: SalesOrder,
        expected: ExpectedVersion,
        adjustments: Vec<StockAdjustment>,
    ) -> DomainResult<()> {
        let mut state = self.write()?;
        check_version(&state.sales_orders, &order.id_typed(), expected)?;
        apply_adjustments(&mut state, adjustments)?;
        state.sales_orders.insert(order.id_typed(), order);
        Ok(())
    }
}

impl SequenceProvider for InMemoryWarehouse {
    fn next(&self, prefix: OrderPrefix, year: i32) -> DomainResult<u32> {
        let mut state = self.write()?;
        let counter = state.sequences.entry((prefix, year)).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}

fn ensure_unique_po_number(state: &WarehouseState, order: &PurchaseOrder) -> DomainResult<()> {
    let duplicate = state
        .purchase_orders
        .values()
        .any(|o| o.number() == order.number() && o.id_typed() != order.id_typed());
    if duplicate {
        return Err(DomainError::conflict(format!(
            "order number already exists: {}",
            order.number()
        )));
    }
    Ok(())
}

fn ensure_unique_so_number(state: &WarehouseState, order: &SalesOrder) -> DomainResult<()> {
    let duplicate = state
        .sales_orders
        .values()
        .any(|o| o.number() == order.number() && o.id_typed() != order.id_typed());
    if duplicate {
        return Err(DomainError::conflict(format!(
            "order number already exists: {}",
            order.number()
        )));
    }
    Ok(())
}
