//! Administrative catalog operations + the near-expiry query.

use chrono::{Duration, NaiveDate, Utc};
use tracing::info;

use wareflow_core::{DomainError, DomainResult, ExpectedVersion, ProductId, Versioned};

use crate::product::{Product, ProductDraft};
use crate::store::ProductStore;

/// Window applied when the caller passes a non-positive horizon.
const DEFAULT_NEAR_EXPIRY_DAYS: i64 = 7;

/// Catalog service: product CRUD and read-only expiry queries.
///
/// SKU uniqueness is enforced here, at create and at update, before any
/// store write.
#[derive(Debug)]
pub struct ProductCatalog<S> {
    store: S,
}

impl<S> ProductCatalog<S>
where
    S: ProductStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn create(&self, draft: ProductDraft) -> DomainResult<Product> {
        if self.store.exists_by_sku(draft.sku.trim())? {
            return Err(DomainError::conflict(format!(
                "SKU already exists: {}",
                draft.sku
            )));
        }

        let product = Product::create(ProductId::new(), draft)?;
        self.store.save(product.clone(), ExpectedVersion::Exact(0))?;
        info!(product_id = %product.id_typed(), sku = product.sku(), "product created");
        Ok(product)
    }

    pub fn update(&self, id: ProductId, draft: ProductDraft) -> DomainResult<Product> {
        let mut product = self.get(id)?;

        if product.sku() != draft.sku && self.store.exists_by_sku(draft.sku.trim())? {
            return Err(DomainError::conflict(format!(
                "SKU already exists: {}",
                draft.sku
            )));
        }

        let expected = ExpectedVersion::Exact(product.version());
        product.apply_update(draft)?;
        self.store.save(product.clone(), expected)?;
        Ok(product)
    }

    pub fn delete(&self, id: ProductId) -> DomainResult<()> {
        self.store.delete(&id)
    }

    pub fn get(&self, id: ProductId) -> DomainResult<Product> {
        self.store.find_by_id(&id)?.ok_or(DomainError::NotFound)
    }

    pub fn list(&self) -> DomainResult<Vec<Product>> {
        self.store.list()
    }

    /// Perishable products expiring within `days` of today, inclusive.
    ///
    /// Non-positive horizons fall back to the 7-day default.
    pub fn near_expiry(&self, days: i64) -> DomainResult<Vec<Product>> {
        self.near_expiry_on(days, Utc::now().date_naive())
    }

    /// Deterministic variant of [`Self::near_expiry`] with an injected "today".
    pub fn near_expiry_on(&self, days: i64, today: NaiveDate) -> DomainResult<Vec<Product>> {
        let days = if days <= 0 {
            DEFAULT_NEAR_EXPIRY_DAYS
        } else {
            days
        };
        let until = today + Duration::days(days);
        self.store.find_near_expiry(today, until)
    }
}
