//! Catalog persistence seam.

use std::sync::Arc;

use chrono::NaiveDate;

use wareflow_core::{DomainResult, ExpectedVersion, ProductId};

use crate::product::Product;

/// Product lookup/persistence boundary.
///
/// The catalog and the workflows depend on this contract but do not define
/// its backing storage. `save` is an upsert guarded by an optimistic version
/// check: a missing row counts as version 0.
pub trait ProductStore: Send + Sync {
    fn find_by_id(&self, id: &ProductId) -> DomainResult<Option<Product>>;

    fn exists_by_sku(&self, sku: &str) -> DomainResult<bool>;

    fn save(&self, product: Product, expected: ExpectedVersion) -> DomainResult<()>;

    /// Remove a product. Fails with `NotFound` if the id is unknown.
    fn delete(&self, id: &ProductId) -> DomainResult<()>;

    /// Perishable products with an expiry date in `[from, to]` inclusive.
    fn find_near_expiry(&self, from: NaiveDate, to: NaiveDate) -> DomainResult<Vec<Product>>;

    fn list(&self) -> DomainResult<Vec<Product>>;
}

impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    fn find_by_id(&self, id: &ProductId) -> DomainResult<Option<Product>> {
        (**self).find_by_id(id)
    }

    fn exists_by_sku(&self, sku: &str) -> DomainResult<bool> {
        (**self).exists_by_sku(sku)
    }

    fn save(&self, product: Product, expected: ExpectedVersion) -> DomainResult<()> {
        (**self).save(product, expected)
    }

    fn delete(&self, id: &ProductId) -> DomainResult<()> {
        (**self).delete(id)
    }

    fn find_near_expiry(&self, from: NaiveDate, to: NaiveDate) -> DomainResult<Vec<Product>> {
        (**self).find_near_expiry(from, to)
    }

    fn list(&self) -> DomainResult<Vec<Product>> {
        (**self).list()
    }
}
