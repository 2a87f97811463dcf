//! `wareflow-products` — product catalog: entity, persistence seam,
//! administrative operations and the near-expiry query.

pub mod catalog;
pub mod product;
pub mod store;

pub use catalog::ProductCatalog;
pub use product::{Product, ProductDraft};
pub use store::ProductStore;
