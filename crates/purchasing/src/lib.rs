//! `wareflow-purchasing` — incoming orders: the purchase order state
//! machine and the workflow that drives IN movements through the stock
//! ledger on receipt.

pub mod order;
pub mod service;
pub mod store;

pub use order::{PurchaseOrder, PurchaseOrderLine, PurchaseOrderStatus};
pub use service::{NewPurchaseOrder, PurchaseOrders};
pub use store::PurchaseOrderStore;
