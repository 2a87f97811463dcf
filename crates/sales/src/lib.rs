//! `wareflow-sales` — outgoing orders: the sales order state machine, the
//! workflow that drives OUT movements through the stock ledger on
//! confirmation, and picking document data.

pub mod order;
pub mod picking;
pub mod service;
pub mod store;

pub use order::{SalesOrder, SalesOrderLine, SalesOrderStatus};
pub use picking::{PickingRow, PickingSlip};
pub use service::{NewSalesOrder, SalesOrders};
pub use store::SalesOrderStore;
