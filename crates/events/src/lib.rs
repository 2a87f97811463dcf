//! `wareflow-events` — post-commit notification side channel: pub/sub bus,
//! notification payloads, and the best-effort delivery worker.

pub mod bus;
pub mod in_memory_bus;
pub mod notification;
pub mod worker;

pub use bus::{EventBus, Subscription};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use notification::{
    NoticeLine, NotificationEvent, PurchaseOrderNotice, SalesOrderNotice,
};
pub use worker::{
    LogNotifier, NotificationWorker, NotificationWorkerHandle, Notifier, NotifyError,
    RecordingNotifier,
};
