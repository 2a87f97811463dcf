//! Notification payloads emitted by the order workflows after commit.
//!
//! The event carries everything delivery needs (names already resolved,
//! prices snapshotted), so the worker never reaches back into the stores.

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One rendered order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeLine {
    pub product_name: String,
    pub quantity: u32,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

/// Payload for a freshly created purchase order (vendor-facing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderNotice {
    pub order_number: String,
    pub vendor_name: String,
    pub vendor_email: Option<String>,
    pub expected_date: NaiveDate,
    pub status: String,
    pub lines: Vec<NoticeLine>,
}

/// Payload for a confirmed or cancelled sales order (customer-facing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrderNotice {
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub lines: Vec<NoticeLine>,
}

/// Post-commit notification event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationEvent {
    PurchaseOrderCreated(PurchaseOrderNotice),
    SalesOrderConfirmed(SalesOrderNotice),
    SalesOrderCancelled(SalesOrderNotice),
}

impl NotificationEvent {
    /// Preferred recipient, if the order carried one.
    pub fn recipient(&self) -> Option<&str> {
        match self {
            NotificationEvent::PurchaseOrderCreated(n) => n.vendor_email.as_deref(),
            NotificationEvent::SalesOrderConfirmed(n)
            | NotificationEvent::SalesOrderCancelled(n) => n.customer_email.as_deref(),
        }
    }

    pub fn subject(&self) -> String {
        match self {
            NotificationEvent::PurchaseOrderCreated(n) => {
                format!("New Purchase Order {}", n.order_number)
            }
            NotificationEvent::SalesOrderConfirmed(n) => {
                format!("Sales Order Confirmed: {}", n.order_number)
            }
            NotificationEvent::SalesOrderCancelled(n) => {
                format!("Sales Order Cancelled: {}", n.order_number)
            }
        }
    }

    /// Plain-text body.
    pub fn body(&self) -> String {
        match self {
            NotificationEvent::PurchaseOrderCreated(n) => {
                let mut body = String::new();
                let _ = writeln!(body, "Hello {},", n.vendor_name);
                let _ = writeln!(body);
                let _ = writeln!(body, "A new purchase order has been created.");
                let _ = writeln!(body);
                let _ = writeln!(body, "PO Number: {}", n.order_number);
                let _ = writeln!(body, "Vendor: {}", n.vendor_name);
                let _ = writeln!(body, "Expected Date: {}", n.expected_date);
                let _ = writeln!(body, "Status: {}", n.status);
                append_lines(&mut body, &n.lines);
                let _ = write!(body, "\nRegards,\nWarehouse Purchasing Team");
                body
            }
            NotificationEvent::SalesOrderConfirmed(n) => {
                sales_body(n, "Your sales order has been confirmed.", "Sales")
            }
            NotificationEvent::SalesOrderCancelled(n) => {
                sales_body(n, "Your sales order has been cancelled.", "Sales")
            }
        }
    }
}

fn sales_body(n: &SalesOrderNotice, headline: &str, team: &str) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "Hello {},", n.customer_name);
    let _ = writeln!(body);
    let _ = writeln!(body, "{headline}");
    let _ = writeln!(body);
    let _ = writeln!(body, "SO Number: {}", n.order_number);
    let _ = writeln!(body, "Status: {}", n.status);
    let _ = writeln!(body, "Created At: {}", n.created_at);
    if let Some(at) = n.confirmed_at {
        let _ = writeln!(body, "Confirmed At: {at}");
    }
    append_lines(&mut body, &n.lines);
    let _ = write!(body, "\nRegards,\nWarehouse {team} Team");
    body
}

fn append_lines(body: &mut String, lines: &[NoticeLine]) {
    let _ = writeln!(body);
    let _ = writeln!(body, "Items:");
    for line in lines {
        let _ = writeln!(
            body,
            " - {} x {} @ ${}.{:02}",
            line.product_name,
            line.quantity,
            line.unit_price / 100,
            line.unit_price % 100
        );
    }
}
