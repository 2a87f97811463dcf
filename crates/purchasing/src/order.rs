use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use wareflow_core::{
    DomainError, DomainResult, Entity, OrderNumber, ProductId, PurchaseOrderId, Versioned,
};

/// Purchase order lifecycle. `Received` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PurchaseOrderStatus {
    Draft,
    Received,
}

/// One ordered line: a product reference, a quantity, and the unit price
/// agreed with the vendor (snapshotted, not the catalog's current price).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

/// Incoming order: stock we expect from a vendor.
///
/// Lines are owned by the order and ordered; they never change after
/// creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    id: PurchaseOrderId,
    number: OrderNumber,
    vendor_name: String,
    vendor_email: Option<String>,
    status: PurchaseOrderStatus,
    expected_date: NaiveDate,
    created_at: DateTime<Utc>,
    received_at: Option<DateTime<Utc>>,
    lines: Vec<PurchaseOrderLine>,
    version: u64,
}

impl PurchaseOrder {
    pub fn create(
        id: PurchaseOrderId,
        number: OrderNumber,
        vendor_name: String,
        vendor_email: Option<String>,
        expected_date: NaiveDate,
        lines: Vec<PurchaseOrderLine>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if vendor_name.trim().is_empty() {
            return Err(DomainError::validation("vendor name cannot be empty"));
        }
        if lines.is_empty() {
            return Err(DomainError::validation(
                "purchase order must have at least one item",
            ));
        }
        if lines.iter().any(|l| l.quantity == 0) {
            return Err(DomainError::validation(
                "line quantity must be greater than zero",
            ));
        }

        Ok(Self {
            id,
            number,
            vendor_name,
            vendor_email,
            status: PurchaseOrderStatus::Draft,
            expected_date,
            created_at,
            received_at: None,
            lines,
            version: 1,
        })
    }

    pub fn id_typed(&self) -> PurchaseOrderId {
        self.id
    }

    pub fn number(&self) -> &OrderNumber {
        &self.number
    }

    pub fn vendor_name(&self) -> &str {
        &self.vendor_name
    }

    pub fn vendor_email(&self) -> Option<&str> {
        self.vendor_email.as_deref()
    }

    pub fn status(&self) -> PurchaseOrderStatus {
        self.status
    }

    pub fn expected_date(&self) -> NaiveDate {
        self.expected_date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.received_at
    }

    pub fn lines(&self) -> &[PurchaseOrderLine] {
        &self.lines
    }

    /// Check the receipt preconditions without transitioning.
    pub fn ensure_receivable(&self) -> DomainResult<()> {
        if self.status == PurchaseOrderStatus::Received {
            return Err(DomainError::invalid_state(
                "purchase order is already received",
            ));
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation("purchase order has no items"));
        }
        Ok(())
    }

    /// Transition `Draft` -> `Received`.
    pub fn mark_received(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_receivable()?;
        self.status = PurchaseOrderStatus::Received;
        self.received_at = Some(at);
        self.version += 1;
        Ok(())
    }
}

impl Entity for PurchaseOrder {
    type Id = PurchaseOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Versioned for PurchaseOrder {
    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wareflow_core::OrderPrefix;

    fn number() -> OrderNumber {
        OrderNumber::new(OrderPrefix::Purchase, 2025, 1)
    }

    fn line(quantity: u32) -> PurchaseOrderLine {
        PurchaseOrderLine {
            product_id: ProductId::new(),
            quantity,
            unit_price: 1000,
        }
    }

    fn order(lines: Vec<PurchaseOrderLine>) -> DomainResult<PurchaseOrder> {
        PurchaseOrder::create(
            PurchaseOrderId::new(),
            number(),
            "Acme Supplies".to_string(),
            Some("orders@acme.test".to_string()),
            "2025-07-01".parse().unwrap(),
            lines,
            Utc::now(),
        )
    }

    #[test]
    fn create_requires_at_least_one_line() {
        let err = order(vec![]).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("at least one item")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn create_rejects_zero_quantity_lines() {
        let err = order(vec![line(5), line(0)]).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn create_starts_in_draft_without_receipt_timestamp() {
        let po = order(vec![line(5)]).unwrap();
        assert_eq!(po.status(), PurchaseOrderStatus::Draft);
        assert!(po.received_at().is_none());
        assert_eq!(po.version(), 1);
    }

    #[test]
    fn mark_received_stamps_timestamp_and_bumps_version() {
        let mut po = order(vec![line(5)]).unwrap();
        let at = Utc::now();
        po.mark_received(at).unwrap();
        assert_eq!(po.status(), PurchaseOrderStatus::Received);
        assert_eq!(po.received_at(), Some(at));
        assert_eq!(po.version(), 2);
    }

    #[test]
    fn receiving_twice_fails_invalid_state() {
        let mut po = order(vec![line(5)]).unwrap();
        po.mark_received(Utc::now()).unwrap();
        let err = po.mark_received(Utc::now()).unwrap_err();
        match err {
            DomainError::InvalidState(msg) => assert!(msg.contains("already received")),
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }
}
