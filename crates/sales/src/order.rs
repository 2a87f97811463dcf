use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wareflow_core::{
    DomainError, DomainResult, Entity, OrderNumber, ProductId, SalesOrderId, Versioned,
};

/// Sales order lifecycle. `Shipped`, `Completed` and `Cancelled` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SalesOrderStatus {
    New,
    Confirmed,
    Shipped,
    Completed,
    Cancelled,
}

impl SalesOrderStatus {
    /// The transition table. Everything not listed is illegal.
    pub fn can_transition(from: Self, to: Self) -> bool {
        use SalesOrderStatus::*;
        matches!(
            (from, to),
            (New, Confirmed)
                | (Confirmed, Shipped)
                | (Shipped, Completed)
                | (New, Cancelled)
                | (Confirmed, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SalesOrderStatus::Shipped | SalesOrderStatus::Completed | SalesOrderStatus::Cancelled
        )
    }
}

impl core::fmt::Display for SalesOrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            SalesOrderStatus::New => "NEW",
            SalesOrderStatus::Confirmed => "CONFIRMED",
            SalesOrderStatus::Shipped => "SHIPPED",
            SalesOrderStatus::Completed => "COMPLETED",
            SalesOrderStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// One ordered line: product reference, quantity, unit price snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
}

/// Outgoing order: stock promised to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrder {
    id: SalesOrderId,
    number: OrderNumber,
    customer_name: String,
    customer_email: Option<String>,
    status: SalesOrderStatus,
    created_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
    lines: Vec<SalesOrderLine>,
    version: u64,
}

impl SalesOrder {
    pub fn create(
        id: SalesOrderId,
        number: OrderNumber,
        customer_name: String,
        customer_email: Option<String>,
        lines: Vec<SalesOrderLine>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if customer_name.trim().is_empty() {
            return Err(DomainError::validation("customer name cannot be empty"));
        }
        if lines.is_empty() {
            return Err(DomainError::validation(
                "sales order must have at least one item",
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
            customer_name,
            customer_email,
            status: SalesOrderStatus::New,
            created_at,
            confirmed_at: None,
            lines,
            version: 1,
        })
    }

    pub fn id_typed(&self) -> SalesOrderId {
        self.id
    }

    pub fn number(&self) -> &OrderNumber {
        &self.number
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn customer_email(&self) -> Option<&str> {
        self.customer_email.as_deref()
    }

    pub fn status(&self) -> SalesOrderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    pub fn lines(&self) -> &[SalesOrderLine] {
        &self.lines
    }

    /// Check the confirmation preconditions without transitioning.
    pub fn ensure_confirmable(&self) -> DomainResult<()> {
        if self.status != SalesOrderStatus::New {
            return Err(DomainError::invalid_state(format!(
                "sales order is {} and can no longer be confirmed",
                self.status
            )));
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation("sales order has no items"));
        }
        Ok(())
    }

    /// Transition `New` -> `Confirmed`.
    pub fn mark_confirmed(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_confirmable()?;
        self.status = SalesOrderStatus::Confirmed;
        self.confirmed_at = Some(at);
        self.version += 1;
        Ok(())
    }

    /// Transition `Confirmed` -> `Shipped`.
    pub fn mark_shipped(&mut self) -> DomainResult<()> {
        self.transition(SalesOrderStatus::Shipped)
    }

    /// Transition `Shipped` -> `Completed`.
    pub fn mark_completed(&mut self) -> DomainResult<()> {
        self.transition(SalesOrderStatus::Completed)
    }

    /// Transition to `Cancelled` and clear the confirmation timestamp.
    pub fn mark_cancelled(&mut self) -> DomainResult<()> {
        self.transition(SalesOrderStatus::Cancelled)?;
        self.confirmed_at = None;
        Ok(())
    }

    fn transition(&mut self, to: SalesOrderStatus) -> DomainResult<()> {
        if !SalesOrderStatus::can_transition(self.status, to) {
            return Err(DomainError::invalid_state(format!(
                "cannot move sales order from {} to {to}",
                self.status
            )));
        }
        self.status = to;
        self.version += 1;
        Ok(())
    }
}

impl Entity for SalesOrder {
    type Id = SalesOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Versioned for SalesOrder {
    fn version(&self) -> u64 {
        self.version
    }
}
