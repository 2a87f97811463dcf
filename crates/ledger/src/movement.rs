use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wareflow_core::{Entity, MovementId, ProductId};

/// Which way stock moved.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementDirection {
    In,
    Out,
}

impl core::fmt::Display for MovementDirection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MovementDirection::In => f.write_str("IN"),
            MovementDirection::Out => f.write_str("OUT"),
        }
    }
}

/// One atomic, directional, immutable quantity change.
///
/// Movements are append-only: once committed they are never edited or
/// deleted. Construction is confined to this crate so every movement in
/// existence corresponds to a ledger adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    id: MovementId,
    product_id: ProductId,
    direction: MovementDirection,
    quantity: u32,
    reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl StockMovement {
    pub(crate) fn record(
        product_id: ProductId,
        direction: MovementDirection,
        quantity: u32,
        reason: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MovementId::new(),
            product_id,
            direction,
            quantity,
            reason,
            created_at,
        }
    }

    pub fn id_typed(&self) -> MovementId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn direction(&self) -> MovementDirection {
        self.direction
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Signed effect of this movement on its product's quantity.
    pub fn signed_quantity(&self) -> i64 {
        match self.direction {
            MovementDirection::In => i64::from(self.quantity),
            MovementDirection::Out => -i64::from(self.quantity),
        }
    }
}

impl Entity for StockMovement {
    type Id = MovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
