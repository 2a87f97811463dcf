//! Picking slip document data.
//!
//! The engine only assembles the rows; turning them into a paginated
//! document (PDF, print job) is the rendering collaborator's business.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wareflow_core::ProductId;
use wareflow_products::Product;

use crate::order::SalesOrder;

/// One pickable row: where to go and how many to grab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickingRow {
    pub product_name: String,
    pub sku: String,
    pub location: String,
    pub quantity: u32,
}

/// Read-only picking document for one sales order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickingSlip {
    pub order_number: String,
    pub customer_name: String,
    pub created_at: DateTime<Utc>,
    pub rows: Vec<PickingRow>,
}

impl PickingSlip {
    /// Assemble the slip, resolving product details through `lookup`.
    ///
    /// Rows for products that can no longer be resolved fall back to
    /// placeholder fields instead of failing the whole document.
    pub fn for_order(
        order: &SalesOrder,
        mut lookup: impl FnMut(&ProductId) -> Option<Product>,
    ) -> Self {
        let rows = order
            .lines()
            .iter()
            .map(|line| match lookup(&line.product_id) {
                Some(product) => PickingRow {
                    product_name: product.name().to_string(),
                    sku: product.sku().to_string(),
                    location: product
                        .location_code()
                        .unwrap_or("N/A")
                        .to_string(),
                    quantity: line.quantity,
                },
                None => PickingRow {
                    product_name: "-".to_string(),
                    sku: "-".to_string(),
                    location: "N/A".to_string(),
                    quantity: line.quantity,
                },
            })
            .collect();

        Self {
            order_number: order.number().to_string(),
            customer_name: order.customer_name().to_string(),
            created_at: order.created_at(),
            rows,
        }
    }
}
