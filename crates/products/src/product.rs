use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use wareflow_core::{DomainError, DomainResult, Entity, ProductId, Versioned};

/// Caller-supplied product attributes (create and update share the shape).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub sku: String,
    pub stock_quantity: u32,
    /// Price in smallest currency unit (e.g., cents).
    pub unit_price: u64,
    pub location_code: Option<String>,
    pub perishable: bool,
    pub expiry_date: Option<NaiveDate>,
}

/// Catalog entity: one stocked product.
///
/// `stock_quantity` is mutated only through the stock ledger; the catalog
/// touches every other field. The unsigned type carries the never-negative
/// invariant, the ledger carries the never-unexplained one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    sku: String,
    stock_quantity: u32,
    /// Price in smallest currency unit (e.g., cents).
    unit_price: u64,
    location_code: Option<String>,
    perishable: bool,
    expiry_date: Option<NaiveDate>,
    version: u64,
}

impl Product {
    /// Create a product from a validated draft.
    ///
    /// The first committed revision is version 1; callers persist it with
    /// `ExpectedVersion::Exact(0)`.
    pub fn create(id: ProductId, draft: ProductDraft) -> DomainResult<Self> {
        validate_draft(&draft)?;
        Ok(Self {
            id,
            name: draft.name,
            sku: draft.sku,
            stock_quantity: draft.stock_quantity,
            unit_price: draft.unit_price,
            location_code: draft.location_code,
            perishable: draft.perishable,
            expiry_date: draft.expiry_date,
            version: 1,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn stock_quantity(&self) -> u32 {
        self.stock_quantity
    }

    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    pub fn location_code(&self) -> Option<&str> {
        self.location_code.as_deref()
    }

    pub fn perishable(&self) -> bool {
        self.perishable
    }

    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.expiry_date
    }

    /// Whether the product expires within `[from, to]` inclusive.
    pub fn expires_within(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.perishable
            && self
                .expiry_date
                .is_some_and(|d| d >= from && d <= to)
    }

    /// Replace the catalog attributes from a draft (admin update).
    ///
    /// `stock_quantity` is deliberately NOT taken from the draft; stock only
    /// moves through the ledger.
    pub fn apply_update(&mut self, draft: ProductDraft) -> DomainResult<()> {
        validate_draft(&draft)?;
        self.name = draft.name;
        self.sku = draft.sku;
        self.unit_price = draft.unit_price;
        self.location_code = draft.location_code;
        self.perishable = draft.perishable;
        self.expiry_date = draft.expiry_date;
        self.version += 1;
        Ok(())
    }

    /// Ledger-side mutation: stock arrives.
    pub fn receive_stock(&mut self, quantity: u32) -> DomainResult<()> {
        self.stock_quantity = self
            .stock_quantity
            .checked_add(quantity)
            .ok_or_else(|| DomainError::validation("stock quantity overflow"))?;
        self.version += 1;
        Ok(())
    }

    /// Ledger-side mutation: stock leaves.
    pub fn issue_stock(&mut self, quantity: u32) -> DomainResult<()> {
        if quantity > self.stock_quantity {
            return Err(DomainError::insufficient_stock(
                quantity,
                self.stock_quantity,
            ));
        }
        self.stock_quantity -= quantity;
        self.version += 1;
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Versioned for Product {
    fn version(&self) -> u64 {
        self.version
    }
}

fn validate_draft(draft: &ProductDraft) -> DomainResult<()> {
    if draft.name.trim().is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    if draft.sku.trim().is_empty() {
        return Err(DomainError::validation("SKU cannot be empty"));
    }
    Ok(())
}
