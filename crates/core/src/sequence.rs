//! Order numbering: value object + allocation seam.
//!
//! Numbers look like `PO-2025-0004`: prefix, calendar year, zero-padded
//! sequential component. Allocation goes through [`SequenceProvider`] so the
//! counter can live wherever the store keeps its transactional state —
//! deriving the next number from a row count would let two concurrent
//! creations collide.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Which order workflow a number belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderPrefix {
    /// Purchase orders (`PO-...`).
    Purchase,
    /// Sales orders (`SO-...`).
    Sales,
}

impl OrderPrefix {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderPrefix::Purchase => "PO",
            OrderPrefix::Sales => "SO",
        }
    }
}

impl core::fmt::Display for OrderPrefix {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable order number, unique per prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderNumber {
    prefix: OrderPrefix,
    year: i32,
    sequence: u32,
}

impl OrderNumber {
    pub fn new(prefix: OrderPrefix, year: i32, sequence: u32) -> Self {
        Self {
            prefix,
            year,
            sequence,
        }
    }

    pub fn prefix(&self) -> OrderPrefix {
        self.prefix
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl core::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-{}-{:04}", self.prefix, self.year, self.sequence)
    }
}

impl FromStr for OrderNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '-');
        let prefix = match parts.next() {
            Some("PO") => OrderPrefix::Purchase,
            Some("SO") => OrderPrefix::Sales,
            _ => return Err(DomainError::invalid_id(format!("OrderNumber: {s}"))),
        };
        let year = parts
            .next()
            .and_then(|y| y.parse::<i32>().ok())
            .ok_or_else(|| DomainError::invalid_id(format!("OrderNumber: {s}")))?;
        let sequence = parts
            .next()
            .and_then(|n| n.parse::<u32>().ok())
            .ok_or_else(|| DomainError::invalid_id(format!("OrderNumber: {s}")))?;
        Ok(Self::new(prefix, year, sequence))
    }
}

/// Allocation seam for order numbers.
///
/// Implementations hand out strictly increasing sequence values per
/// (prefix, year), atomically with respect to concurrent callers.
pub trait SequenceProvider: Send + Sync {
    fn next(&self, prefix: OrderPrefix, year: i32) -> DomainResult<u32>;
}

impl<S> SequenceProvider for std::sync::Arc<S>
where
    S: SequenceProvider + ?Sized,
{
    fn next(&self, prefix: OrderPrefix, year: i32) -> DomainResult<u32> {
        (**self).next(prefix, year)
    }
}
