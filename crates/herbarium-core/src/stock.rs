//! Stock status derivation.
//!
//! `derive_status` is the only place that decides whether a plant is
//! available, low on stock, or out of stock. The `status` column stored with
//! each plant is written from it and nothing else.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Inventory status of a plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Available,
    LowStock,
    OutOfStock,
    /// Manual hold. Never produced by `derive_status`.
    Reserved,
    /// Manual hold. Never produced by `derive_status`.
    Discontinued,
}

impl StockStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StockStatus::Available => "available",
            StockStatus::LowStock => "low_stock",
            StockStatus::OutOfStock => "out_of_stock",
            StockStatus::Reserved => "reserved",
            StockStatus::Discontinued => "discontinued",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "available" => Some(StockStatus::Available),
            "low_stock" => Some(StockStatus::LowStock),
            "out_of_stock" => Some(StockStatus::OutOfStock),
            "reserved" => Some(StockStatus::Reserved),
            "discontinued" => Some(StockStatus::Discontinued),
            _ => None,
        }
    }

    /// Badge text shown next to a plant.
    pub fn label(self) -> &'static str {
        match self {
            StockStatus::Available => "Available",
            StockStatus::LowStock => "Low Stock",
            StockStatus::OutOfStock => "Out of Stock",
            StockStatus::Reserved => "Reserved",
            StockStatus::Discontinued => "Discontinued",
        }
    }

    /// True for the states that need restocking.
    pub fn needs_restock(self) -> bool {
        matches!(self, StockStatus::LowStock | StockStatus::OutOfStock)
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a quantity against its minimum stock threshold.
///
/// Zero is out of stock whatever the threshold; anything up to and including
/// the threshold is low; above it is available.
pub fn derive_status(quantity: i64, minimum_stock: i64) -> StockStatus {
    if quantity <= 0 {
        StockStatus::OutOfStock
    } else if quantity <= minimum_stock {
        StockStatus::LowStock
    } else {
        StockStatus::Available
    }
}

/// Units missing to reach the minimum stock level (never negative).
pub fn shortage(quantity: i64, minimum_stock: i64) -> i64 {
    (minimum_stock - quantity.max(0)).max(0)
}

/// Derived status plus the values a badge or form preview renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockLevel {
    pub status: StockStatus,
    pub label: &'static str,
    pub shortage: i64,
}

impl StockLevel {
    pub fn of(quantity: i64, minimum_stock: i64) -> Self {
        let status = derive_status(quantity, minimum_stock);
        Self {
            status,
            label: status.label(),
            shortage: shortage(quantity, minimum_stock),
        }
    }
}
