//! Types used by the inventory database.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::stock::{StockLevel, StockStatus};

/// Plant identifier.
pub type PlantId = i64;
/// Category identifier.
pub type CategoryId = i64;

/// Full plant row.
#[derive(Debug, Clone, Serialize)]
pub struct Plant {
    pub id: PlantId,
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub description: Option<String>,
    pub habitat: Option<String>,
    pub care_instructions: Option<String>,
    pub family: Option<String>,
    pub plant_parts_used: Option<String>,
    pub uses: Option<String>,
    /// Deprecated single category; kept in sync with the first junction row.
    pub category_id: Option<CategoryId>,
    pub is_featured: bool,
    pub image_url: Option<String>,
    pub sku: Option<String>,
    pub quantity: i64,
    pub minimum_stock: i64,
    pub unit_price: Option<f64>,
    pub location: Option<String>,
    pub section: Option<String>,
    pub supplier: Option<String>,
    pub supplier_contact: Option<String>,
    pub date_acquired: Option<NaiveDate>,
    pub last_restocked: Option<i64>,
    pub inventory_notes: Option<String>,
    /// Value of the stored status column (a cache of `stock::derive_status`).
    pub status: StockStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Plant {
    /// Status recomputed from quantity and threshold.
    pub fn stock(&self) -> StockLevel {
        StockLevel::of(self.quantity, self.minimum_stock)
    }

    /// Quantity times unit price; zero when the price is unknown.
    pub fn inventory_value(&self) -> f64 {
        self.unit_price.unwrap_or(0.0) * self.quantity as f64
    }
}

/// Threshold used when a form leaves minimum stock empty.
pub const DEFAULT_MINIMUM_STOCK: i64 = 5;

/// Form payload for creating or editing a plant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlantDraft {
    pub common_name: String,
    #[serde(default)]
    pub scientific_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub habitat: Option<String>,
    #[serde(default)]
    pub care_instructions: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub plant_parts_used: Option<String>,
    #[serde(default)]
    pub uses: Option<String>,
    /// Selected categories; the first one is also written to the legacy column.
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub minimum_stock: Option<i64>,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub supplier_contact: Option<String>,
    #[serde(default)]
    pub date_acquired: Option<NaiveDate>,
    #[serde(default)]
    pub inventory_notes: Option<String>,
}

fn blank_to_none(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl PlantDraft {
    /// Trim text, turn empty strings into `None`, drop duplicate category ids,
    /// and fill an empty minimum stock with `default_minimum_stock`.
    pub fn normalized(&self, default_minimum_stock: i64) -> PlantDraft {
        let mut category_ids = Vec::with_capacity(self.category_ids.len());
        for id in &self.category_ids {
            if !category_ids.contains(id) {
                category_ids.push(*id);
            }
        }
        PlantDraft {
            common_name: self.common_name.trim().to_string(),
            scientific_name: blank_to_none(&self.scientific_name),
            description: blank_to_none(&self.description),
            habitat: blank_to_none(&self.habitat),
            care_instructions: blank_to_none(&self.care_instructions),
            family: blank_to_none(&self.family),
            plant_parts_used: blank_to_none(&self.plant_parts_used),
            uses: blank_to_none(&self.uses),
            category_ids,
            is_featured: self.is_featured,
            image_url: blank_to_none(&self.image_url),
            sku: blank_to_none(&self.sku),
            quantity: self.quantity,
            minimum_stock: Some(self.minimum_stock.unwrap_or(default_minimum_stock)),
            unit_price: self.unit_price,
            location: blank_to_none(&self.location),
            section: blank_to_none(&self.section),
            supplier: blank_to_none(&self.supplier),
            supplier_contact: blank_to_none(&self.supplier_contact),
            date_acquired: self.date_acquired,
            inventory_notes: blank_to_none(&self.inventory_notes),
        }
    }

    pub fn minimum_stock(&self) -> i64 {
        self.minimum_stock.unwrap_or(DEFAULT_MINIMUM_STOCK)
    }

    /// Legacy single-category value derived from the selection.
    pub fn legacy_category(&self) -> Option<CategoryId> {
        self.category_ids.first().copied()
    }
}

/// Category row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Kind of quantity change recorded in the inventory history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Restock,
    Sale,
    Adjustment,
    Loss,
    Transfer,
    Initial,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Restock => "restock",
            ChangeType::Sale => "sale",
            ChangeType::Adjustment => "adjustment",
            ChangeType::Loss => "loss",
            ChangeType::Transfer => "transfer",
            ChangeType::Initial => "initial",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "restock" => Some(ChangeType::Restock),
            "sale" => Some(ChangeType::Sale),
            "adjustment" => Some(ChangeType::Adjustment),
            "loss" => Some(ChangeType::Loss),
            "transfer" => Some(ChangeType::Transfer),
            "initial" => Some(ChangeType::Initial),
            _ => None,
        }
    }
}

/// Requested stock movement. `quantity_change` is signed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryAdjustment {
    pub change_type: ChangeType,
    pub quantity_change: i64,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub reference_number: Option<String>,
}

/// One row of the append-only inventory ledger.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub plant_id: PlantId,
    pub change_type: ChangeType,
    pub quantity_before: i64,
    pub quantity_after: i64,
    pub quantity_change: i64,
    pub reason: Option<String>,
    pub reference_number: Option<String>,
    pub changed_by: String,
    pub changed_at: i64,
    pub metadata: Option<serde_json::Value>,
}

/// Result of an edit: what the row looked like before.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub previous_quantity: i64,
    pub previous_image_url: Option<String>,
}

/// Row of the authorization table.
#[derive(Debug, Clone, Serialize)]
pub struct AdminRecord {
    pub email: String,
    pub role: String,
    pub created_at: i64,
}

/// Detail view: plant, resolved categories, derived stock.
#[derive(Debug, Clone, Serialize)]
pub struct PlantDetail {
    pub plant: Plant,
    pub categories: Vec<Category>,
    pub stock: StockLevel,
}

/// Plant needing restock, as listed by the low-stock report.
#[derive(Debug, Clone, Serialize)]
pub struct LowStockPlant {
    pub id: PlantId,
    pub sku: Option<String>,
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub quantity: i64,
    pub minimum_stock: i64,
    pub shortage: i64,
    pub location: Option<String>,
    pub status: StockStatus,
    pub supplier: Option<String>,
    pub last_restocked: Option<i64>,
    pub category_name: Option<String>,
}

/// Whole-inventory counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventoryStats {
    pub total_plants: i64,
    pub total_quantity: i64,
    pub total_value: f64,
    pub low_stock_count: i64,
    pub out_of_stock_count: i64,
    pub available_count: i64,
    pub unique_locations: i64,
}

/// Per-category counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventorySummary {
    pub category_name: String,
    pub total_plants: i64,
    pub total_quantity: i64,
    pub available_quantity: i64,
    pub low_stock_count: i64,
    pub out_of_stock_count: i64,
    pub total_inventory_value: f64,
}
