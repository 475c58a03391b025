//! Plant CRUD, split into reads and writes.

mod read;
mod write;

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::stock::{derive_status, StockStatus};

use super::types::{ChangeType, HistoryEntry, Plant};

pub(crate) const PLANT_COLUMNS: &str = r#"
    id, common_name, scientific_name, description, habitat, care_instructions,
    family, plant_parts_used, uses, category_id, is_featured, image_url, sku,
    quantity, minimum_stock, unit_price, location, section, supplier,
    supplier_contact, date_acquired, last_restocked, inventory_notes, status,
    created_at, updated_at
"#;

pub(crate) fn plant_from_row(row: &SqliteRow) -> Result<Plant> {
    let quantity: i64 = row.get("quantity");
    let minimum_stock: i64 = row.get("minimum_stock");
    let status_str: String = row.get("status");
    let date_acquired: Option<String> = row.get("date_acquired");
    let date_acquired = date_acquired
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?;

    Ok(Plant {
        id: row.get("id"),
        common_name: row.get("common_name"),
        scientific_name: row.get("scientific_name"),
        description: row.get("description"),
        habitat: row.get("habitat"),
        care_instructions: row.get("care_instructions"),
        family: row.get("family"),
        plant_parts_used: row.get("plant_parts_used"),
        uses: row.get("uses"),
        category_id: row.get("category_id"),
        is_featured: row.get("is_featured"),
        image_url: row.get("image_url"),
        sku: row.get("sku"),
        quantity,
        minimum_stock,
        unit_price: row.get("unit_price"),
        location: row.get("location"),
        section: row.get("section"),
        supplier: row.get("supplier"),
        supplier_contact: row.get("supplier_contact"),
        date_acquired,
        last_restocked: row.get("last_restocked"),
        inventory_notes: row.get("inventory_notes"),
        status: StockStatus::parse(&status_str)
            .unwrap_or_else(|| derive_status(quantity, minimum_stock)),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

pub(crate) fn history_from_row(row: &SqliteRow) -> Result<HistoryEntry> {
    let change_str: String = row.get("change_type");
    let change_type = ChangeType::parse(&change_str)
        .ok_or_else(|| anyhow::anyhow!("unknown change type in history: {}", change_str))?;
    let metadata: Option<String> = row.get("metadata");
    let metadata = metadata
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(serde_json::from_str)
        .transpose()?;
    Ok(HistoryEntry {
        id: row.get("id"),
        plant_id: row.get("plant_id"),
        change_type,
        quantity_before: row.get("quantity_before"),
        quantity_after: row.get("quantity_after"),
        quantity_change: row.get("quantity_change"),
        reason: row.get("reason"),
        reference_number: row.get("reference_number"),
        changed_by: row.get("changed_by"),
        changed_at: row.get("changed_at"),
        metadata,
    })
}
