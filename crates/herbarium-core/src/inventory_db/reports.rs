//! Inventory reports. Status is recomputed from quantity and threshold on
//! every read, never taken from the stored column.

use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::db::InventoryDb;
use super::types::{CategoryId, InventoryStats, InventorySummary, LowStockPlant, Plant, PlantId};
use crate::stock::StockStatus;

/// Bucket for plants without any category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Category ids of a plant: junction rows, else the legacy column.
fn effective_categories(
    plant: &Plant,
    junction: &HashMap<PlantId, Vec<CategoryId>>,
) -> Vec<CategoryId> {
    match junction.get(&plant.id) {
        Some(ids) if !ids.is_empty() => ids.clone(),
        _ => plant.category_id.into_iter().collect(),
    }
}

impl InventoryDb {
    /// Plants at or below their minimum stock, largest shortage first.
    pub async fn low_stock_plants(&self) -> Result<Vec<LowStockPlant>> {
        let plants = self.list_plants().await?;
        let junction = self.category_ids_by_plant().await?;
        let names: HashMap<CategoryId, String> = self
            .list_categories()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let mut out: Vec<LowStockPlant> = plants
            .into_iter()
            .filter_map(|p| {
                let stock = p.stock();
                if !stock.status.needs_restock() {
                    return None;
                }
                let category_name = effective_categories(&p, &junction)
                    .into_iter()
                    .filter_map(|id| names.get(&id).cloned())
                    .min();
                Some(LowStockPlant {
                    id: p.id,
                    sku: p.sku,
                    common_name: p.common_name,
                    scientific_name: p.scientific_name,
                    quantity: p.quantity,
                    minimum_stock: p.minimum_stock,
                    shortage: stock.shortage,
                    location: p.location,
                    status: stock.status,
                    supplier: p.supplier,
                    last_restocked: p.last_restocked,
                    category_name,
                })
            })
            .collect();
        out.sort_by(|a, b| {
            b.shortage
                .cmp(&a.shortage)
                .then_with(|| a.common_name.to_lowercase().cmp(&b.common_name.to_lowercase()))
        });
        Ok(out)
    }

    /// Totals over the whole inventory.
    pub async fn inventory_stats(&self) -> Result<InventoryStats> {
        let plants = self.list_plants().await?;
        let mut stats = InventoryStats::default();
        let mut locations = BTreeSet::new();
        for p in &plants {
            stats.total_plants += 1;
            stats.total_quantity += p.quantity;
            stats.total_value += p.inventory_value();
            match p.stock().status {
                StockStatus::LowStock => stats.low_stock_count += 1,
                StockStatus::OutOfStock => stats.out_of_stock_count += 1,
                StockStatus::Available => stats.available_count += 1,
                StockStatus::Reserved | StockStatus::Discontinued => {}
            }
            if let Some(loc) = p.location.as_deref() {
                locations.insert(loc.to_string());
            }
        }
        stats.unique_locations = locations.len() as i64;
        Ok(stats)
    }

    /// Per-category totals, ordered by category name. A plant in several
    /// categories counts in each; plants without one land in "Uncategorized".
    pub async fn inventory_summary(&self) -> Result<Vec<InventorySummary>> {
        let plants = self.list_plants().await?;
        let junction = self.category_ids_by_plant().await?;
        let names: HashMap<CategoryId, String> = self
            .list_categories()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let mut by_name: BTreeMap<String, InventorySummary> = BTreeMap::new();
        for p in &plants {
            let mut buckets: Vec<String> = effective_categories(p, &junction)
                .into_iter()
                .filter_map(|id| names.get(&id).cloned())
                .collect();
            if buckets.is_empty() {
                buckets.push(UNCATEGORIZED.to_string());
            }
            let status = p.stock().status;
            for name in buckets {
                let s = by_name
                    .entry(name.clone())
                    .or_insert_with(|| InventorySummary {
                        category_name: name,
                        ..Default::default()
                    });
                s.total_plants += 1;
                s.total_quantity += p.quantity;
                s.total_inventory_value += p.inventory_value();
                match status {
                    StockStatus::Available => s.available_quantity += p.quantity,
                    StockStatus::LowStock => s.low_stock_count += 1,
                    StockStatus::OutOfStock => s.out_of_stock_count += 1,
                    StockStatus::Reserved | StockStatus::Discontinued => {}
                }
            }
        }
        Ok(by_name.into_values().collect())
    }
}
