//! Admin dashboard: every plant, filtered and sorted in memory.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::inventory_db::{Category, CategoryId, InventoryDb, Plant, PlantId};
use crate::stock::{StockLevel, StockStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardSort {
    #[default]
    CreatedDesc,
    CreatedAsc,
    NameAsc,
    NameDesc,
    QuantityDesc,
    QuantityAsc,
}

impl DashboardSort {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "created_asc" => DashboardSort::CreatedAsc,
            "name_asc" => DashboardSort::NameAsc,
            "name_desc" => DashboardSort::NameDesc,
            "quantity_desc" => DashboardSort::QuantityDesc,
            "quantity_asc" => DashboardSort::QuantityAsc,
            _ => DashboardSort::CreatedDesc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "status")]
pub enum StatusFilter {
    #[default]
    All,
    Only(StockStatus),
}

impl StatusFilter {
    /// `all`, empty, or unknown values mean no filter.
    pub fn parse(s: &str) -> Self {
        StockStatus::parse(s)
            .map(StatusFilter::Only)
            .unwrap_or(StatusFilter::All)
    }

    fn accepts(self, status: StockStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(s) => s == status,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardQuery {
    pub search: Option<String>,
    pub category: Option<CategoryId>,
    pub status: StatusFilter,
    pub sort: DashboardSort,
}

impl DashboardQuery {
    pub fn from_params(params: &DashboardParams) -> Self {
        Self {
            search: params
                .q
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase),
            category: params
                .category
                .as_deref()
                .and_then(|c| c.trim().parse().ok()),
            status: params
                .status
                .as_deref()
                .map(StatusFilter::parse)
                .unwrap_or_default(),
            sort: params
                .sort
                .as_deref()
                .map(DashboardSort::parse)
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardRow {
    pub id: PlantId,
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub is_featured: bool,
    pub quantity: i64,
    pub minimum_stock: i64,
    pub location: Option<String>,
    pub category_ids: Vec<CategoryId>,
    pub stock: StockLevel,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardTotals {
    pub total_plants: usize,
    pub featured: usize,
    /// Plants whose derived status needs a restock.
    pub low_stock: usize,
    pub total_quantity: i64,
    pub filtered: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub rows: Vec<DashboardRow>,
    pub totals: DashboardTotals,
    pub categories: Vec<Category>,
    pub filters: DashboardQuery,
}

fn matches_search(p: &Plant, needle: &str) -> bool {
    let hit = |v: Option<&str>| v.is_some_and(|s| s.to_lowercase().contains(needle));
    hit(Some(&p.common_name)) || hit(p.scientific_name.as_deref()) || hit(p.sku.as_deref())
}

/// Filter and sort `plants` (given newest first) for the dashboard.
pub fn build_dashboard(
    plants: &[Plant],
    junction: &HashMap<PlantId, Vec<CategoryId>>,
    query: &DashboardQuery,
) -> (Vec<DashboardRow>, DashboardTotals) {
    let mut totals = DashboardTotals {
        total_plants: plants.len(),
        ..Default::default()
    };
    let mut rows = Vec::new();

    for p in plants {
        let stock = p.stock();
        if p.is_featured {
            totals.featured += 1;
        }
        if stock.status.needs_restock() {
            totals.low_stock += 1;
        }
        totals.total_quantity += p.quantity;

        let category_ids = junction.get(&p.id).cloned().unwrap_or_default();
        if let Some(needle) = query.search.as_deref() {
            if !matches_search(p, needle) {
                continue;
            }
        }
        if let Some(cat) = query.category {
            if p.category_id != Some(cat) && !category_ids.contains(&cat) {
                continue;
            }
        }
        if !query.status.accepts(stock.status) {
            continue;
        }
        rows.push(DashboardRow {
            id: p.id,
            common_name: p.common_name.clone(),
            scientific_name: p.scientific_name.clone(),
            sku: p.sku.clone(),
            image_url: p.image_url.clone(),
            is_featured: p.is_featured,
            quantity: p.quantity,
            minimum_stock: p.minimum_stock,
            location: p.location.clone(),
            category_ids,
            stock,
            created_at: p.created_at,
        });
    }

    match query.sort {
        DashboardSort::CreatedDesc => {
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
        }
        DashboardSort::CreatedAsc => {
            rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
        }
        DashboardSort::NameAsc => rows.sort_by_cached_key(|r| r.common_name.to_lowercase()),
        DashboardSort::NameDesc => {
            rows.sort_by_cached_key(|r| std::cmp::Reverse(r.common_name.to_lowercase()))
        }
        DashboardSort::QuantityDesc => rows.sort_by(|a, b| b.quantity.cmp(&a.quantity)),
        DashboardSort::QuantityAsc => rows.sort_by_key(|r| r.quantity),
    }
    totals.filtered = rows.len();
    (rows, totals)
}

pub async fn load_dashboard(db: &InventoryDb, query: &DashboardQuery) -> Result<Dashboard> {
    let plants = db.list_plants().await?;
    let junction = db.category_ids_by_plant().await?;
    let (rows, totals) = build_dashboard(&plants, &junction, query);
    Ok(Dashboard {
        rows,
        totals,
        categories: db.list_categories().await?,
        filters: query.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plant(id: PlantId, name: &str, qty: i64, min: i64) -> Plant {
        Plant {
            id,
            common_name: name.to_string(),
            scientific_name: None,
            description: None,
            habitat: None,
            care_instructions: None,
            family: None,
            plant_parts_used: None,
            uses: None,
            category_id: None,
            is_featured: false,
            image_url: None,
            sku: None,
            quantity: qty,
            minimum_stock: min,
            unit_price: None,
            location: None,
            section: None,
            supplier: None,
            supplier_contact: None,
            date_acquired: None,
            last_restocked: None,
            inventory_notes: None,
            status: crate::stock::derive_status(qty, min),
            created_at: 1_000 + id,
            updated_at: 1_000 + id,
        }
    }

    #[test]
    fn status_filter_uses_derived_status() {
        let mut stale = plant(1, "Basil", 0, 5);
        stale.status = StockStatus::Available;
        let plants = vec![stale, plant(2, "Mint", 3, 5), plant(3, "Sage", 20, 5)];
        let q = DashboardQuery {
            status: StatusFilter::parse("out_of_stock"),
            ..Default::default()
        };
        let (rows, totals) = build_dashboard(&plants, &HashMap::new(), &q);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].common_name, "Basil");
        assert_eq!(totals.low_stock, 2);
        assert_eq!(totals.total_plants, 3);
        assert_eq!(totals.filtered, 1);
    }

    #[test]
    fn search_covers_scientific_name_and_sku() {
        let mut a = plant(1, "Basil", 9, 5);
        a.scientific_name = Some("Ocimum basilicum".into());
        let mut b = plant(2, "Mint", 9, 5);
        b.sku = Some("HRB-042".into());
        let plants = vec![a, b];

        let q = DashboardQuery::from_params(&DashboardParams {
            q: Some("OCIMUM".into()),
            ..Default::default()
        });
        let (rows, _) = build_dashboard(&plants, &HashMap::new(), &q);
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1]);

        let q = DashboardQuery::from_params(&DashboardParams {
            q: Some("hrb-0".into()),
            ..Default::default()
        });
        let (rows, _) = build_dashboard(&plants, &HashMap::new(), &q);
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn category_filter_matches_legacy_or_junction() {
        let mut legacy = plant(1, "Aloe", 9, 5);
        legacy.category_id = Some(7);
        let linked = plant(2, "Neem", 9, 5);
        let other = plant(3, "Rue", 9, 5);
        let junction: HashMap<PlantId, Vec<CategoryId>> = [(2, vec![3, 7])].into();
        let q = DashboardQuery {
            category: Some(7),
            ..Default::default()
        };
        let (rows, _) = build_dashboard(&[legacy, linked, other], &junction, &q);
        let mut ids: Vec<_> = rows.iter().map(|r| r.id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn sorts_by_quantity_and_name() {
        let plants = vec![plant(1, "basil", 4, 1), plant(2, "Aloe", 10, 1), plant(3, "cumin", 1, 1)];
        let q = DashboardQuery {
            sort: DashboardSort::parse("quantity_desc"),
            ..Default::default()
        };
        let (rows, _) = build_dashboard(&plants, &HashMap::new(), &q);
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 1, 3]);

        let q = DashboardQuery {
            sort: DashboardSort::NameAsc,
            ..Default::default()
        };
        let (rows, _) = build_dashboard(&plants, &HashMap::new(), &q);
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 1, 3]);

        let (rows, _) = build_dashboard(&plants, &HashMap::new(), &DashboardQuery::default());
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 2, 1]);
    }
}
