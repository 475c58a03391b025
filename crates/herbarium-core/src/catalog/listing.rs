//! Public listing: search, filter, sort, paginate.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{PageInfo, PlantCard};
use crate::inventory_db::{Category, CategoryId, InventoryDb};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingSort {
    #[default]
    NameAsc,
    NameDesc,
    Newest,
    Oldest,
}

impl ListingSort {
    /// Unknown values fall back to `name_asc`.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "name_desc" => ListingSort::NameDesc,
            "newest" => ListingSort::Newest,
            "oldest" => ListingSort::Oldest,
            _ => ListingSort::NameAsc,
        }
    }
}

/// Raw query-string parameters, exactly as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub family: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

/// Parsed listing request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub category: Option<CategoryId>,
    pub family: Option<String>,
    pub sort: ListingSort,
    pub page: u32,
}

fn non_blank(v: &Option<String>) -> Option<String> {
    v.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ListingQuery {
    /// Blank filters are dropped; an unparsable category is ignored; the page
    /// is clamped to at least 1.
    pub fn from_params(params: &ListingParams) -> Self {
        let page = params
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .map(|p| p.clamp(1, i64::from(u32::MAX)) as u32)
            .unwrap_or(1);
        Self {
            search: non_blank(&params.q),
            category: params
                .category
                .as_deref()
                .and_then(|c| c.trim().parse().ok()),
            family: non_blank(&params.family),
            sort: params
                .sort
                .as_deref()
                .map(ListingSort::parse)
                .unwrap_or_default(),
            page,
        }
    }
}

/// Everything the listing page renders.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    pub plants: Vec<PlantCard>,
    pub pagination: PageInfo,
    pub categories: Vec<Category>,
    pub families: Vec<String>,
    pub filters: ListingQuery,
}

pub async fn catalog_page(
    db: &InventoryDb,
    query: &ListingQuery,
    page_size: u32,
) -> Result<CatalogPage> {
    let info = PageInfo::new(query.page, page_size, 0);
    let (plants, total) = db.search_plants(query, info.page_size, info.offset()).await?;
    let pagination = PageInfo::new(query.page, page_size, total.max(0) as u64);
    Ok(CatalogPage {
        plants: plants.iter().map(PlantCard::from).collect(),
        pagination,
        categories: db.list_categories().await?,
        families: db.list_families().await?,
        filters: query.clone(),
    })
}

/// Home page content.
#[derive(Debug, Clone, Serialize)]
pub struct HomePage {
    pub featured: Vec<PlantCard>,
}

pub async fn home_page(db: &InventoryDb, featured_limit: u32) -> Result<HomePage> {
    let featured = db.featured_plants(featured_limit).await?;
    Ok(HomePage {
        featured: featured.iter().map(PlantCard::from).collect(),
    })
}
