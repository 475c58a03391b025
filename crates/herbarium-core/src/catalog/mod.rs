//! Read models for the public catalog and the admin dashboard.

pub mod dashboard;
pub mod listing;

use serde::Serialize;

use crate::inventory_db::{Plant, PlantId};
use crate::stock::StockLevel;
use crate::text::excerpt;

/// Pagination summary for a listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
    /// 1-based index of the first plant shown; 0 when the page is empty.
    pub showing_from: u64,
    pub showing_to: u64,
}

impl PageInfo {
    pub fn new(page: u32, page_size: u32, total: u64) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let total_pages = total.div_ceil(u64::from(page_size)) as u32;
        let offset = u64::from(page - 1) * u64::from(page_size);
        let (showing_from, showing_to) = if offset >= total {
            (0, 0)
        } else {
            (offset + 1, (offset + u64::from(page_size)).min(total))
        };
        Self {
            page,
            page_size,
            total,
            total_pages,
            showing_from,
            showing_to,
        }
    }

    /// Rows to skip before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

/// Plant as shown on a public card: plain-text description, derived stock.
#[derive(Debug, Clone, Serialize)]
pub struct PlantCard {
    pub id: PlantId,
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub family: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_featured: bool,
    pub stock: StockLevel,
}

impl From<&Plant> for PlantCard {
    fn from(p: &Plant) -> Self {
        Self {
            id: p.id,
            common_name: p.common_name.clone(),
            scientific_name: p.scientific_name.clone(),
            family: p.family.clone(),
            description: p.description.as_deref().map(excerpt),
            image_url: p.image_url.clone(),
            is_featured: p.is_featured,
            stock: p.stock(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_info_middle_and_last_page() {
        let p = PageInfo::new(2, 12, 30);
        assert_eq!(p.total_pages, 3);
        assert_eq!((p.showing_from, p.showing_to), (13, 24));
        assert_eq!(p.offset(), 12);

        let p = PageInfo::new(3, 12, 30);
        assert_eq!((p.showing_from, p.showing_to), (25, 30));
    }

    #[test]
    fn page_info_past_the_end_shows_nothing() {
        let p = PageInfo::new(9, 12, 30);
        assert_eq!((p.showing_from, p.showing_to), (0, 0));
        assert_eq!(p.total_pages, 3);
    }

    #[test]
    fn page_info_empty_catalog() {
        let p = PageInfo::new(1, 12, 0);
        assert_eq!(p.total_pages, 0);
        assert_eq!((p.showing_from, p.showing_to), (0, 0));
    }
}
