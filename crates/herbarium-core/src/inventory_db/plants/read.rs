//! Plant read operations: get, list, search, categories of a plant.

use anyhow::Result;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::collections::HashMap;

use super::super::db::InventoryDb;
use super::super::types::{Category, CategoryId, Plant, PlantDetail, PlantId};
use super::{plant_from_row, PLANT_COLUMNS};
use crate::catalog::listing::{ListingQuery, ListingSort};

/// WHERE clause shared by the page query and its count.
fn push_listing_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, query: &'a ListingQuery) {
    qb.push(" WHERE 1 = 1");
    if let Some(search) = query.search.as_deref() {
        qb.push(" AND instr(lower(common_name), lower(")
            .push_bind(search)
            .push(")) > 0");
    }
    if let Some(category) = query.category {
        qb.push(" AND (category_id = ")
            .push_bind(category)
            .push(" OR id IN (SELECT plant_id FROM plant_categories WHERE category_id = ")
            .push_bind(category)
            .push("))");
    }
    if let Some(family) = query.family.as_deref() {
        qb.push(" AND lower(family) = lower(").push_bind(family).push(")");
    }
}

impl InventoryDb {
    /// Fetch a single plant row.
    pub async fn get_plant(&self, id: PlantId) -> Result<Option<Plant>> {
        let sql = format!("SELECT {} FROM plants WHERE id = ?1", PLANT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(plant_from_row).transpose()
    }

    /// All plants, newest first.
    pub async fn list_plants(&self) -> Result<Vec<Plant>> {
        let sql = format!(
            "SELECT {} FROM plants ORDER BY created_at DESC, id DESC",
            PLANT_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(plant_from_row).collect()
    }

    /// Featured plants for the home page, newest first.
    pub async fn featured_plants(&self, limit: u32) -> Result<Vec<Plant>> {
        let sql = format!(
            "SELECT {} FROM plants WHERE is_featured = 1 \
             ORDER BY created_at DESC, id DESC LIMIT ?1",
            PLANT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(plant_from_row).collect()
    }

    /// One page of the public listing plus the total number of matches.
    pub async fn search_plants(
        &self,
        query: &ListingQuery,
        limit: u32,
        offset: u64,
    ) -> Result<(Vec<Plant>, i64)> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) AS n FROM plants");
        push_listing_filters(&mut count_qb, query);
        let total: i64 = count_qb.build().fetch_one(&self.pool).await?.get("n");

        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM plants", PLANT_COLUMNS));
        push_listing_filters(&mut qb, query);
        qb.push(match query.sort {
            ListingSort::NameAsc => " ORDER BY common_name COLLATE NOCASE ASC, id ASC",
            ListingSort::NameDesc => " ORDER BY common_name COLLATE NOCASE DESC, id DESC",
            ListingSort::Newest => " ORDER BY created_at DESC, id DESC",
            ListingSort::Oldest => " ORDER BY created_at ASC, id ASC",
        });
        qb.push(" LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(offset as i64);
        let rows = qb.build().fetch_all(&self.pool).await?;
        let plants = rows.iter().map(plant_from_row).collect::<Result<Vec<_>>>()?;
        Ok((plants, total))
    }

    /// Distinct non-empty families, alphabetically.
    pub async fn list_families(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT family
            FROM plants
            WHERE family IS NOT NULL AND family != ''
            ORDER BY family COLLATE NOCASE ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|r| r.get("family")).collect())
    }

    /// Categories of a plant: junction rows first; when there are none, the
    /// legacy `category_id` column.
    pub async fn categories_for_plant(&self, id: PlantId) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.name
            FROM plant_categories pc
            JOIN categories c ON c.id = pc.category_id
            WHERE pc.plant_id = ?1
            ORDER BY c.name ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        if !rows.is_empty() {
            return Ok(rows
                .iter()
                .map(|r| Category {
                    id: r.get("id"),
                    name: r.get("name"),
                })
                .collect());
        }

        let legacy = sqlx::query(
            r#"
            SELECT c.id, c.name
            FROM plants p
            JOIN categories c ON c.id = p.category_id
            WHERE p.id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(legacy
            .map(|r| Category {
                id: r.get("id"),
                name: r.get("name"),
            })
            .into_iter()
            .collect())
    }

    /// Junction rows grouped by plant.
    pub async fn category_ids_by_plant(&self) -> Result<HashMap<PlantId, Vec<CategoryId>>> {
        let rows = sqlx::query(
            r#"SELECT plant_id, category_id FROM plant_categories ORDER BY plant_id, category_id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        let mut out: HashMap<PlantId, Vec<CategoryId>> = HashMap::new();
        for row in rows {
            out.entry(row.get("plant_id"))
                .or_default()
                .push(row.get("category_id"));
        }
        Ok(out)
    }

    /// Plant with its resolved categories and derived stock.
    pub async fn plant_detail(&self, id: PlantId) -> Result<Option<PlantDetail>> {
        let Some(plant) = self.get_plant(id).await? else {
            return Ok(None);
        };
        let categories = self.categories_for_plant(id).await?;
        let stock = plant.stock();
        Ok(Some(PlantDetail {
            plant,
            categories,
            stock,
        }))
    }
}
