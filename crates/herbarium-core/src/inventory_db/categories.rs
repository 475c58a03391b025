//! Category table operations.

use anyhow::Result;
use sqlx::Row;

use super::db::{unix_timestamp, InventoryDb};
use super::types::{Category, CategoryId};

impl InventoryDb {
    /// All categories ordered by name.
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query(r#"SELECT id, name FROM categories ORDER BY name ASC"#)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|r| Category {
                id: r.get("id"),
                name: r.get("name"),
            })
            .collect())
    }

    pub async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query(r#"SELECT id, name FROM categories WHERE id = ?1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| Category {
            id: r.get("id"),
            name: r.get("name"),
        }))
    }

    /// Insert a category. Fails on a duplicate name.
    pub async fn add_category(&self, name: &str) -> Result<CategoryId> {
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("category name must not be empty");
        }
        let id = sqlx::query(r#"INSERT INTO categories (name, created_at) VALUES (?1, ?2)"#)
            .bind(name)
            .bind(unix_timestamp())
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        tracing::info!(category_id = id, name, "category added");
        Ok(id)
    }

    /// Remove a category. Junction rows cascade; legacy references are cleared.
    /// Returns false when the category did not exist.
    pub async fn remove_category(&self, id: CategoryId) -> Result<bool> {
        let done = sqlx::query(r#"DELETE FROM categories WHERE id = ?1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }
}
