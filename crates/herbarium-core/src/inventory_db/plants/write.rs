//! Plant write operations: create, update, delete, adjust stock.
//!
//! Every multi-step write runs in one transaction. The status column is
//! always written from `derive_status` in the same statement as the quantity.

use anyhow::Result;
use chrono::Local;
use sqlx::{Row, SqliteConnection};

use super::super::db::{unix_timestamp, InventoryDb};
use super::super::error::{AdjustError, StoreError};
use super::super::types::{
    CategoryId, ChangeType, HistoryEntry, InventoryAdjustment, Plant, PlantDraft, PlantId,
    UpdateOutcome,
};
use super::{history_from_row, plant_from_row, PLANT_COLUMNS};
use crate::stock::derive_status;

struct NewHistory<'a> {
    plant_id: PlantId,
    change_type: ChangeType,
    before: i64,
    after: i64,
    reason: Option<&'a str>,
    reference_number: Option<&'a str>,
    changed_by: &'a str,
}

/// Touch `updated_at` so the transaction holds SQLite's write lock before it
/// reads the row. Returns false when no such plant exists.
///
/// A transaction that reads first and writes later cannot wait for a
/// competing writer and fails with SQLITE_BUSY instead.
async fn lock_plant_row(conn: &mut SqliteConnection, id: PlantId, now: i64) -> Result<bool> {
    let r = sqlx::query("UPDATE plants SET updated_at = ?1 WHERE id = ?2")
        .bind(now)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(r.rows_affected() > 0)
}

async fn record_history(conn: &mut SqliteConnection, h: NewHistory<'_>) -> Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO inventory_history (
            plant_id, change_type, quantity_before, quantity_after, quantity_change,
            reason, reference_number, changed_by, changed_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(h.plant_id)
    .bind(h.change_type.as_str())
    .bind(h.before)
    .bind(h.after)
    .bind(h.after - h.before)
    .bind(h.reason)
    .bind(h.reference_number)
    .bind(h.changed_by)
    .bind(unix_timestamp())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();
    Ok(id)
}

async fn replace_categories(
    conn: &mut SqliteConnection,
    plant_id: PlantId,
    category_ids: &[CategoryId],
) -> Result<()> {
    sqlx::query("DELETE FROM plant_categories WHERE plant_id = ?1")
        .bind(plant_id)
        .execute(&mut *conn)
        .await?;
    for category_id in category_ids {
        sqlx::query("INSERT INTO plant_categories (plant_id, category_id) VALUES (?1, ?2)")
            .bind(plant_id)
            .bind(category_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

fn iso_date(d: Option<chrono::NaiveDate>) -> Option<String> {
    d.map(|d| d.format("%Y-%m-%d").to_string())
}

impl InventoryDb {
    /// Insert a plant with its categories and an `initial` history entry.
    ///
    /// Nothing is persisted if any step fails.
    pub async fn create_plant(&self, draft: &PlantDraft, actor: &str) -> Result<PlantId> {
        let now = unix_timestamp();
        let status = derive_status(draft.quantity, draft.minimum_stock());
        let date_acquired = draft
            .date_acquired
            .unwrap_or_else(|| Local::now().date_naive());

        let mut tx = self.pool.begin().await?;
        let plant_id = sqlx::query(
            r#"
            INSERT INTO plants (
                common_name, scientific_name, description, habitat, care_instructions,
                family, plant_parts_used, uses, category_id, is_featured, image_url, sku,
                quantity, minimum_stock, unit_price, location, section, supplier,
                supplier_contact, date_acquired, inventory_notes, status,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                    ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?23)
            "#,
        )
        .bind(&draft.common_name)
        .bind(&draft.scientific_name)
        .bind(&draft.description)
        .bind(&draft.habitat)
        .bind(&draft.care_instructions)
        .bind(&draft.family)
        .bind(&draft.plant_parts_used)
        .bind(&draft.uses)
        .bind(draft.legacy_category())
        .bind(draft.is_featured)
        .bind(&draft.image_url)
        .bind(&draft.sku)
        .bind(draft.quantity)
        .bind(draft.minimum_stock())
        .bind(draft.unit_price)
        .bind(&draft.location)
        .bind(&draft.section)
        .bind(&draft.supplier)
        .bind(&draft.supplier_contact)
        .bind(iso_date(Some(date_acquired)))
        .bind(&draft.inventory_notes)
        .bind(status.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        replace_categories(&mut *tx, plant_id, &draft.category_ids).await?;
        record_history(
            &mut *tx,
            NewHistory {
                plant_id,
                change_type: ChangeType::Initial,
                before: 0,
                after: draft.quantity,
                reason: Some("Initial stock"),
                reference_number: None,
                changed_by: actor,
            },
        )
        .await?;
        tx.commit().await?;

        tracing::info!(plant_id, status = %status, "plant created");
        Ok(plant_id)
    }

    /// Overwrite a plant's fields and categories. Records an `adjustment`
    /// history entry when the quantity changed.
    pub async fn update_plant(
        &self,
        id: PlantId,
        draft: &PlantDraft,
        actor: &str,
    ) -> Result<UpdateOutcome> {
        let now = unix_timestamp();
        let status = derive_status(draft.quantity, draft.minimum_stock());

        let mut tx = self.pool.begin().await?;
        if !lock_plant_row(&mut *tx, id, now).await? {
            return Err(StoreError::NotFound(format!("Plant {}", id)).into());
        }
        let row = sqlx::query("SELECT quantity, image_url FROM plants WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Err(StoreError::NotFound(format!("Plant {}", id)).into());
        };
        let previous_quantity: i64 = row.get("quantity");
        let previous_image_url: Option<String> = row.get("image_url");

        sqlx::query(
            r#"
            UPDATE plants
            SET common_name = ?1,
                scientific_name = ?2,
                description = ?3,
                habitat = ?4,
                care_instructions = ?5,
                family = ?6,
                plant_parts_used = ?7,
                uses = ?8,
                category_id = ?9,
                is_featured = ?10,
                image_url = ?11,
                sku = ?12,
                quantity = ?13,
                minimum_stock = ?14,
                unit_price = ?15,
                location = ?16,
                section = ?17,
                supplier = ?18,
                supplier_contact = ?19,
                date_acquired = COALESCE(?20, date_acquired),
                inventory_notes = ?21,
                status = ?22,
                updated_at = ?23
            WHERE id = ?24
            "#,
        )
        .bind(&draft.common_name)
        .bind(&draft.scientific_name)
        .bind(&draft.description)
        .bind(&draft.habitat)
        .bind(&draft.care_instructions)
        .bind(&draft.family)
        .bind(&draft.plant_parts_used)
        .bind(&draft.uses)
        .bind(draft.legacy_category())
        .bind(draft.is_featured)
        .bind(&draft.image_url)
        .bind(&draft.sku)
        .bind(draft.quantity)
        .bind(draft.minimum_stock())
        .bind(draft.unit_price)
        .bind(&draft.location)
        .bind(&draft.section)
        .bind(&draft.supplier)
        .bind(&draft.supplier_contact)
        .bind(iso_date(draft.date_acquired))
        .bind(&draft.inventory_notes)
        .bind(status.as_str())
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        replace_categories(&mut *tx, id, &draft.category_ids).await?;
        if previous_quantity != draft.quantity {
            record_history(
                &mut *tx,
                NewHistory {
                    plant_id: id,
                    change_type: ChangeType::Adjustment,
                    before: previous_quantity,
                    after: draft.quantity,
                    reason: Some("Edited in plant form"),
                    reference_number: None,
                    changed_by: actor,
                },
            )
            .await?;
        }
        tx.commit().await?;

        tracing::info!(plant_id = id, status = %status, "plant updated");
        Ok(UpdateOutcome {
            previous_quantity,
            previous_image_url,
        })
    }

    /// Delete a plant. Junction and history rows cascade. Returns the removed
    /// row, or `None` if no such plant existed.
    pub async fn delete_plant(&self, id: PlantId) -> Result<Option<Plant>> {
        let mut tx = self.pool.begin().await?;
        let sql = format!("SELECT {} FROM plants WHERE id = ?1", PLANT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            tx.commit().await?;
            return Ok(None);
        };
        let plant = plant_from_row(&row)?;
        sqlx::query("DELETE FROM plants WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::info!(plant_id = id, "plant deleted");
        Ok(Some(plant))
    }

    /// Apply a signed stock movement and append it to the history.
    ///
    /// Fails with [`AdjustError`] when the plant is missing, the change is
    /// zero, or the result would be negative or overflow. The quantity is
    /// then unchanged.
    pub async fn adjust_quantity(
        &self,
        id: PlantId,
        adjustment: &InventoryAdjustment,
        actor: &str,
    ) -> Result<HistoryEntry> {
        if adjustment.quantity_change == 0 {
            return Err(AdjustError::ZeroChange.into());
        }
        let now = unix_timestamp();

        let mut tx = self.pool.begin().await?;
        if !lock_plant_row(&mut *tx, id, now).await? {
            return Err(AdjustError::PlantNotFound(id).into());
        }
        let row = sqlx::query("SELECT quantity, minimum_stock FROM plants WHERE id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        let current: i64 = row.get("quantity");
        let minimum_stock: i64 = row.get("minimum_stock");
        let Some(new_quantity) = current.checked_add(adjustment.quantity_change) else {
            return Err(AdjustError::OutOfRange {
                current,
                change: adjustment.quantity_change,
            }
            .into());
        };
        if new_quantity < 0 {
            return Err(AdjustError::NegativeResult {
                current,
                change: adjustment.quantity_change,
            }
            .into());
        }
        let status = derive_status(new_quantity, minimum_stock);
        let restocked = adjustment.change_type == ChangeType::Restock;

        sqlx::query(
            r#"
            UPDATE plants
            SET quantity = ?1,
                status = ?2,
                last_restocked = CASE WHEN ?3 THEN ?4 ELSE last_restocked END,
                updated_at = ?4
            WHERE id = ?5
            "#,
        )
        .bind(new_quantity)
        .bind(status.as_str())
        .bind(restocked)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let history_id = record_history(
            &mut *tx,
            NewHistory {
                plant_id: id,
                change_type: adjustment.change_type,
                before: current,
                after: new_quantity,
                reason: adjustment.reason.as_deref(),
                reference_number: adjustment.reference_number.as_deref(),
                changed_by: actor,
            },
        )
        .await?;
        let row = sqlx::query("SELECT * FROM inventory_history WHERE id = ?1")
            .bind(history_id)
            .fetch_one(&mut *tx)
            .await?;
        let entry = history_from_row(&row)?;
        tx.commit().await?;

        tracing::info!(
            plant_id = id,
            change = adjustment.quantity_change,
            kind = adjustment.change_type.as_str(),
            status = %status,
            "stock adjusted"
        );
        Ok(entry)
    }

    /// History of one plant, newest first.
    pub async fn history_for_plant(&self, id: PlantId) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM inventory_history
            WHERE plant_id = ?1
            ORDER BY changed_at DESC, id DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(history_from_row).collect()
    }
}
