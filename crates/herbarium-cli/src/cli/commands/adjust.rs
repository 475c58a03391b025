//! `herbarium adjust <id> <change>` – record a stock movement.

use anyhow::Result;
use herbarium_core::inventory_db::{ChangeType, InventoryAdjustment, InventoryDb};

pub async fn run_adjust(
    db: &InventoryDb,
    id: i64,
    change: i64,
    change_type: ChangeType,
    reason: Option<String>,
    reference: Option<String>,
    by: &str,
) -> Result<()> {
    let adjustment = InventoryAdjustment {
        change_type,
        quantity_change: change,
        reason,
        reference_number: reference,
    };
    let entry = db.adjust_quantity(id, &adjustment, by).await?;
    println!(
        "Plant {}: {} {} -> {} ({:+})",
        id,
        entry.change_type.as_str(),
        entry.quantity_before,
        entry.quantity_after,
        entry.quantity_change
    );
    Ok(())
}
