//! `herbarium history <id>` – inventory ledger of one plant.

use anyhow::Result;
use herbarium_core::inventory_db::InventoryDb;

pub async fn run_history(db: &InventoryDb, id: i64) -> Result<()> {
    let Some(plant) = db.get_plant(id).await? else {
        anyhow::bail!("plant {} not found", id);
    };
    let entries = db.history_for_plant(id).await?;
    println!("{} (id {}), quantity {}", plant.common_name, plant.id, plant.quantity);
    if entries.is_empty() {
        println!("No history recorded.");
        return Ok(());
    }
    println!(
        "{:<12} {:<11} {:>6} {:>6} {:>6} {:<24} {}",
        "AT", "TYPE", "BEFORE", "AFTER", "CHANGE", "BY", "REASON"
    );
    for e in entries {
        println!(
            "{:<12} {:<11} {:>6} {:>6} {:>+6} {:<24} {}",
            e.changed_at,
            e.change_type.as_str(),
            e.quantity_before,
            e.quantity_after,
            e.quantity_change,
            e.changed_by,
            e.reason.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
