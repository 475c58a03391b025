//! `herbarium low-stock` – plants that need restocking.

use anyhow::Result;
use herbarium_core::inventory_db::InventoryDb;

pub async fn run_low_stock(db: &InventoryDb) -> Result<()> {
    let plants = db.low_stock_plants().await?;
    if plants.is_empty() {
        println!("Nothing needs restocking.");
        return Ok(());
    }
    println!(
        "{:<6} {:<14} {:>5} {:>5} {:>8} {:<14} {}",
        "ID", "STATUS", "QTY", "MIN", "SHORTAGE", "CATEGORY", "NAME"
    );
    for p in plants {
        println!(
            "{:<6} {:<14} {:>5} {:>5} {:>8} {:<14} {}",
            p.id,
            p.status.label(),
            p.quantity,
            p.minimum_stock,
            p.shortage,
            p.category_name.as_deref().unwrap_or("-"),
            p.common_name
        );
    }
    Ok(())
}
