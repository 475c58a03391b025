//! `herbarium status` – inventory totals and the per-category summary.

use anyhow::Result;
use herbarium_core::inventory_db::InventoryDb;

pub async fn run_status(db: &InventoryDb) -> Result<()> {
    let stats = db.inventory_stats().await?;
    if stats.total_plants == 0 {
        println!("No plants in database.");
        return Ok(());
    }
    println!(
        "{} plants, {} units, value {:.2}",
        stats.total_plants, stats.total_quantity, stats.total_value
    );
    println!(
        "available {}  low stock {}  out of stock {}  locations {}",
        stats.available_count, stats.low_stock_count, stats.out_of_stock_count, stats.unique_locations
    );
    println!();
    println!(
        "{:<24} {:>6} {:>8} {:>9} {:>5} {:>5} {:>10}",
        "CATEGORY", "PLANTS", "QTY", "AVAIL QTY", "LOW", "OUT", "VALUE"
    );
    for s in db.inventory_summary().await? {
        println!(
            "{:<24} {:>6} {:>8} {:>9} {:>5} {:>5} {:>10.2}",
            s.category_name,
            s.total_plants,
            s.total_quantity,
            s.available_quantity,
            s.low_stock_count,
            s.out_of_stock_count,
            s.total_inventory_value
        );
    }
    Ok(())
}
