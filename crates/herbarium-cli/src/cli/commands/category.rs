//! `herbarium category add|list|remove`.

use anyhow::Result;
use herbarium_core::inventory_db::InventoryDb;

use crate::cli::CategoryAction;

pub async fn run_category(db: &InventoryDb, action: CategoryAction) -> Result<()> {
    match action {
        CategoryAction::Add { name } => {
            let id = db.add_category(&name).await?;
            println!("Added category {} ({})", id, name.trim());
        }
        CategoryAction::List => {
            let categories = db.list_categories().await?;
            if categories.is_empty() {
                println!("No categories.");
            } else {
                println!("{:<6} NAME", "ID");
                for c in categories {
                    println!("{:<6} {}", c.id, c.name);
                }
            }
        }
        CategoryAction::Remove { id } => {
            if db.remove_category(id).await? {
                println!("Removed category {id}");
            } else {
                anyhow::bail!("category {} not found", id);
            }
        }
    }
    Ok(())
}
