//! `herbarium admin grant|revoke|list` – the admin authorization table.

use anyhow::Result;
use herbarium_core::inventory_db::InventoryDb;

use crate::cli::AdminAction;

pub async fn run_admin(db: &InventoryDb, action: AdminAction) -> Result<()> {
    match action {
        AdminAction::Grant { email } => {
            db.grant_admin(&email).await?;
            println!("Granted admin access to {}", email.trim().to_lowercase());
        }
        AdminAction::Revoke { email } => {
            if db.revoke_admin(&email).await? {
                println!("Revoked admin access from {}", email.trim().to_lowercase());
            } else {
                println!("{} is not an admin", email.trim().to_lowercase());
            }
        }
        AdminAction::List => {
            let admins = db.list_admins().await?;
            if admins.is_empty() {
                println!("No admins. Grant one with `herbarium admin grant <email>`.");
            }
            for a in admins {
                println!("{:<40} {}", a.email, a.role);
            }
        }
    }
    Ok(())
}
