//! CLI for the Herbarium plant-inventory service.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use herbarium_core::config;
use herbarium_core::inventory_db::{ChangeType, InventoryDb};

use commands::{
    run_adjust, run_admin, run_category, run_check_storage, run_completions, run_history,
    run_low_stock, run_man, run_serve, run_status,
};

/// Top-level CLI for Herbarium.
#[derive(Debug, Parser)]
#[command(name = "herbarium")]
#[command(about = "Herbarium: plant catalog and inventory service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the HTTP server.
    Serve {
        /// Address to bind instead of `listen_addr` from config.
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,
    },

    /// Manage who may use the admin area.
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },

    /// Manage plant categories.
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Show inventory totals and the per-category summary.
    Status,

    /// List plants at or below their minimum stock.
    LowStock,

    /// Record a stock movement for a plant.
    Adjust {
        /// Plant identifier.
        id: i64,
        /// Signed quantity change, e.g. 10 or -3.
        #[arg(allow_negative_numbers = true)]
        change: i64,
        /// Kind of movement: restock, sale, adjustment, loss, transfer.
        #[arg(long = "type", default_value = "adjustment", value_parser = parse_change_type)]
        change_type: ChangeType,
        #[arg(long)]
        reason: Option<String>,
        /// Purchase order, invoice, or other reference.
        #[arg(long)]
        reference: Option<String>,
        /// Recorded as the author of the change.
        #[arg(long, default_value = "cli")]
        by: String,
    },

    /// Show the inventory history of a plant, newest first.
    History {
        /// Plant identifier.
        id: i64,
    },

    /// Verify the image bucket is reachable and public URLs resolve.
    CheckStorage,

    /// Print shell completions to stdout.
    Completions {
        shell: Shell,
    },

    /// Print the man page (roff) to stdout.
    Man,
}

#[derive(Debug, Subcommand)]
pub enum AdminAction {
    /// Grant admin access to an email address.
    Grant { email: String },
    /// Remove admin access from an email address.
    Revoke { email: String },
    /// List admins.
    List,
}

#[derive(Debug, Subcommand)]
pub enum CategoryAction {
    /// Create a category.
    Add { name: String },
    /// List categories.
    List,
    /// Delete a category; plants keep their other categories.
    Remove { id: i64 },
}

fn parse_change_type(s: &str) -> Result<ChangeType, String> {
    match ChangeType::parse(s) {
        Some(ChangeType::Initial) => Err("initial entries are recorded on create only".into()),
        Some(t) => Ok(t),
        None => Err(format!("unknown change type: {s}")),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        // These only print generated text; no config or database needed.
        match cli.command {
            CliCommand::Completions { shell } => return run_completions(shell),
            CliCommand::Man => return run_man(),
            _ => {}
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        if let CliCommand::CheckStorage = cli.command {
            return run_check_storage(&cfg);
        }

        let db = InventoryDb::open(&cfg).await?;

        match cli.command {
            CliCommand::Serve { listen } => run_serve(db, cfg, listen).await?,
            CliCommand::Admin { action } => run_admin(&db, action).await?,
            CliCommand::Category { action } => run_category(&db, action).await?,
            CliCommand::Status => run_status(&db).await?,
            CliCommand::LowStock => run_low_stock(&db).await?,
            CliCommand::Adjust {
                id,
                change,
                change_type,
                reason,
                reference,
                by,
            } => run_adjust(&db, id, change, change_type, reason, reference, &by).await?,
            CliCommand::History { id } => run_history(&db, id).await?,
            CliCommand::CheckStorage | CliCommand::Completions { .. } | CliCommand::Man => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
