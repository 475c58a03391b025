//! Persistent inventory database (SQLite via sqlx).
//!
//! Stores plants, categories and their junction table, the inventory history
//! ledger, and the admin authorization table.

pub mod types;
pub mod db;
pub mod error;
mod admins;
mod categories;
mod plants;
mod reports;

pub use types::*;
pub use db::*;
pub use error::{AdjustError, StoreError};
pub use admins::ADMIN_ROLE;
pub use reports::UNCATEGORIZED;

#[cfg(test)]
mod tests;
