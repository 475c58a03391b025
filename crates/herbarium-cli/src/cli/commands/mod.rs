//! CLI command handlers. Each command is in its own file.

mod adjust;
mod admin;
mod category;
mod check_storage;
mod completions;
mod history;
mod low_stock;
mod serve;
mod status;

pub use adjust::run_adjust;
pub use admin::run_admin;
pub use category::run_category;
pub use check_storage::run_check_storage;
pub use completions::{run_completions, run_man};
pub use history::run_history;
pub use low_stock::run_low_stock;
pub use serve::run_serve;
pub use status::run_status;
