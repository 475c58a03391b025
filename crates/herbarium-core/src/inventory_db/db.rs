//! SQLite-backed inventory database implementation.
//!
//! Handles connection, migrations, and timestamp helpers. Plant CRUD lives in `plants`.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::HerbariumConfig;

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

/// How long a writer waits for another connection's write lock before failing.
const WRITE_LOCK_WAIT: Duration = Duration::from_secs(5);

/// Schema, one statement per entry. Every statement is idempotent.
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        created_at INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS plants (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        common_name TEXT NOT NULL,
        scientific_name TEXT,
        description TEXT,
        habitat TEXT,
        care_instructions TEXT,
        family TEXT,
        plant_parts_used TEXT,
        uses TEXT,
        category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
        is_featured INTEGER NOT NULL DEFAULT 0,
        image_url TEXT,
        sku TEXT UNIQUE,
        quantity INTEGER NOT NULL DEFAULT 0,
        minimum_stock INTEGER NOT NULL DEFAULT 5,
        unit_price REAL,
        location TEXT,
        section TEXT,
        supplier TEXT,
        supplier_contact TEXT,
        date_acquired TEXT,
        last_restocked INTEGER,
        inventory_notes TEXT,
        status TEXT NOT NULL DEFAULT 'available',
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        CONSTRAINT chk_common_name_present CHECK (length(trim(common_name)) > 0),
        CONSTRAINT chk_quantity_nonnegative CHECK (quantity >= 0),
        CONSTRAINT chk_minimum_stock_nonnegative CHECK (minimum_stock >= 0),
        CONSTRAINT chk_unit_price_nonnegative CHECK (unit_price IS NULL OR unit_price >= 0),
        CONSTRAINT chk_sku_length CHECK (sku IS NULL OR length(sku) <= 50)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS plant_categories (
        plant_id INTEGER NOT NULL REFERENCES plants(id) ON DELETE CASCADE,
        category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
        PRIMARY KEY (plant_id, category_id)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_plant_categories_category
        ON plant_categories (category_id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS inventory_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        plant_id INTEGER NOT NULL REFERENCES plants(id) ON DELETE CASCADE,
        change_type TEXT NOT NULL CHECK (change_type IN
            ('restock', 'sale', 'adjustment', 'loss', 'transfer', 'initial')),
        quantity_before INTEGER NOT NULL,
        quantity_after INTEGER NOT NULL,
        quantity_change INTEGER NOT NULL,
        reason TEXT,
        reference_number TEXT,
        changed_by TEXT NOT NULL,
        changed_at INTEGER NOT NULL,
        metadata TEXT
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_inventory_history_plant
        ON inventory_history (plant_id, changed_at)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        role TEXT NOT NULL DEFAULT 'user',
        created_at INTEGER NOT NULL
    )
    "#,
];

/// Handle to the SQLite-backed inventory database.
///
/// The database file is stored under the XDG state directory:
/// `~/.local/state/herbarium/herbarium.db` unless config says otherwise.
#[derive(Clone)]
pub struct InventoryDb {
    pub(crate) pool: Pool<Sqlite>,
}

impl InventoryDb {
    /// Open (or create) the database named by the config and run migrations.
    pub async fn open(cfg: &HerbariumConfig) -> Result<Self> {
        let path = cfg.database_path()?;
        Self::open_at(&path)
            .await
            .with_context(|| format!("open inventory database {}", path.display()))
    }

    /// Open the database at the default location.
    pub async fn open_default() -> Result<Self> {
        Self::open(&HerbariumConfig::default()).await
    }

    /// Open (or create) the database at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let opts = SqliteConnectOptions::from_str(&uri)?
            .foreign_keys(true)
            .busy_timeout(WRITE_LOCK_WAIT);
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(opts)
            .await?;
        let db = InventoryDb { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// In-memory database with the full schema. One connection, kept for the
    /// life of the pool, so every caller sees the same data.
    pub async fn open_in_memory() -> Result<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;
        let db = InventoryDb { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        for stmt in MIGRATIONS {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        tracing::debug!(statements = MIGRATIONS.len(), "inventory schema ready");
        Ok(())
    }
}

/// Current time as Unix seconds (for DB timestamps).
pub(crate) fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
