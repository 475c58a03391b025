use herbarium_core::auth::SessionContext;
use herbarium_core::config::HerbariumConfig;
use herbarium_core::inventory_db::InventoryDb;
use herbarium_core::storage::BlobStore;
use std::sync::Arc;

/// Shared by every route. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub db: InventoryDb,
    pub sessions: Arc<SessionContext>,
    pub store: Arc<dyn BlobStore>,
    pub config: Arc<HerbariumConfig>,
}
