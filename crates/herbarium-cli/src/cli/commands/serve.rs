//! `herbarium serve` – run the HTTP server.

use anyhow::{Context, Result};
use herbarium_core::auth::{HostedIdentity, SessionContext};
use herbarium_core::config::{HerbariumConfig, ServiceCredentials};
use herbarium_core::inventory_db::InventoryDb;
use herbarium_core::storage::FsBlobStore;
use herbarium_core::upload;
use std::sync::Arc;

use crate::http::{self, AppState};

pub async fn run_serve(db: InventoryDb, cfg: HerbariumConfig, listen: Option<String>) -> Result<()> {
    let creds = ServiceCredentials::from_env()?;
    let identity = HostedIdentity::new(&creds)?;
    let store = FsBlobStore::create(&cfg.bucket_dir()?, upload::BUCKET, cfg.base_url())
        .context("failed to open image bucket")?;
    tracing::info!(bucket = %store.dir().display(), "image bucket ready");

    let addr = listen.unwrap_or_else(|| cfg.listen_addr.clone());
    let state = AppState {
        db,
        sessions: Arc::new(SessionContext::new(Arc::new(identity))),
        store: Arc::new(store),
        config: Arc::new(cfg),
    };
    http::serve(state, &addr).await
}
