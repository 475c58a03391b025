//! Router assembly. Every route is a leaf: read `AppState`, call the core,
//! render JSON or a redirect.

mod admin;
mod auth;
mod public;
mod upload;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::state::AppState;

pub fn create_router(state: AppState) -> Router {
    // Leave headroom above the configured maximum so oversized images get
    // the service's own 413 message instead of the framework's.
    let upload_limit = usize::try_from(state.config.upload().max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_mul(2);

    Router::new()
        .route("/", get(public::home))
        .route("/plants", get(public::list_plants))
        .route("/plants/{id}", get(public::plant_detail))
        .route(
            "/storage/v1/object/public/{bucket}/{*path}",
            get(public::storage_object),
        )
        .route("/admin", get(auth::login))
        .route("/admin/callback", get(auth::callback))
        .route("/admin/signout", post(auth::sign_out))
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/categories", get(admin::categories))
        .route("/admin/plants", post(admin::create_plant))
        .route(
            "/admin/plants/{id}",
            get(admin::edit_form)
                .put(admin::update_plant)
                .delete(admin::delete_plant),
        )
        .route("/admin/plants/{id}/adjust", post(admin::adjust))
        .route("/admin/plants/{id}/history", get(admin::history))
        .route(
            "/admin/images",
            post(upload::upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/admin/inventory/low-stock", get(admin::low_stock))
        .route("/admin/inventory/stats", get(admin::stats))
        .route("/admin/inventory/summary", get(admin::summary))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
