use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use herbarium_core::catalog::listing::{
    catalog_page, home_page, CatalogPage, HomePage, ListingParams, ListingQuery,
};
use herbarium_core::inventory_db::{PlantDetail, PlantId};
use herbarium_core::storage::BlobStore;
use std::sync::Arc;

use crate::http::{ApiError, ApiResult, AppState};

pub async fn home(State(state): State<AppState>) -> ApiResult<Json<HomePage>> {
    Ok(Json(home_page(&state.db, state.config.featured_limit).await?))
}

pub async fn list_plants(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> ApiResult<Json<CatalogPage>> {
    let query = ListingQuery::from_params(&params);
    Ok(Json(catalog_page(&state.db, &query, state.config.page_size).await?))
}

pub async fn plant_detail(
    State(state): State<AppState>,
    Path(id): Path<PlantId>,
) -> ApiResult<Json<PlantDetail>> {
    match state.db.plant_detail(id).await? {
        Some(detail) => Ok(Json(detail)),
        None => Err(ApiError::not_found(format!("Plant {}", id))),
    }
}

/// Read-only access to bucket objects behind their public URLs.
pub async fn storage_object(
    State(state): State<AppState>,
    Path((bucket, path)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    if bucket != state.store.bucket() {
        return Err(ApiError::not_found("Bucket"));
    }
    let store = Arc::clone(&state.store);
    let lookup = path.clone();
    let bytes = tokio::task::spawn_blocking(move || store.get(&lookup))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    match bytes {
        Ok(Some(bytes)) => Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes)),
        Ok(None) => Err(ApiError::not_found("Object")),
        Err(e) => {
            tracing::debug!(path = %path, error = %format!("{:#}", e), "object lookup rejected");
            Err(ApiError::not_found("Object"))
        }
    }
}
