//! Admin-only routes. Each handler takes [`Admin`], so the gate runs once
//! per request before anything else.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use herbarium_core::catalog::dashboard::{load_dashboard, Dashboard, DashboardParams, DashboardQuery};
use herbarium_core::forms::{submit_new_plant, submit_plant_changes};
use herbarium_core::inventory_db::{
    Category, HistoryEntry, InventoryAdjustment, InventoryStats, InventorySummary, LowStockPlant,
    PlantDetail, PlantDraft, PlantId,
};
use herbarium_core::upload::delete_plant_image;
use std::sync::Arc;

use crate::http::extract::Admin;
use crate::http::{ApiError, ApiResult, AppState};

pub async fn dashboard(
    Admin(_): Admin,
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> ApiResult<Json<Dashboard>> {
    let query = DashboardQuery::from_params(&params);
    Ok(Json(load_dashboard(&state.db, &query).await?))
}

pub async fn categories(
    Admin(_): Admin,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.list_categories().await?))
}

async fn detail_or_404(state: &AppState, id: PlantId) -> ApiResult<PlantDetail> {
    state
        .db
        .plant_detail(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Plant {}", id)))
}

/// Best-effort removal of an image that is no longer referenced.
async fn discard_image(state: &AppState, url: String) {
    let store = Arc::clone(&state.store);
    let removed = tokio::task::spawn_blocking(move || {
        let removed = delete_plant_image(store.as_ref(), &url);
        (removed, url)
    })
    .await;
    match removed {
        Ok((true, url)) => tracing::info!(url = %url, "image deleted"),
        Ok((false, url)) => tracing::warn!(url = %url, "image not deleted"),
        Err(e) => tracing::warn!(error = %e, "image delete task failed"),
    }
}

pub async fn create_plant(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Json(draft): Json<PlantDraft>,
) -> ApiResult<(StatusCode, Json<PlantDetail>)> {
    let id = submit_new_plant(
        &state.db,
        &draft,
        state.config.default_minimum_stock,
        &admin.email,
    )
    .await?;
    tracing::info!(plant_id = id, by = %admin.email, "plant created");
    Ok((StatusCode::CREATED, Json(detail_or_404(&state, id).await?)))
}

/// Edit-form load: the stored plant with its categories and derived status.
pub async fn edit_form(
    Admin(_): Admin,
    State(state): State<AppState>,
    Path(id): Path<PlantId>,
) -> ApiResult<Json<PlantDetail>> {
    Ok(Json(detail_or_404(&state, id).await?))
}

pub async fn update_plant(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<PlantId>,
    Json(draft): Json<PlantDraft>,
) -> ApiResult<Json<PlantDetail>> {
    let outcome = submit_plant_changes(
        &state.db,
        id,
        &draft,
        state.config.default_minimum_stock,
        &admin.email,
    )
    .await?;
    tracing::info!(plant_id = id, by = %admin.email, "plant updated");

    let detail = detail_or_404(&state, id).await?;
    if let Some(old) = outcome.previous_image_url {
        if detail.plant.image_url.as_deref() != Some(old.as_str()) {
            discard_image(&state, old).await;
        }
    }
    Ok(Json(detail))
}

pub async fn delete_plant(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<PlantId>,
) -> ApiResult<StatusCode> {
    let Some(plant) = state.db.delete_plant(id).await? else {
        return Err(ApiError::not_found(format!("Plant {}", id)));
    };
    tracing::info!(plant_id = id, by = %admin.email, "plant deleted");
    if let Some(url) = plant.image_url {
        discard_image(&state, url).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn adjust(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<PlantId>,
    Json(adjustment): Json<InventoryAdjustment>,
) -> ApiResult<Json<HistoryEntry>> {
    let entry = state.db.adjust_quantity(id, &adjustment, &admin.email).await?;
    Ok(Json(entry))
}

pub async fn history(
    Admin(_): Admin,
    State(state): State<AppState>,
    Path(id): Path<PlantId>,
) -> ApiResult<Json<Vec<HistoryEntry>>> {
    if state.db.get_plant(id).await?.is_none() {
        return Err(ApiError::not_found(format!("Plant {}", id)));
    }
    Ok(Json(state.db.history_for_plant(id).await?))
}

pub async fn low_stock(
    Admin(_): Admin,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<LowStockPlant>>> {
    Ok(Json(state.db.low_stock_plants().await?))
}

pub async fn stats(
    Admin(_): Admin,
    State(state): State<AppState>,
) -> ApiResult<Json<InventoryStats>> {
    Ok(Json(state.db.inventory_stats().await?))
}

pub async fn summary(
    Admin(_): Admin,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<InventorySummary>>> {
    Ok(Json(state.db.inventory_summary().await?))
}
