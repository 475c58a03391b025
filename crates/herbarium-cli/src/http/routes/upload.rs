use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use herbarium_core::upload::{upload_plant_image, ImageUpload, UploadedImage};
use serde::Deserialize;
use std::sync::Arc;

use crate::http::extract::Admin;
use crate::http::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub filename: Option<String>,
}

/// `POST /admin/images`: raw image body, declared type in `Content-Type`.
pub async fn upload_image(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<UploadedImage>)> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let upload = ImageUpload {
        filename: params.filename,
        content_type,
        data: body.to_vec(),
    };
    let image = upload_plant_image(Arc::clone(&state.store), upload, &state.config.upload()).await?;
    tracing::info!(by = %admin.email, url = %image.url, "image uploaded");
    Ok((StatusCode::CREATED, Json(image)))
}
