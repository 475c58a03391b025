use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use herbarium_core::forms::ValidationErrors;
use herbarium_core::inventory_db::{AdjustError, StoreError};
use herbarium_core::upload::UploadError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Every violation found in a form, reported together.
    #[error("{}", .0.join(". "))]
    Validation(Vec<String>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        ApiError::NotFound(format!("{} not found", what))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
            StoreError::AlreadyExists(_) => ApiError::Conflict(err.to_string()),
            StoreError::UnknownReference | StoreError::Constraint(_) => {
                ApiError::BadRequest(err.to_string())
            }
            StoreError::PermissionDenied | StoreError::MissingTable | StoreError::Other(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::UnsupportedType(_) => ApiError::UnsupportedMediaType(err.to_string()),
            UploadError::TooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
            UploadError::Decode(_) => ApiError::BadRequest(err.to_string()),
            UploadError::Timeout(_) => ApiError::Timeout(err.to_string()),
            UploadError::BucketUnavailable { .. } | UploadError::Storage(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(v) = err.downcast_ref::<ValidationErrors>() {
            return ApiError::Validation(v.messages());
        }
        if let Some(a) = err.downcast_ref::<AdjustError>() {
            return match a {
                AdjustError::PlantNotFound(_) => ApiError::NotFound(a.to_string()),
                AdjustError::ZeroChange
                | AdjustError::NegativeResult { .. }
                | AdjustError::OutOfRange { .. } => ApiError::BadRequest(a.to_string()),
            };
        }
        if let Some(u) = err.downcast_ref::<UploadError>() {
            return u.clone().into();
        }
        match StoreError::classify(&err) {
            Some(store) => {
                let api: ApiError = store.into();
                if api.status().is_server_error() {
                    tracing::error!(error = %format!("{:#}", err), "store failure");
                }
                api
            }
            None => {
                tracing::error!(error = %format!("{:#}", err), "request failed");
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({
            "error": self.to_string(),
            "status": status.as_u16()
        });
        if let ApiError::Validation(messages) = &self {
            body["errors"] = json!(messages);
        }
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_status_codes() {
        let e: ApiError = anyhow::Error::new(StoreError::AlreadyExists("Category already exists."))
            .context("add category")
            .into();
        assert_eq!(e.status(), StatusCode::CONFLICT);
        assert_eq!(e.to_string(), "Category already exists.");

        let e: ApiError = anyhow::Error::new(StoreError::UnknownReference).into();
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);

        let e: ApiError = anyhow::Error::new(StoreError::MissingTable).into();
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.to_string(), "Table not found. Please run database migrations.");
    }

    #[test]
    fn adjust_and_upload_errors() {
        let e: ApiError = anyhow::Error::new(AdjustError::NegativeResult {
            current: 2,
            change: -5,
        })
        .into();
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);

        let e: ApiError = anyhow::Error::new(AdjustError::OutOfRange {
            current: 5,
            change: i64::MAX,
        })
        .into();
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);

        let e: ApiError = UploadError::TooLarge {
            size: 6_000_000,
            max: 5 * 1024 * 1024,
        }
        .into();
        assert_eq!(e.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(e.to_string(), "File too large. Maximum size is 5 MB.");

        let e: ApiError = UploadError::Timeout(60).into();
        assert_eq!(e.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn unknown_failures_are_internal() {
        let e: ApiError = anyhow::anyhow!("disk on fire").into();
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
