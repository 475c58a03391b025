//! Sign-in entry, OAuth callback, and sign-out.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use herbarium_core::auth::gate::login_error_message;
use herbarium_core::auth::{complete_sign_in, CallbackOutcome, IdentityProvider, SESSION_COOKIE};
use serde::{Deserialize, Serialize};

use crate::http::extract::session_token;
use crate::http::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub authorize_url: String,
    pub error: Option<&'static str>,
}

pub async fn login(
    State(state): State<AppState>,
    Query(params): Query<LoginParams>,
) -> Json<LoginPage> {
    let redirect_to = format!("{}/admin/callback", state.config.base_url());
    Json(LoginPage {
        authorize_url: state.sessions.provider().authorize_url(&redirect_to),
        error: params.error.as_deref().and_then(login_error_message),
    })
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub access_token: Option<String>,
}

fn session_cookie(token: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, token
    ))
    .map_err(|_| ApiError::BadRequest("Invalid access token.".into()))
}

pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> ApiResult<Response> {
    let token = params
        .access_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let Some(token) = token else {
        return Ok(Redirect::to(CallbackOutcome::SignInFailed.location()).into_response());
    };

    let outcome = complete_sign_in(&state.sessions, &state.db, token).await;
    match &outcome {
        CallbackOutcome::Admin(admin) => tracing::info!(email = %admin.email, "admin signed in"),
        CallbackOutcome::NotAdmin { email } => tracing::warn!(
            email = email.as_deref().unwrap_or("-"),
            "signed-in user is not an admin"
        ),
        CallbackOutcome::SignInFailed => tracing::warn!("sign-in callback could not resolve a user"),
    }

    let mut resp = Redirect::to(outcome.location()).into_response();
    if outcome.keeps_session() {
        resp.headers_mut()
            .insert(header::SET_COOKIE, session_cookie(token)?);
    }
    Ok(resp)
}

pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        if let Err(e) = state.sessions.sign_out(&token).await {
            tracing::warn!(error = %e, "provider sign-out failed");
        }
    }
    let mut resp = Redirect::to("/").into_response();
    resp.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_static("herbarium_session=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax"),
    );
    resp
}
