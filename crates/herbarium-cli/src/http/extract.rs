//! Request extractors: the session token and the admin gate.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use axum::response::Redirect;
use herbarium_core::auth::gate::LOGIN_PATH;
use herbarium_core::auth::{check_admin, AccessDecision, AdminUser, SESSION_COOKIE};

use super::state::AppState;

/// Session token from `Authorization: Bearer` or the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Verified admin. Rejection redirects (303) to the login entry.
#[derive(Debug, Clone)]
pub struct Admin(pub AdminUser);

impl FromRequestParts<AppState> for Admin {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers);
        match check_admin(&state.sessions, &state.db, token.as_deref()).await {
            AccessDecision::Granted(admin) => Ok(Admin(admin)),
            denied => {
                tracing::debug!(path = %parts.uri.path(), ?denied, "admin route rejected");
                Err(Redirect::to(denied.redirect_to().unwrap_or(LOGIN_PATH)))
            }
        }
    }
}
