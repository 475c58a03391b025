//! Admin authorization gate.
//!
//! Access is granted only when the signed-in user's email has exactly one
//! `role = 'admin'` row. Every other outcome, lookup failures included, denies.

use serde::Serialize;

use super::identity::SessionUser;
use super::session::SessionContext;
use crate::inventory_db::InventoryDb;

/// Login entry point that denied requests are sent back to.
pub const LOGIN_PATH: &str = "/admin";
/// Landing page after a successful admin sign-in.
pub const DASHBOARD_PATH: &str = "/admin/dashboard";

/// Verified admin, handed to admin-only routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUser {
    pub user_id: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Granted(AdminUser),
    SignInRequired,
    Denied,
}

impl AccessDecision {
    /// Where a rejected request is redirected; `None` when access was granted.
    pub fn redirect_to(&self) -> Option<&'static str> {
        match self {
            AccessDecision::Granted(_) => None,
            AccessDecision::SignInRequired => Some("/admin?error=sign_in_required"),
            AccessDecision::Denied => Some("/admin?error=access_denied"),
        }
    }
}

/// Decide whether an already resolved user is an admin.
pub async fn authorize_user(db: &InventoryDb, user: &SessionUser) -> AccessDecision {
    let Some(email) = user.email.as_deref().filter(|e| !e.trim().is_empty()) else {
        tracing::warn!(user_id = %user.id, "admin check: user has no email");
        return AccessDecision::Denied;
    };
    match db.count_admin_rows(email).await {
        Ok(1) => AccessDecision::Granted(AdminUser {
            user_id: user.id.clone(),
            email: email.to_lowercase(),
        }),
        Ok(0) => {
            tracing::warn!(email, "admin check: not a registered admin");
            AccessDecision::Denied
        }
        Ok(n) => {
            tracing::warn!(email, rows = n, "admin check: ambiguous admin rows");
            AccessDecision::Denied
        }
        Err(e) => {
            tracing::warn!(email, error = %format!("{:#}", e), "admin check failed");
            AccessDecision::Denied
        }
    }
}

/// Gate for admin-only routes: resolve the session token, then check the
/// authorization table.
pub async fn check_admin(
    sessions: &SessionContext,
    db: &InventoryDb,
    token: Option<&str>,
) -> AccessDecision {
    let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
        return AccessDecision::SignInRequired;
    };
    match sessions.current_user(token).await {
        Ok(Some(user)) => authorize_user(db, &user).await,
        Ok(None) => AccessDecision::SignInRequired,
        Err(e) => {
            tracing::warn!(error = %e, "admin check: identity lookup failed");
            AccessDecision::Denied
        }
    }
}

/// Result of the OAuth callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Admin signed in; keep the session and go to the dashboard.
    Admin(AdminUser),
    /// Signed in but not an admin; the session stays valid.
    NotAdmin { email: Option<String> },
    /// No user could be resolved from the callback.
    SignInFailed,
}

impl CallbackOutcome {
    pub fn location(&self) -> &'static str {
        match self {
            CallbackOutcome::Admin(_) => DASHBOARD_PATH,
            CallbackOutcome::NotAdmin { .. } => "/?error=access_denied",
            CallbackOutcome::SignInFailed => "/admin?error=sign_in_failed",
        }
    }

    /// True when the session cookie should be set.
    pub fn keeps_session(&self) -> bool {
        !matches!(self, CallbackOutcome::SignInFailed)
    }
}

/// Complete a sign-in: announce it, then run the admin check.
pub async fn complete_sign_in(
    sessions: &SessionContext,
    db: &InventoryDb,
    token: &str,
) -> CallbackOutcome {
    let user = match sessions.sign_in(token).await {
        Ok(Some(user)) => user,
        Ok(None) => return CallbackOutcome::SignInFailed,
        Err(e) => {
            tracing::warn!(error = %e, "sign-in callback: identity lookup failed");
            return CallbackOutcome::SignInFailed;
        }
    };
    match authorize_user(db, &user).await {
        AccessDecision::Granted(admin) => CallbackOutcome::Admin(admin),
        _ => CallbackOutcome::NotAdmin { email: user.email },
    }
}

/// Message shown on the login page for an `error` query value.
pub fn login_error_message(code: &str) -> Option<&'static str> {
    match code {
        "access_denied" => Some(
            "Access denied. Your account is not a registered admin. \
             Please contact the administrator to grant access.",
        ),
        "sign_in_required" => Some("Please sign in to access the admin area."),
        "sign_in_failed" => Some("Authentication failed. Please try again."),
        _ => None,
    }
}
