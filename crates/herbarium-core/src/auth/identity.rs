//! Identity provider client.
//!
//! Uses the curl crate (libcurl) against a hosted auth service:
//! `GET /auth/v1/user` resolves an access token to a user and
//! `POST /auth/v1/logout` revokes it. Calls block; run them from
//! `spawn_blocking` in async code.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::ServiceCredentials;

/// OAuth provider requested at the authorize endpoint.
pub const OAUTH_PROVIDER: &str = "google";

/// Signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity request failed: {0}")]
    Transport(String),
    #[error("identity provider returned HTTP {0}")]
    Status(u32),
    #[error("invalid identity response: {0}")]
    Malformed(String),
}

/// Operations the rest of the service needs from the identity provider.
pub trait IdentityProvider: Send + Sync {
    /// Where to send a browser to start OAuth sign-in.
    fn authorize_url(&self, redirect_to: &str) -> String;

    /// Resolve an access token. `Ok(None)` means the token is not (or no longer) valid.
    fn user_for_token(&self, token: &str) -> Result<Option<SessionUser>, IdentityError>;

    /// Revoke an access token.
    fn sign_out(&self, token: &str) -> Result<(), IdentityError>;
}

/// Client for the hosted identity service.
pub struct HostedIdentity {
    base: Url,
    anon_key: String,
}

impl HostedIdentity {
    pub fn new(creds: &ServiceCredentials) -> anyhow::Result<Self> {
        let base = Url::parse(&creds.service_url)
            .with_context(|| format!("invalid identity service URL: {}", creds.service_url))?;
        Ok(Self {
            base,
            anon_key: creds.anon_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut u = self.base.clone();
        let prefix = self.base.path().trim_end_matches('/').to_string();
        u.set_path(&format!("{}{}", prefix, path));
        u.set_query(None);
        u
    }

    /// Perform one request; returns status code and body.
    fn request(&self, post: bool, path: &str, token: &str) -> Result<(u32, Vec<u8>), IdentityError> {
        let transport = |e: curl::Error| IdentityError::Transport(e.to_string());
        let url = self.endpoint(path);
        let mut body = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str()).map_err(transport)?;
        easy.connect_timeout(Duration::from_secs(10)).map_err(transport)?;
        easy.timeout(Duration::from_secs(20)).map_err(transport)?;
        if post {
            easy.post(true).map_err(transport)?;
            easy.post_fields_copy(b"{}").map_err(transport)?;
        }

        let mut list = curl::easy::List::new();
        list.append(&format!("apikey: {}", self.anon_key)).map_err(transport)?;
        list.append(&format!("Authorization: Bearer {}", token)).map_err(transport)?;
        list.append("Accept: application/json").map_err(transport)?;
        if post {
            list.append("Content-Type: application/json").map_err(transport)?;
        }
        easy.http_headers(list).map_err(transport)?;

        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(transport)?;
            transfer.perform().map_err(transport)?;
        }

        let code = easy.response_code().map_err(transport)?;
        Ok((code, body))
    }
}

impl IdentityProvider for HostedIdentity {
    fn authorize_url(&self, redirect_to: &str) -> String {
        let mut u = self.endpoint("/auth/v1/authorize");
        u.query_pairs_mut()
            .append_pair("provider", OAUTH_PROVIDER)
            .append_pair("redirect_to", redirect_to);
        u.into()
    }

    fn user_for_token(&self, token: &str) -> Result<Option<SessionUser>, IdentityError> {
        if token.trim().is_empty() {
            return Ok(None);
        }
        let (code, body) = self.request(false, "/auth/v1/user", token)?;
        match code {
            200 => serde_json::from_slice::<SessionUser>(&body)
                .map(Some)
                .map_err(|e| IdentityError::Malformed(e.to_string())),
            401 | 403 => Ok(None),
            other => Err(IdentityError::Status(other)),
        }
    }

    fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        let (code, _) = self.request(true, "/auth/v1/logout", token)?;
        match code {
            200..=299 | 401 | 403 => Ok(()),
            other => Err(IdentityError::Status(other)),
        }
    }
}

/// Fixed token table. Serves local development without a hosted service and
/// tests that must not touch the network.
#[derive(Default)]
pub struct StaticIdentity {
    users: Mutex<HashMap<String, SessionUser>>,
}

impl StaticIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `token` as belonging to a user with `email`.
    pub fn with_user(self, token: &str, email: &str) -> Self {
        self.insert(token, email);
        self
    }

    pub fn insert(&self, token: &str, email: &str) {
        let user = SessionUser {
            id: format!("user-{}", email),
            email: Some(email.to_string()),
        };
        if let Ok(mut users) = self.users.lock() {
            users.insert(token.to_string(), user);
        }
    }
}

impl IdentityProvider for StaticIdentity {
    fn authorize_url(&self, redirect_to: &str) -> String {
        let mut u = match Url::parse("http://identity.invalid/auth/v1/authorize") {
            Ok(u) => u,
            Err(_) => return redirect_to.to_string(),
        };
        u.query_pairs_mut()
            .append_pair("provider", OAUTH_PROVIDER)
            .append_pair("redirect_to", redirect_to);
        u.into()
    }

    fn user_for_token(&self, token: &str) -> Result<Option<SessionUser>, IdentityError> {
        let users = self
            .users
            .lock()
            .map_err(|_| IdentityError::Transport("token table poisoned".into()))?;
        Ok(users.get(token).cloned())
    }

    fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| IdentityError::Transport("token table poisoned".into()))?;
        users.remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(url: &str) -> ServiceCredentials {
        ServiceCredentials {
            service_url: url.to_string(),
            anon_key: "anon".to_string(),
        }
    }

    #[test]
    fn authorize_url_encodes_redirect() {
        let id = HostedIdentity::new(&creds("https://svc.example.co")).unwrap();
        assert_eq!(
            id.authorize_url("http://127.0.0.1:3000/admin/callback"),
            "https://svc.example.co/auth/v1/authorize?provider=google&redirect_to=http%3A%2F%2F127.0.0.1%3A3000%2Fadmin%2Fcallback"
        );
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let id = HostedIdentity::new(&creds("http://127.0.0.1:9/project")).unwrap();
        assert_eq!(id.endpoint("/auth/v1/user").as_str(), "http://127.0.0.1:9/project/auth/v1/user");
    }

    #[test]
    fn invalid_service_url_is_rejected() {
        assert!(HostedIdentity::new(&creds("not a url")).is_err());
    }

    #[test]
    fn static_identity_signs_out_tokens() {
        let id = StaticIdentity::new().with_user("t1", "ana@example.org");
        let user = id.user_for_token("t1").unwrap().unwrap();
        assert_eq!(user.email.as_deref(), Some("ana@example.org"));
        id.sign_out("t1").unwrap();
        assert_eq!(id.user_for_token("t1").unwrap(), None);
    }
}
