//! Process-wide session context.
//!
//! One `SessionContext` is created at startup and shared. It resolves tokens
//! through the identity provider and broadcasts sign-in/sign-out events to
//! every live `Subscription`. Dropping a subscription unsubscribes it.

use std::sync::Arc;
use tokio::sync::broadcast;

use super::identity::{IdentityError, IdentityProvider, SessionUser};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(SessionUser),
    SignedOut { email: Option<String> },
}

pub struct SessionContext {
    provider: Arc<dyn IdentityProvider>,
    events: broadcast::Sender<AuthEvent>,
}

impl SessionContext {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { provider, events }
    }

    pub fn provider(&self) -> &dyn IdentityProvider {
        self.provider.as_ref()
    }

    /// Resolve a token to its user without announcing anything.
    pub async fn current_user(&self, token: &str) -> Result<Option<SessionUser>, IdentityError> {
        let provider = Arc::clone(&self.provider);
        let token = token.to_string();
        tokio::task::spawn_blocking(move || provider.user_for_token(&token))
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?
    }

    /// Resolve a freshly issued token and announce the sign-in.
    pub async fn sign_in(&self, token: &str) -> Result<Option<SessionUser>, IdentityError> {
        let user = self.current_user(token).await?;
        if let Some(u) = &user {
            tracing::info!(email = u.email.as_deref().unwrap_or("-"), "signed in");
            self.announce(AuthEvent::SignedIn(u.clone()));
        }
        Ok(user)
    }

    /// Revoke a token at the provider and announce the sign-out.
    pub async fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        let email = match self.current_user(token).await {
            Ok(user) => user.and_then(|u| u.email),
            Err(e) => {
                tracing::debug!(error = %e, "could not resolve user before sign-out");
                None
            }
        };
        let provider = Arc::clone(&self.provider);
        let token = token.to_string();
        tokio::task::spawn_blocking(move || provider.sign_out(&token))
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))??;
        tracing::info!(email = email.as_deref().unwrap_or("-"), "signed out");
        self.announce(AuthEvent::SignedOut { email });
        Ok(())
    }

    /// Broadcast an event. Returns how many subscriptions received it.
    fn announce(&self, event: AuthEvent) -> usize {
        match self.events.send(event) {
            Ok(n) => n,
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!(?event, "auth event dropped, no subscribers");
                0
            }
        }
    }

    /// Receive every event announced from now on.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.events.subscribe(),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }
}

/// Handle returned by [`SessionContext::subscribe`].
pub struct Subscription {
    rx: broadcast::Receiver<AuthEvent>,
}

impl Subscription {
    /// Next event; `None` once the context is gone. Events missed because
    /// the subscriber fell behind are skipped.
    pub async fn recv(&mut self) -> Option<AuthEvent> {
        loop {
            match self.rx.recv().await {
                Ok(ev) => return Some(ev),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "auth event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<AuthEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(ev) => return Some(ev),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
