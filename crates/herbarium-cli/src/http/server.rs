use anyhow::{Context, Result};
use herbarium_core::auth::{AuthEvent, Subscription};
use herbarium_core::logging::AUDIT_TARGET;
use tokio::task::JoinHandle;

use super::routes::create_router;
use super::state::AppState;

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let audit = spawn_auth_audit(state.sessions.subscribe());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("herbarium listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    audit.abort();
    tracing::info!("server stopped");
    Ok(())
}

/// Log every sign-in and sign-out announced by the session context.
fn spawn_auth_audit(mut events: Subscription) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                AuthEvent::SignedIn(user) => tracing::info!(
                    target: AUDIT_TARGET,
                    user_id = %user.id,
                    email = user.email.as_deref().unwrap_or("-"),
                    "session started"
                ),
                AuthEvent::SignedOut { email } => tracing::info!(
                    target: AUDIT_TARGET,
                    email = email.as_deref().unwrap_or("-"),
                    "session ended"
                ),
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
