use std::time::Duration;

use anyhow::Context as _;
use auth::{require_user, AuthService, IdentityProvider, UserStore};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::{Key, SameSite};
use tower_sessions::service::SignedCookie;
use tower_sessions::{ExpiredDeletion, Expiry, SessionManagerLayer, SessionStore};

use crate::routes;
use crate::settings;

/// Routes, with `/success` and `/me` behind the access gate.
pub fn router<P: IdentityProvider, U: UserStore>(auth: AuthService<P, U>) -> Router {
    let protected = Router::new()
        .route("/success", get(routes::success))
        .route("/me", get(routes::me))
        .route_layer(middleware::from_fn_with_state(
            auth.clone(),
            require_user::<P, U>,
        ));

    Router::new()
        .route("/", get(routes::home::<P, U>))
        .route("/auth/{provider}", get(routes::login::<P, U>))
        .route("/auth/{provider}/callback", get(routes::callback::<P, U>))
        .route("/logout", post(routes::logout::<P, U>))
        .merge(protected)
        .with_state(auth)
}

/// Signed session cookie over `store`.
pub fn session_layer<S: SessionStore + Clone>(
    store: S,
    settings: &settings::Session,
) -> anyhow::Result<SessionManagerLayer<S, SignedCookie>> {
    let key = Key::try_from(settings.secret.as_bytes())
        .context("session secret must be at least 64 bytes")?;

    Ok(SessionManagerLayer::new(store)
        .with_name(settings.name.clone())
        .with_secure(settings.secure)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_path("/")
        .with_expiry(Expiry::OnInactivity(time::Duration::days(settings.days)))
        .with_signed(key))
}

/// The full application: routes, session layer and request tracing.
pub fn app<P, U, S>(
    auth: AuthService<P, U>,
    store: S,
    settings: &settings::Session,
) -> anyhow::Result<Router>
where
    P: IdentityProvider,
    U: UserStore,
    S: SessionStore + Clone,
{
    Ok(router(auth)
        .layer(session_layer(store, settings)?)
        .layer(TraceLayer::new_for_http()))
}

/// Spawn a background task that deletes expired session records every `period`.
pub fn spawn_cleanup_task<S>(store: S, period: Duration) -> JoinHandle<()>
where
    S: ExpiredDeletion + Clone,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);

        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match store.delete_expired().await {
                Ok(()) => tracing::debug!("Expired sessions deleted"),
                Err(e) => tracing::warn!(error = %e, "Session cleanup failed"),
            }
        }
    })
}

pub async fn serve(router: Router, address: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
