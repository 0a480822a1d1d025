//! Sumnotes web server: Google sign-in backed by PostgreSQL users and sessions.

use std::time::Duration;

use anyhow::Context as _;
use auth::auth::{GoogleProvider, OAuthConfig};
use auth::db::PgUserStore;
use auth::AuthService;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod application;
mod database;
mod routes;
mod settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = settings::Settings::new().context("Failed to load settings")?;

    let pool = database::connection_pool(&settings.database).await?;
    let session_store = database::session_store(&pool).await?;

    let config = OAuthConfig::google(
        &settings.google.id,
        &settings.google.secret,
        &settings.google.callback,
    )
    .context("Invalid Google OAuth configuration")?;
    let provider = GoogleProvider::new(config).context("Failed to build Google provider")?;
    let auth = AuthService::new(provider, PgUserStore::new(pool));

    let _cleanup = application::spawn_cleanup_task(
        session_store.clone(),
        Duration::from_secs(settings.cleanup.minutes.max(1) * 60),
    );

    let app = application::app(auth, session_store, &settings.session)?;
    application::serve(app, &settings.server.address()).await
}
