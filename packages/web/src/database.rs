use anyhow::Context as _;
use sqlx::PgPool;
use tower_sessions_sqlx_store::PostgresStore;

use crate::settings::Database;

/// Open the connection pool and bring the `users` table up to date.
pub async fn connection_pool(settings: &Database) -> anyhow::Result<PgPool> {
    let pool = auth::db::connect(&settings.url(), settings.connections)
        .await
        .context("Failed to connect to database")?;
    auth::db::migrate(&pool)
        .await
        .context("Failed to run migrations")?;
    Ok(pool)
}

/// Session store sharing `pool`, with its table created if missing.
pub async fn session_store(pool: &PgPool) -> anyhow::Result<PostgresStore> {
    let store = PostgresStore::new(pool.clone());
    store
        .migrate()
        .await
        .context("Failed to create session table")?;
    Ok(store)
}
