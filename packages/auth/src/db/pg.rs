use sqlx::PgPool;
use uuid::Uuid;

use super::store::{StoreError, UserStore};
use crate::models::{NewUser, TokenPair, User};

/// PostgreSQL-backed [`UserStore`] over the `users` table.
#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let created: User = sqlx::query_as(
            r#"
            INSERT INTO users (id, email, name, avatar_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.avatar_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::Duplicate(user.email.clone())
            }
            e => StoreError::Database(e),
        })?;
        Ok(created)
    }

    async fn update_tokens(&self, id: Uuid, tokens: &TokenPair) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET access_token = $1, refresh_token = $2, token_expiry = $3, updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(&tokens.access_token)
        .bind(&tokens.refresh_token)
        .bind(tokens.expires_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(id));
        }
        Ok(())
    }
}
