use std::future::Future;

use uuid::Uuid;

use crate::models::{NewUser, TokenPair, User};

/// User record store failures. An absent record is not an error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    #[cfg(feature = "server")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("a user with email {0} already exists")]
    Duplicate(String),

    #[error("user {0} does not exist")]
    Missing(Uuid),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable storage of one record per end user.
pub trait UserStore: Send + Sync + 'static {
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;

    fn find_by_id(&self, id: Uuid) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;

    fn create(&self, user: NewUser) -> impl Future<Output = Result<User, StoreError>> + Send;

    fn update_tokens(
        &self,
        id: Uuid,
        tokens: &TokenPair,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
