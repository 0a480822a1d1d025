use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::auth::ProviderError;
use crate::db::StoreError;

/// Failures of the login, freshness and access-gate paths.
///
/// Each variant maps once, in [`IntoResponse`], to the response the caller sees.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AuthError {
    /// The provider rejected or could not complete the callback.
    #[error("provider authentication failed: {0}")]
    ProviderAuthFailed(#[source] ProviderError),

    #[error("user lookup failed: {0}")]
    StoreLookupFailed(#[source] StoreError),

    #[error("user write failed: {0}")]
    StoreWriteFailed(#[source] StoreError),

    #[error("session lookup failed: {0}")]
    SessionLookupFailed(#[source] tower_sessions::session::Error),

    #[error("session write failed: {0}")]
    SessionWriteFailed(#[source] tower_sessions::session::Error),

    /// No session cookie, or the session is gone from the store.
    #[error("no session")]
    NoSession,

    /// The session carries no usable user id.
    #[error("no active user in session")]
    NoActiveUser,

    /// The session names a user the store does not know.
    #[error("session user not found")]
    UserNotFound,

    /// The provider declined to renew the access token.
    #[error("token refresh failed: {0}")]
    RefreshFailed(#[source] ProviderError),

    /// A refresh failed and the cleared session could not be persisted.
    #[error("could not invalidate session after failed refresh: {0}")]
    SessionInvalidationFailed(#[source] tower_sessions::session::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NoSession | Self::NoActiveUser | Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::RefreshFailed(_) => StatusCode::UNAUTHORIZED,
            Self::ProviderAuthFailed(_)
            | Self::StoreLookupFailed(_)
            | Self::StoreWriteFailed(_)
            | Self::SessionLookupFailed(_)
            | Self::SessionWriteFailed(_)
            | Self::SessionInvalidationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        match status {
            StatusCode::NOT_FOUND => {
                tracing::debug!(error = %self, "Request not authenticated");
                (status, "Not found").into_response()
            }
            StatusCode::UNAUTHORIZED => {
                tracing::info!(error = %self, "Access revoked");
                (status, "Unauthorized").into_response()
            }
            _ => {
                tracing::error!(error = %self, "Auth internal error");
                (status, "Internal error").into_response()
            }
        }
    }
}
