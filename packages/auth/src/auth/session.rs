//! Session attribute handling.
//!
//! The session store (tower-sessions) owns persistence and the cookie; this module
//! owns what the attributes mean. Two keys are used:
//!
//! - [`SESSION_USER_ID_KEY`]: the authenticated user's id, as a string.
//! - [`SESSION_PENDING_KEY`]: the [`PendingAuthorization`] between login start and callback.

use time::{Duration, OffsetDateTime};
use tower_sessions::session::Error;
use tower_sessions::{Expiry, Session};
use uuid::Uuid;

use super::provider::PendingAuthorization;

/// Key for storing user ID in session.
pub const SESSION_USER_ID_KEY: &str = "user_id";

/// Key for the in-flight authorization state.
pub const SESSION_PENDING_KEY: &str = "oauth_pending";

/// What the session says about who is signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionUser {
    /// No cookie, or the store no longer holds the session.
    NoSession,
    /// A live session without a usable `user_id`.
    Anonymous,
    User(Uuid),
}

/// Load the session and resolve its `user_id` attribute.
pub async fn current_user(session: &Session) -> Result<SessionUser, Error> {
    // Read raw so a value of the wrong type counts as no user, not a store failure.
    let user_id = session.get_value(SESSION_USER_ID_KEY).await?;

    // The id is only known after the load above.
    if session.id().is_none() {
        return Ok(SessionUser::NoSession);
    }

    Ok(user_id
        .as_ref()
        .and_then(|value| value.as_str())
        .and_then(|id| Uuid::parse_str(id).ok())
        .map_or(SessionUser::Anonymous, SessionUser::User))
}

/// Bind `user_id` to a fresh session id and persist it.
pub async fn bind_user(session: &Session, user_id: Uuid) -> Result<(), Error> {
    session.cycle_id().await?;
    session
        .insert(SESSION_USER_ID_KEY, user_id.to_string())
        .await?;
    session.save().await
}

/// Remember the authorization state until the provider calls back.
pub async fn store_pending(session: &Session, pending: &PendingAuthorization) -> Result<(), Error> {
    session.insert(SESSION_PENDING_KEY, pending).await?;
    session.save().await
}

/// Take the authorization state; it is single use.
pub async fn take_pending(session: &Session) -> Result<Option<PendingAuthorization>, Error> {
    session.remove(SESSION_PENDING_KEY).await
}

/// Mark the session for immediate deletion and persist that.
///
/// Stores refuse to load a record past its expiry, and the session layer answers
/// with a zero max-age cookie.
pub async fn force_expire(session: &Session) -> Result<(), Error> {
    let expired = OffsetDateTime::now_utc() - Duration::seconds(1);
    session.set_expiry(Some(Expiry::AtDateTime(expired)));
    session.save().await
}

/// Delete the session from the store and clear its data.
pub async fn end(session: &Session) -> Result<(), Error> {
    session.flush().await
}
