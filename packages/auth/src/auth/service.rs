//! # Session and token lifecycle
//!
//! [`AuthService`] ties a provider login to a durable user record and decides, on
//! every protected request, whether the held access token can still be used.
//!
//! ## Login
//!
//! [`begin_login`](AuthService::begin_login) stores the provider's CSRF state and PKCE
//! verifier in the session and returns the authorization URL.
//! [`complete_login`](AuthService::complete_login) then:
//!
//! 1. takes the pending authorization from the session and has the provider complete
//!    authentication;
//! 2. looks the user up by email, creating the record on first login;
//! 3. writes the token pair just obtained into the record, unconditionally;
//! 4. binds the record's id to a freshly cycled session and saves it.
//!
//! The store writes and the session write are not transactional. A failure after
//! step 3 leaves the new tokens in place and no session bound.
//!
//! ## Per-request freshness
//!
//! [`authorize`](AuthService::authorize) reads `user_id` from the session, loads the
//! record and classifies its token. A stale token is refreshed through the provider
//! ([`ensure_fresh`](AuthService::ensure_fresh)); when that fails the session is
//! force-expired ([`invalidate`](AuthService::invalidate)) and the request denied.
//! Nothing about the decision is cached across requests.
//!
//! Refreshes for the same user are serialised in-process: a request that waited on
//! another's refresh re-reads the record and skips the provider call if it is now fresh.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tower_sessions::Session;
use uuid::Uuid;

use super::provider::{AuthCallback, IdentityProvider, ProviderError};
use super::session::{self, SessionUser};
use crate::db::UserStore;
use crate::error::AuthError;
use crate::models::{NewUser, TokenState, User};

/// Per-user refresh locks. Entries are dropped once nobody holds them.
#[derive(Debug, Default)]
struct RefreshLocks {
    locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl RefreshLocks {
    fn entry(&self, user_id: Uuid) -> RefreshEntry<'_> {
        let lock = self
            .locks
            .lock()
            .unwrap()
            .entry(user_id)
            .or_default()
            .clone();
        RefreshEntry {
            locks: self,
            user_id,
            lock,
        }
    }

    fn release(&self, user_id: Uuid, lock: &Arc<tokio::sync::Mutex<()>>) {
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        // One reference in the map, one held by the releasing entry.
        if Arc::strong_count(lock) <= 2 {
            locks.remove(&user_id);
        }
    }
}

/// A claim on one user's refresh lock. Dropping it releases the map entry, including
/// when the request holding it is cancelled.
struct RefreshEntry<'a> {
    locks: &'a RefreshLocks,
    user_id: Uuid,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for RefreshEntry<'_> {
    fn drop(&mut self) {
        self.locks.release(self.user_id, &self.lock);
    }
}

/// Login completion, token freshness and session invalidation over injected
/// provider and user store.
pub struct AuthService<P, U> {
    provider: Arc<P>,
    users: Arc<U>,
    refresh_locks: Arc<RefreshLocks>,
}

// Manual Clone: avoid derive adding `P: Clone, U: Clone` bounds.
impl<P, U> Clone for AuthService<P, U> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            users: self.users.clone(),
            refresh_locks: self.refresh_locks.clone(),
        }
    }
}

impl<P: IdentityProvider, U: UserStore> AuthService<P, U> {
    pub fn new(provider: P, users: U) -> Self {
        Self::from_shared(Arc::new(provider), Arc::new(users))
    }

    pub fn from_shared(provider: Arc<P>, users: Arc<U>) -> Self {
        Self {
            provider,
            users,
            refresh_locks: Arc::default(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn users(&self) -> &U {
        &self.users
    }

    /// Start a login: remember the authorization state in the session and return
    /// the URL to send the user agent to.
    pub async fn begin_login(&self, session: &Session) -> Result<String, AuthError> {
        let request = self.provider.authorization_request();
        session::store_pending(session, &request.pending)
            .await
            .map_err(AuthError::SessionWriteFailed)?;
        Ok(request.url)
    }

    /// Finish a login from the provider's callback and bind the user to the session.
    pub async fn complete_login(
        &self,
        session: &Session,
        callback: AuthCallback,
    ) -> Result<User, AuthError> {
        let pending = session::take_pending(session)
            .await
            .map_err(AuthError::SessionLookupFailed)?
            .ok_or_else(|| {
                AuthError::ProviderAuthFailed(ProviderError::Callback(
                    "no login in progress".to_string(),
                ))
            })?;

        let identity = self
            .provider
            .complete_authentication(callback, pending)
            .await
            .map_err(AuthError::ProviderAuthFailed)?;

        let email = identity.email.trim().to_lowercase();

        let existing = self
            .users
            .find_by_email(&email)
            .await
            .map_err(AuthError::StoreLookupFailed)?;

        let mut user = match existing {
            Some(user) => user,
            None => {
                let user = self
                    .users
                    .create(NewUser {
                        email,
                        name: identity.name,
                        avatar_url: identity.avatar_url,
                    })
                    .await
                    .map_err(AuthError::StoreWriteFailed)?;
                tracing::info!(user_id = %user.id, "Created user on first login");
                user
            }
        };

        self.users
            .update_tokens(user.id, &identity.tokens)
            .await
            .map_err(AuthError::StoreWriteFailed)?;
        user.set_tokens(&identity.tokens, Utc::now());

        session::bind_user(session, user.id)
            .await
            .map_err(AuthError::SessionWriteFailed)?;

        tracing::info!(user_id = %user.id, provider = self.provider.name(), "Login completed");
        Ok(user)
    }

    /// Return `user` unchanged if its token is fresh, otherwise refresh it through
    /// the provider and persist the new pair.
    ///
    /// On [`AuthError::RefreshFailed`] the stored tokens are untouched.
    pub async fn ensure_fresh(&self, user: User) -> Result<User, AuthError> {
        if user.token_state(Utc::now()) == TokenState::Fresh {
            return Ok(user);
        }

        let entry = self.refresh_locks.entry(user.id);
        let _guard = entry.lock.lock().await;
        self.refresh_locked(user).await
    }

    async fn refresh_locked(&self, user: User) -> Result<User, AuthError> {
        // Another request may have refreshed while we waited for the lock.
        let mut user = self
            .users
            .find_by_id(user.id)
            .await
            .map_err(AuthError::StoreLookupFailed)?
            .ok_or(AuthError::UserNotFound)?;

        if user.token_state(Utc::now()) == TokenState::Fresh {
            tracing::debug!(user_id = %user.id, "Token refreshed by a concurrent request");
            return Ok(user);
        }

        let refresh_token = user
            .refresh_token()
            .ok_or(AuthError::RefreshFailed(ProviderError::MissingRefreshToken))?;

        let tokens = self
            .provider
            .refresh(refresh_token)
            .await
            .map_err(AuthError::RefreshFailed)?;

        self.users
            .update_tokens(user.id, &tokens)
            .await
            .map_err(AuthError::StoreWriteFailed)?;
        user.set_tokens(&tokens, Utc::now());

        tracing::debug!(user_id = %user.id, expires_at = %tokens.expires_at, "Access token refreshed");
        Ok(user)
    }

    /// Force-expire the session so its `user_id` no longer resolves.
    pub async fn invalidate(&self, session: &Session) -> Result<(), AuthError> {
        session::force_expire(session)
            .await
            .map_err(AuthError::SessionInvalidationFailed)
    }

    /// Resolve the session to a user holding a usable access token.
    ///
    /// Every failure denies. A failed refresh also invalidates the session; if that
    /// cannot be persisted the result is [`AuthError::SessionInvalidationFailed`].
    pub async fn authorize(&self, session: &Session) -> Result<User, AuthError> {
        let user_id = match session::current_user(session)
            .await
            .map_err(AuthError::SessionLookupFailed)?
        {
            SessionUser::NoSession => return Err(AuthError::NoSession),
            SessionUser::Anonymous => return Err(AuthError::NoActiveUser),
            SessionUser::User(id) => id,
        };

        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(AuthError::StoreLookupFailed)?
            .ok_or(AuthError::UserNotFound)?;

        match self.ensure_fresh(user).await {
            Err(AuthError::RefreshFailed(refresh_error)) => {
                tracing::warn!(user_id = %user_id, error = %refresh_error, "Refresh failed, invalidating session");
                self.invalidate(session).await?;
                Err(AuthError::RefreshFailed(refresh_error))
            }
            result => result,
        }
    }

    /// End the session. Logging out without a session is not an error.
    pub async fn logout(&self, session: &Session) -> Result<(), AuthError> {
        session::end(session)
            .await
            .map_err(AuthError::SessionWriteFailed)
    }
}
