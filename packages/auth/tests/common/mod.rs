#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use auth::auth::{
    AuthCallback, AuthorizationRequest, IdentityProvider, PendingAuthorization, ProviderError,
    ProviderIdentity,
};
use auth::db::{MemoryUserStore, StoreError, UserStore};
use auth::models::{NewUser, TokenPair, User};
use chrono::{Duration, Utc};
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, SessionStore};
use tower_sessions::{MemoryStore, Session};
use uuid::Uuid;

pub fn tokens(access: &str, refresh: &str, expires_in: Duration) -> TokenPair {
    TokenPair {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_at: Utc::now() + expires_in,
    }
}

pub fn identity(email: &str, tokens: TokenPair) -> ProviderIdentity {
    ProviderIdentity {
        email: email.to_string(),
        name: Some("Ada Lovelace".to_string()),
        avatar_url: Some("https://example.com/ada.png".to_string()),
        tokens,
    }
}

/// Scripted provider. Logins return `identity`, refreshes return `refreshed`;
/// `None` makes the call fail.
#[derive(Default)]
pub struct FakeProvider {
    identity: Mutex<Option<ProviderIdentity>>,
    refreshed: Mutex<Option<TokenPair>>,
    refresh_calls: Mutex<Vec<String>>,
    issued: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_identity(&self, identity: Option<ProviderIdentity>) {
        *self.identity.lock().unwrap() = identity;
    }

    pub fn set_refresh(&self, tokens: Option<TokenPair>) {
        *self.refreshed.lock().unwrap() = tokens;
    }

    pub fn refresh_calls(&self) -> Vec<String> {
        self.refresh_calls.lock().unwrap().clone()
    }
}

impl IdentityProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn authorization_request(&self) -> AuthorizationRequest {
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        let state = format!("state-{n}");
        AuthorizationRequest {
            url: format!("https://provider.test/authorize?state={state}"),
            pending: PendingAuthorization {
                state,
                pkce_verifier: format!("verifier-{n}"),
            },
        }
    }

    async fn complete_authentication(
        &self,
        callback: AuthCallback,
        pending: PendingAuthorization,
    ) -> Result<ProviderIdentity, ProviderError> {
        pending.verify(&callback)?;
        self.identity
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ProviderError::Exchange("invalid_grant".to_string()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ProviderError> {
        self.refresh_calls
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        // Let concurrent requests run while the provider call is in flight.
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.refreshed
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ProviderError::Refresh("invalid_grant".to_string()))
    }
}

/// The `state` query parameter of an authorization URL.
pub fn state_from_url(url: &str) -> String {
    url.split("state=").nth(1).unwrap_or_default().to_string()
}

pub fn callback_for(url: &str) -> AuthCallback {
    AuthCallback {
        code: Some("code".to_string()),
        state: Some(state_from_url(url)),
        error: None,
    }
}

/// [`MemoryUserStore`] with switchable failures.
#[derive(Clone, Default)]
pub struct FlakyUserStore {
    pub inner: MemoryUserStore,
    pub fail_lookups: Arc<AtomicBool>,
    pub fail_writes: Arc<AtomicBool>,
}

impl FlakyUserStore {
    fn check(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

impl UserStore for FlakyUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Self::check(&self.fail_lookups)?;
        self.inner.find_by_email(email).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Self::check(&self.fail_lookups)?;
        self.inner.find_by_id(id).await
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        Self::check(&self.fail_writes)?;
        self.inner.create(user).await
    }

    async fn update_tokens(&self, id: Uuid, tokens: &TokenPair) -> Result<(), StoreError> {
        Self::check(&self.fail_writes)?;
        self.inner.update_tokens(id, tokens).await
    }
}

/// [`MemoryStore`] with switchable failures.
#[derive(Debug, Clone, Default)]
pub struct FlakySessionStore {
    pub inner: MemoryStore,
    pub fail_loads: Arc<AtomicBool>,
    pub fail_saves: Arc<AtomicBool>,
}

impl FlakySessionStore {
    fn check(flag: &AtomicBool) -> session_store::Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(session_store::Error::Backend("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FlakySessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        Self::check(&self.fail_saves)?;
        self.inner.create(record).await
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        Self::check(&self.fail_saves)?;
        self.inner.save(record).await
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        Self::check(&self.fail_loads)?;
        self.inner.load(session_id).await
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        Self::check(&self.fail_saves)?;
        self.inner.delete(session_id).await
    }
}

/// A session over `store` as a new request carrying `id` would see it.
pub fn session_for(store: &Arc<FlakySessionStore>, id: Option<Id>) -> Session {
    Session::new(id, store.clone(), None)
}
