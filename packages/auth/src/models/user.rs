//! # User model for authenticated users
//!
//! Defines the representations of a Sumnotes account:
//!
//! ## [`User`]
//!
//! The complete row from the `users` table. With the `server` feature it derives
//! [`sqlx::FromRow`] so it can be loaded directly from queries. Columns:
//!
//! - `id`: primary key (`UUID v4`), assigned at creation and never changed.
//! - `email`: unique; the login-time lookup key.
//! - `name`, `avatar_url`: display metadata supplied by the provider.
//! - `access_token`, `refresh_token`, `token_expiry`: the provider credential cache.
//!   All three are empty until the first successful login and are always written
//!   together as a [`TokenPair`].
//! - `created_at` / `updated_at`: audit timestamps; `updated_at` moves on every token write.
//!
//! ## [`TokenPair`] and [`TokenState`]
//!
//! A token pair is distrusted starting exactly at its expiry instant, so
//! [`TokenPair::is_stale_at`] treats `now == expires_at` as stale.
//!
//! ## [`UserInfo`]
//!
//! The public projection returned to clients. It never carries tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "server")]
use sqlx::FromRow;

/// Full user record from the database.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "server", derive(FromRow))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Convert to UserInfo for client consumption.
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id.to_string(),
            email: self.email.clone(),
            name: self.name.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }

    /// The stored token pair, if a login has ever written one.
    pub fn tokens(&self) -> Option<TokenPair> {
        Some(TokenPair {
            access_token: self.access_token.clone()?,
            refresh_token: self.refresh_token.clone().unwrap_or_default(),
            expires_at: self.token_expiry?,
        })
    }

    /// Overwrite all three token fields at once.
    pub fn set_tokens(&mut self, tokens: &TokenPair, now: DateTime<Utc>) {
        self.access_token = Some(tokens.access_token.clone());
        self.refresh_token = Some(tokens.refresh_token.clone());
        self.token_expiry = Some(tokens.expires_at);
        self.updated_at = now;
    }

    /// Classify the held access token at `now`. A record that has never held
    /// a token is stale.
    pub fn token_state(&self, now: DateTime<Utc>) -> TokenState {
        match self.token_expiry {
            Some(expires_at) if now < expires_at => TokenState::Fresh,
            _ => TokenState::Stale,
        }
    }

    /// Refresh token to hand to the provider, if a non-empty one is stored.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Fields supplied when creating a user. Tokens are never set at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Access token, refresh token and access-token expiry, always handled together.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenPair {
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Fresh,
    Stale,
}

/// User information safe to send to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl UserInfo {
    /// Get display name, falling back to email if name is not set.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}
