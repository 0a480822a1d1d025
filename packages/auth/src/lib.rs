//! # Auth crate: session and token lifecycle for Sumnotes
//!
//! This crate binds a successful identity-provider login to a durable user record and
//! gates protected routes behind a cookie session whose validity follows the freshness
//! of the user's OAuth access token.
//!
//! ## Modules
//!
//! | Module | Feature gate | Purpose |
//! |--------|-------------|---------|
//! | [`auth`] | none | Provider contract, session attributes, [`AuthService`] lifecycle, access gate; Google adapter with `server` |
//! | [`db`] | none | [`UserStore`] contract and in-memory store; PostgreSQL store, pool and migrations with `server` |
//! | [`error`] | none | [`AuthError`] and its HTTP mapping |
//! | [`models`] | none | [`User`], [`TokenPair`] and the client-safe [`UserInfo`] |
//!
//! ## Request flow
//!
//! - **Login**: provider callback → [`AuthService::complete_login`] → find-or-create the
//!   user, write tokens, bind `user_id` to the session.
//! - **Protected request**: [`require_user`] → [`AuthService::authorize`] → read session,
//!   load user, refresh a stale token or force-expire the session → allow or deny.
//!
//! Collaborators are injected: the provider and stores are built once and handed to
//! [`AuthService`], never looked up from process-wide state.

pub mod auth;
pub mod db;
pub mod error;
pub mod models;

pub use auth::{require_user, AuthService, CurrentUser, IdentityProvider};
pub use db::{MemoryUserStore, UserStore};
pub use error::AuthError;
pub use models::{TokenPair, User, UserInfo};
