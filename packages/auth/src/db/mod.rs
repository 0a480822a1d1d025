//! # Database module: user record persistence
//!
//! The lifecycle code in [`crate::auth`] only talks to the [`UserStore`] trait, so the
//! same logic runs against PostgreSQL in production and against [`MemoryUserStore`]
//! in tests.
//!
//! ## Contract
//!
//! | Method | Outcome |
//! |--------|---------|
//! | [`find_by_email`](UserStore::find_by_email) | `Ok(None)` when no row matches; errors are reserved for store failures. |
//! | [`find_by_id`](UserStore::find_by_id) | Same, keyed on the primary identifier. |
//! | [`create`](UserStore::create) | Assigns `id`, `created_at` and `updated_at`. Tokens stay empty. |
//! | [`update_tokens`](UserStore::update_tokens) | Overwrites the three token columns and bumps `updated_at`. |
//!
//! ## Backends
//!
//! - [`MemoryUserStore`]: `HashMap` behind a mutex.
//! - `PgUserStore` (`server` feature): `sqlx` queries against the `users` table, with
//!   [`connect`] and [`migrate`] for pool set-up.

mod memory;
#[cfg(feature = "server")]
mod pg;
#[cfg(feature = "server")]
mod pool;
mod store;

pub use memory::MemoryUserStore;
#[cfg(feature = "server")]
pub use pg::PgUserStore;
#[cfg(feature = "server")]
pub use pool::{connect, migrate};
pub use store::{StoreError, UserStore};
