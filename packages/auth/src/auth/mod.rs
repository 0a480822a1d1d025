//! Authentication: provider contract, session attributes, token lifecycle and the
//! access gate.

#[cfg(feature = "server")]
mod config;
mod gate;
#[cfg(feature = "server")]
mod google;
mod provider;
mod service;
mod session;

#[cfg(feature = "server")]
pub use config::OAuthConfig;
pub use gate::{require_user, CurrentUser};
#[cfg(feature = "server")]
pub use google::GoogleProvider;
pub use provider::{
    AuthCallback, AuthorizationRequest, IdentityProvider, PendingAuthorization, ProviderError,
    ProviderIdentity,
};
pub use service::AuthService;
pub use session::{SessionUser, SESSION_PENDING_KEY, SESSION_USER_ID_KEY};
