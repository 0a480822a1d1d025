//! Identity provider contract.
//!
//! A provider performs the OAuth handshake and token renewal. The lifecycle code
//! in [`super::service`] treats both operations as opaque.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::models::TokenPair;

/// Identity and current credentials returned by a completed login.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderIdentity {
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub tokens: TokenPair,
}

/// Query parameters of the provider's redirect back to us.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// CSRF state and PKCE verifier issued when a login starts, held in the session
/// until the callback arrives.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub state: String,
    pub pkce_verifier: String,
}

impl PendingAuthorization {
    /// Check the callback's `state` against the one issued at login start.
    pub fn verify(&self, callback: &AuthCallback) -> Result<(), ProviderError> {
        if let Some(error) = &callback.error {
            return Err(ProviderError::Callback(error.clone()));
        }
        match callback.state.as_deref() {
            Some(state) if state == self.state => Ok(()),
            Some(_) => Err(ProviderError::StateMismatch),
            None => Err(ProviderError::Callback("missing state".to_string())),
        }
    }
}

impl std::fmt::Debug for PendingAuthorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingAuthorization")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Where to send the user agent, plus what to remember until it comes back.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub pending: PendingAuthorization,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("provider callback rejected: {0}")]
    Callback(String),

    #[error("OAuth state mismatch")]
    StateMismatch,

    #[error("token exchange failed: {0}")]
    Exchange(String),

    #[error("user info request failed: {0}")]
    UserInfo(String),

    #[error("provider did not return an email address")]
    MissingEmail,

    #[error("no refresh token on record")]
    MissingRefreshToken,

    #[error("token refresh failed: {0}")]
    Refresh(String),

    #[error("provider misconfigured: {0}")]
    Config(String),
}

/// A single external identity provider.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Short name used in routes, e.g. `"google"`.
    fn name(&self) -> &str;

    /// Build the authorization URL and the state to keep until the callback.
    fn authorization_request(&self) -> AuthorizationRequest;

    /// Consume the callback and return the user's identity with a fresh token pair.
    fn complete_authentication(
        &self,
        callback: AuthCallback,
        pending: PendingAuthorization,
    ) -> impl Future<Output = Result<ProviderIdentity, ProviderError>> + Send;

    /// Trade a refresh token for a new token pair.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<TokenPair, ProviderError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> PendingAuthorization {
        PendingAuthorization {
            state: "abc".to_string(),
            pkce_verifier: "verifier".to_string(),
        }
    }

    #[test]
    fn test_verify_matching_state() {
        let callback = AuthCallback {
            code: Some("code".to_string()),
            state: Some("abc".to_string()),
            error: None,
        };
        assert!(pending().verify(&callback).is_ok());
    }

    #[test]
    fn test_verify_rejects_mismatch_missing_and_error() {
        let mismatch = AuthCallback {
            code: Some("code".to_string()),
            state: Some("xyz".to_string()),
            error: None,
        };
        assert!(matches!(
            pending().verify(&mismatch),
            Err(ProviderError::StateMismatch)
        ));

        let missing = AuthCallback {
            code: Some("code".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            pending().verify(&missing),
            Err(ProviderError::Callback(_))
        ));

        let denied = AuthCallback {
            state: Some("abc".to_string()),
            error: Some("access_denied".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            pending().verify(&denied),
            Err(ProviderError::Callback(ref e)) if e == "access_denied"
        ));
    }

    #[test]
    fn test_pending_debug_hides_verifier() {
        assert!(!format!("{:?}", pending()).contains("verifier"));
    }
}
