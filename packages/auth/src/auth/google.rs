//! # Google OAuth 2.0 provider
//!
//! Implements [`IdentityProvider`] on top of Google's Authorization Code flow with PKCE.
//!
//! ## Types
//!
//! - [`GoogleUser`]: deserialization target for the Google userinfo API response
//!   (`googleapis.com/oauth2/v2/userinfo`).
//! - [`ConfiguredClient`]: a fully-typed `oauth2::Client` alias with auth and token
//!   endpoints set.
//! - [`GoogleProvider`]: the adapter that wraps an [`OAuthConfig`] and a shared HTTP client.
//!
//! ## Flow
//!
//! 1. **[`authorization_request`](GoogleProvider::authorization_request)**: builds an
//!    authorization URL with the configured scopes, `access_type=offline` and
//!    `prompt=consent` (so Google issues a refresh token on every consent), and a random
//!    PKCE challenge. The CSRF state and verifier are returned to the caller, which keeps
//!    them in the session.
//!
//! 2. **[`complete_authentication`](GoogleProvider::complete_authentication)**: verifies
//!    the callback state, exchanges the code + PKCE verifier for tokens, then fetches the
//!    user's profile from the userinfo endpoint.
//!
//! 3. **[`refresh`](GoogleProvider::refresh)**: trades a refresh token for a new access
//!    token. Google usually omits a new refresh token here, in which case the one passed
//!    in is carried over.

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use oauth2::basic::BasicClient;
use oauth2::{
    AuthorizationCode, CsrfToken, EndpointNotSet, EndpointSet, PkceCodeChallenge,
    PkceCodeVerifier, RefreshToken, Scope, TokenResponse,
};
use serde::Deserialize;

use super::config::OAuthConfig;
use super::provider::{
    AuthCallback, AuthorizationRequest, IdentityProvider, PendingAuthorization,
    ProviderError, ProviderIdentity,
};
use crate::models::TokenPair;

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Google user info from API.
#[derive(Debug, Deserialize)]
struct GoogleUser {
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

/// OAuth client type with auth URL and token URL set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Google identity provider.
pub struct GoogleProvider {
    client: ConfiguredClient,
    http: reqwest::Client,
    config: OAuthConfig,
}

impl GoogleProvider {
    pub fn new(config: OAuthConfig) -> Result<Self, ProviderError> {
        // Redirects are disabled for the token endpoint, as oauth2 recommends.
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        let client = BasicClient::new(config.client_id.clone())
            .set_client_secret(config.client_secret.clone())
            .set_auth_uri(config.auth_url.clone())
            .set_token_uri(config.token_url.clone())
            .set_redirect_uri(config.redirect_url.clone());

        Ok(Self {
            client,
            http,
            config,
        })
    }

    async fn fetch_user(&self, access_token: &str) -> Result<GoogleUser, ProviderError> {
        self.http
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ProviderError::UserInfo(e.to_string()))?
            .json()
            .await
            .map_err(|e| ProviderError::UserInfo(e.to_string()))
    }
}

fn token_pair(
    response: &oauth2::basic::BasicTokenResponse,
    previous_refresh_token: Option<&str>,
) -> TokenPair {
    let lifetime = response.expires_in().unwrap_or(DEFAULT_TOKEN_LIFETIME);
    let lifetime = TimeDelta::from_std(lifetime).unwrap_or(TimeDelta::MAX);

    TokenPair {
        access_token: response.access_token().secret().clone(),
        refresh_token: response
            .refresh_token()
            .map(|t| t.secret().clone())
            .or_else(|| previous_refresh_token.map(str::to_string))
            .unwrap_or_default(),
        expires_at: Utc::now()
            .checked_add_signed(lifetime)
            .unwrap_or(chrono::DateTime::<Utc>::MAX_UTC),
    }
}

impl IdentityProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn authorization_request(&self) -> AuthorizationRequest {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_state) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(self.config.scopes.iter().cloned().map(Scope::new))
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .set_pkce_challenge(pkce_challenge)
            .url();

        AuthorizationRequest {
            url: auth_url.to_string(),
            pending: PendingAuthorization {
                state: csrf_state.secret().clone(),
                pkce_verifier: pkce_verifier.secret().clone(),
            },
        }
    }

    async fn complete_authentication(
        &self,
        callback: AuthCallback,
        pending: PendingAuthorization,
    ) -> Result<ProviderIdentity, ProviderError> {
        pending.verify(&callback)?;

        let code = callback
            .code
            .ok_or_else(|| ProviderError::Callback("missing code".to_string()))?;

        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(PkceCodeVerifier::new(pending.pkce_verifier))
            .request_async(&self.http)
            .await
            .map_err(|e| ProviderError::Exchange(e.to_string()))?;

        let tokens = token_pair(&token_result, None);
        let google_user = self.fetch_user(&tokens.access_token).await?;

        let email = google_user.email.ok_or(ProviderError::MissingEmail)?;

        Ok(ProviderIdentity {
            email,
            name: google_user.name,
            avatar_url: google_user.picture,
            tokens,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ProviderError> {
        if refresh_token.is_empty() {
            return Err(ProviderError::MissingRefreshToken);
        }

        let token_result = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| ProviderError::Refresh(e.to_string()))?;

        Ok(token_pair(&token_result, Some(refresh_token)))
    }
}
