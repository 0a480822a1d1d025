//! OAuth provider configuration.

use oauth2::{AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenUrl};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

const GOOGLE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.modify",
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
];

/// OAuth provider configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub auth_url: AuthUrl,
    pub token_url: TokenUrl,
    pub redirect_url: RedirectUrl,
    pub userinfo_url: String,
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    /// Google endpoints and scopes with the given client credentials.
    pub fn google(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Result<Self, oauth2::url::ParseError> {
        Ok(Self {
            client_id: ClientId::new(client_id.into()),
            client_secret: ClientSecret::new(client_secret.into()),
            auth_url: AuthUrl::new(GOOGLE_AUTH_URL.to_string())?,
            token_url: TokenUrl::new(GOOGLE_TOKEN_URL.to_string())?,
            redirect_url: RedirectUrl::new(redirect_url.into())?,
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
            scopes: GOOGLE_SCOPES.iter().map(|s| s.to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_config() {
        let config = OAuthConfig::google(
            "id",
            "secret",
            "http://localhost:9999/auth/google/callback",
        )
        .unwrap();
        assert_eq!(config.client_id.as_str(), "id");
        assert_eq!(config.token_url.as_str(), GOOGLE_TOKEN_URL);
        assert_eq!(config.scopes.len(), 3);
    }

    #[test]
    fn test_invalid_redirect() {
        assert!(OAuthConfig::google("id", "secret", "not a url").is_err());
    }
}
