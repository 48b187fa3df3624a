//! OAuth client settings

use common::Secret;

use crate::constants::{AUTHORIZE_ENDPOINT, REDIRECT_URI, SCOPES, TOKEN_ENDPOINT};

/// Application credentials and endpoints for the OAuth flow.
///
/// `client_id` is the Unsplash "access key" and `client_secret` the
/// "secret key". Endpoints default to production and are overridable so
/// tests can point at a local server.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub redirect_uri: String,
    pub scope: String,
    pub authorize_endpoint: String,
    pub token_endpoint: String,
}

impl OAuthConfig {
    /// Production endpoints with the default redirect URI and scopes.
    pub fn new(client_id: impl Into<String>, client_secret: Secret<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            redirect_uri: REDIRECT_URI.to_owned(),
            scope: SCOPES.to_owned(),
            authorize_endpoint: AUTHORIZE_ENDPOINT.to_owned(),
            token_endpoint: TOKEN_ENDPOINT.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_production() {
        let config = OAuthConfig::new("access", Secret::new("secret".to_owned()));
        assert_eq!(config.token_endpoint, "https://unsplash.com/oauth/token");
        assert_eq!(config.authorize_endpoint, "https://unsplash.com/oauth/authorize");
        assert_eq!(config.redirect_uri, "urn:ietf:wg:oauth:2.0:oob");
    }

    #[test]
    fn debug_redacts_secret() {
        let config = OAuthConfig::new("access", Secret::new("s3cr3t".to_owned()));
        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cr3t"));
        assert!(debug.contains("access"));
    }
}
