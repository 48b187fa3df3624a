//! Authorization page URL and callback parsing
//!
//! The web-login view loads the URL from `build_authorization_url` and
//! watches navigations. When the browser reaches the native callback page,
//! `parse_redirect` turns that navigation into an `AuthorizationOutcome`:
//! either a single-use code for the token exchange, or a cancellation when
//! the user declined.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use reqwest::Url;

use crate::config::OAuthConfig;
use crate::constants::NATIVE_CALLBACK_PATH;
use crate::error::{Error, Result};

/// What the web-login collaborator delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    /// User approved access; the code is ready for exchange.
    Code(String),
    /// User aborted the login.
    Cancelled,
}

/// Generate an opaque `state` value for CSRF protection.
///
/// 32 random bytes encoded as URL-safe base64 (no padding).
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Build the authorization page URL with all required OAuth parameters.
pub fn build_authorization_url(config: &OAuthConfig, state: Option<&str>) -> Result<Url> {
    let mut params = vec![
        ("client_id", config.client_id.as_str()),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("response_type", "code"),
        ("scope", config.scope.as_str()),
    ];
    if let Some(state) = state {
        params.push(("state", state));
    }
    Url::parse_with_params(&config.authorize_endpoint, &params).map_err(|e| {
        Error::InvalidRedirect(format!(
            "bad authorize endpoint {}: {e}",
            config.authorize_endpoint
        ))
    })
}

/// Interpret a navigation reported by the web-login view.
///
/// Only the native callback page qualifies. When `expected_state` is given,
/// the callback must echo it back unchanged.
pub fn parse_redirect(url: &str, expected_state: Option<&str>) -> Result<AuthorizationOutcome> {
    let url = Url::parse(url).map_err(|e| Error::InvalidRedirect(format!("{url}: {e}")))?;
    if url.path() != NATIVE_CALLBACK_PATH {
        return Err(Error::InvalidRedirect(format!(
            "unexpected callback path {}",
            url.path()
        )));
    }

    let query_value = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };

    if let Some(expected) = expected_state
        && query_value("state").as_deref() != Some(expected)
    {
        return Err(Error::StateMismatch);
    }

    if let Some(code) = query_value("code").filter(|c| !c.is_empty()) {
        return Ok(AuthorizationOutcome::Code(code));
    }
    if query_value("error").as_deref() == Some("access_denied") {
        return Ok(AuthorizationOutcome::Cancelled);
    }
    Err(Error::InvalidRedirect("callback has no code".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Secret;

    fn config() -> OAuthConfig {
        OAuthConfig::new("access-key-123", Secret::new("secret".to_owned()))
    }

    #[test]
    fn state_is_url_safe_base64() {
        let state = generate_state();
        // 32 bytes -> 43 base64url chars without padding
        assert_eq!(state.len(), 43);
        assert!(
            state
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "state must be URL-safe base64 (no padding): {state}"
        );
        assert_ne!(state, generate_state(), "two states must not collide");
    }

    #[test]
    fn authorization_url_contains_required_params() {
        let url = build_authorization_url(&config(), None).unwrap();
        let as_str = url.as_str();

        assert!(as_str.starts_with("https://unsplash.com/oauth/authorize?"));
        assert!(as_str.contains("client_id=access-key-123"));
        assert!(as_str.contains("response_type=code"));
        assert!(as_str.contains("redirect_uri=urn%3Aietf%3Awg%3Aoauth%3A2.0%3Aoob"));
        assert!(as_str.contains("scope=public+read_user+write_likes"));
        assert!(!as_str.contains("state="));
    }

    #[test]
    fn authorization_url_carries_state() {
        let url = build_authorization_url(&config(), Some("xyz")).unwrap();
        assert!(url.as_str().ends_with("state=xyz"));
    }

    #[test]
    fn code_is_extracted_from_native_callback() {
        let outcome =
            parse_redirect("https://unsplash.com/oauth/authorize/native?code=abc123", None).unwrap();
        assert_eq!(outcome, AuthorizationOutcome::Code("abc123".into()));
    }

    #[test]
    fn other_paths_are_rejected() {
        let err = parse_redirect("https://unsplash.com/login?code=abc123", None).unwrap_err();
        assert!(matches!(err, Error::InvalidRedirect(_)));
    }

    #[test]
    fn access_denied_is_cancellation() {
        let outcome = parse_redirect(
            "https://unsplash.com/oauth/authorize/native?error=access_denied",
            None,
        )
        .unwrap();
        assert_eq!(outcome, AuthorizationOutcome::Cancelled);
    }

    #[test]
    fn state_must_match_when_expected() {
        let url = "https://unsplash.com/oauth/authorize/native?code=abc&state=other";
        assert!(matches!(
            parse_redirect(url, Some("mine")),
            Err(Error::StateMismatch)
        ));

        let url = "https://unsplash.com/oauth/authorize/native?code=abc&state=mine";
        assert_eq!(
            parse_redirect(url, Some("mine")).unwrap(),
            AuthorizationOutcome::Code("abc".into())
        );
    }

    #[test]
    fn missing_code_is_an_error() {
        let err = parse_redirect("https://unsplash.com/oauth/authorize/native", None).unwrap_err();
        assert!(matches!(err, Error::InvalidRedirect(_)));
    }
}
