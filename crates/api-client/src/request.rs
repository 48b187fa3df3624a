//! Request construction helpers

use common::BearerToken;
use reqwest::{Method, Url};

use crate::error::{NetworkError, Result};

/// A single API call: method, absolute URL, and optional bearer token.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    url: Url,
    bearer: Option<BearerToken>,
}

impl ApiRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            bearer: None,
        }
    }

    pub fn post(url: Url) -> Self {
        Self {
            method: Method::POST,
            url,
            bearer: None,
        }
    }

    /// Sign the request with `Authorization: Bearer <token>`.
    pub fn with_bearer(mut self, token: &BearerToken) -> Self {
        self.bearer = Some(token.clone());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn bearer(&self) -> Option<&BearerToken> {
        self.bearer.as_ref()
    }
}

/// Append path segments to an API base URL.
///
/// Segments are percent-encoded individually, so a username can never
/// escape its path component.
pub fn api_url(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| NetworkError::InvalidRequest(format!("bad base url {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| NetworkError::InvalidRequest(format!("base url {base} cannot have a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_appends_segments() {
        let url = api_url("https://api.unsplash.com", &["users", "jdoe"]).unwrap();
        assert_eq!(url.as_str(), "https://api.unsplash.com/users/jdoe");
    }

    #[test]
    fn api_url_handles_trailing_slash_and_prefix() {
        let url = api_url("http://127.0.0.1:9000/v1/", &["me"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/v1/me");
    }

    #[test]
    fn api_url_encodes_segments() {
        let url = api_url("https://api.unsplash.com", &["users", "a/b c"]).unwrap();
        assert_eq!(url.path(), "/users/a%2Fb%20c");
    }

    #[test]
    fn api_url_rejects_garbage_base() {
        let err = api_url("not a url", &["me"]).unwrap_err();
        assert!(matches!(err, NetworkError::InvalidRequest(_)));
    }

    #[test]
    fn bearer_is_attached() {
        let url = api_url("https://api.unsplash.com", &["me"]).unwrap();
        let request = ApiRequest::get(url).with_bearer(&BearerToken::new("tok"));
        assert_eq!(*request.method(), Method::GET);
        assert_eq!(request.bearer().map(|t| t.expose()), Some("tok"));
    }
}
