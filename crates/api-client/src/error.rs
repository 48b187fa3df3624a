//! Error taxonomy for API calls

/// Errors surfaced by the request coordinator.
///
/// `Cancelled` is what a superseded request resolves to. Callers treat it
/// as "someone newer owns this operation" and apply no side effects.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("server returned HTTP {0}")]
    HttpStatusCode(u16),

    #[error("request failed: {0}")]
    UrlRequestError(#[source] reqwest::Error),

    #[error("empty response with no transport error")]
    UrlSessionError,

    #[error("failed to decode response: {0}")]
    DecodingError(#[source] serde_json::Error),

    #[error("duplicate request for an operation already in flight")]
    DuplicateRequest,

    #[error("request superseded by a newer one")]
    Cancelled,
}

impl NetworkError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            NetworkError::InvalidRequest(_) => "invalid_request",
            NetworkError::HttpStatusCode(_) => "http_status",
            NetworkError::UrlRequestError(_) => "transport",
            NetworkError::UrlSessionError => "empty_response",
            NetworkError::DecodingError(_) => "decoding",
            NetworkError::DuplicateRequest => "duplicate",
            NetworkError::Cancelled => "cancelled",
        }
    }
}

/// Result alias for API calls.
pub type Result<T> = std::result::Result<T, NetworkError>;
