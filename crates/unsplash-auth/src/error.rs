//! Error types for OAuth authentication operations

use api_client::NetworkError;

/// Errors from OAuth authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("redirect does not carry an authorization code: {0}")]
    InvalidRedirect(String),

    #[error("authorization state mismatch")]
    StateMismatch,

    #[error("credential parse error: {0}")]
    CredentialParse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// The underlying network error, if this is one.
    pub fn network(&self) -> Option<&NetworkError> {
        match self {
            Error::Network(e) => Some(e),
            _ => None,
        }
    }
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
