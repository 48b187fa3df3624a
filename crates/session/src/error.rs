//! Session-level errors

use api_client::NetworkError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no bearer token stored; sign in first")]
    NotAuthenticated,

    #[error("login cancelled by the user")]
    LoginCancelled,

    #[error(transparent)]
    Auth(#[from] unsplash_auth::Error),

    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl SessionError {
    /// The network error at the root of this failure, if any.
    pub fn network(&self) -> Option<&NetworkError> {
        match self {
            SessionError::Auth(e) => e.network(),
            SessionError::Network(e) => Some(e),
            _ => None,
        }
    }
}

/// Result alias using SessionError
pub type Result<T> = std::result::Result<T, SessionError>;
