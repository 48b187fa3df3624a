//! Unsplash OAuth authentication library
//!
//! Provides the pieces between the web-login view and an authenticated
//! API session:
//!
//! 1. `authorize::build_authorization_url()` produces the page the user logs in on
//! 2. `authorize::parse_redirect()` pulls the authorization code (or a cancel) out
//!    of the callback navigation
//! 3. `exchange::OAuthExchange::begin()` claims the code, then `exchange()`
//!    trades it for a bearer token
//! 4. The token lands in `credentials::TokenStore`, which survives restarts

pub mod authorize;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod exchange;

pub use authorize::{AuthorizationOutcome, build_authorization_url, generate_state, parse_redirect};
pub use config::OAuthConfig;
pub use constants::*;
pub use credentials::TokenStore;
pub use error::{Error, Result};
pub use exchange::{OAuthExchange, PendingExchange, TokenResponse};
