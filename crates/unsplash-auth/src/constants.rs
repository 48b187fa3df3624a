//! Unsplash OAuth constants
//!
//! Public endpoints and defaults for the photo service. The access key and
//! secret key are per-application and come from configuration, never from
//! this module.

/// Authorization page shown in the web-login view
pub const AUTHORIZE_ENDPOINT: &str = "https://unsplash.com/oauth/authorize";

/// Token endpoint for the authorization code exchange
pub const TOKEN_ENDPOINT: &str = "https://unsplash.com/oauth/token";

/// Base URL for authenticated API calls (`/me`, `/users/{username}`)
pub const DEFAULT_API_BASE: &str = "https://api.unsplash.com";

/// Out-of-band redirect: the code is delivered to the native callback page
pub const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Scopes requested during authorization (space separated, encoded as `+`)
pub const SCOPES: &str = "public read_user write_likes";

/// Path of the page the browser lands on once the user approves access.
/// Navigations to this path carry the authorization code.
pub const NATIVE_CALLBACK_PATH: &str = "/oauth/authorize/native";

/// Fixed key the bearer token is stored under
pub const TOKEN_KEY: &str = "token";

/// Single-flight key for the code exchange
pub const EXCHANGE_OPERATION: &str = "oauth_token";
