//! Shared types for the image feed workspace
//!
//! Holds the pieces every other crate needs: the redacting `Secret`
//! wrapper, the opaque `BearerToken`, and the config/IO error type used
//! by the binary when loading settings.

mod error;
mod secret;
mod token;

pub use error::{Error, Result};
pub use secret::Secret;
pub use token::BearerToken;
