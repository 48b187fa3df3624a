//! Opaque bearer credential for the photo API

use std::fmt;

use crate::Secret;

/// Bearer token returned by the OAuth exchange.
///
/// The value is opaque: nothing inspects or validates it. Formatting always
/// redacts, so a token can sit in a tracing field without leaking.
#[derive(Clone)]
pub struct BearerToken(Secret<String>);

impl BearerToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Secret::new(value.into()))
    }

    /// Raw token for the `Authorization` header or persistent storage.
    pub fn expose(&self) -> &str {
        self.0.expose()
    }
}

impl PartialEq for BearerToken {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for BearerToken {}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BearerToken({:?})", self.0)
    }
}
