//! Authorization code exchange
//!
//! Trades the single-use code from the web-login view for a bearer token.
//! The exchange runs under the `oauth_token` single-flight: resubmitting
//! the code that is already being exchanged is rejected outright, while a
//! different code supersedes the older attempt. Only the current attempt
//! may write to the token store.

use std::sync::Arc;

use api_client::{ApiRequest, FlightGuard, NetworkError, RequestCoordinator};
use common::BearerToken;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::OAuthConfig;
use crate::constants::EXCHANGE_OPERATION;
use crate::credentials::TokenStore;
use crate::error::{Error, Result};

/// Body returned by the token endpoint.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub scope: String,
    /// Unix timestamp (seconds) at which the token was issued
    pub created_at: i64,
}

/// A claimed exchange flight, ready to be sent.
pub struct PendingExchange {
    guard: FlightGuard,
    code: String,
}

/// Performs the code exchange and persists the resulting token.
pub struct OAuthExchange {
    config: OAuthConfig,
    coordinator: Arc<RequestCoordinator>,
    store: Arc<TokenStore>,
}

impl OAuthExchange {
    pub fn new(
        config: OAuthConfig,
        coordinator: Arc<RequestCoordinator>,
        store: Arc<TokenStore>,
    ) -> Self {
        Self {
            config,
            coordinator,
            store,
        }
    }

    /// Claim the exchange flight for `code`.
    ///
    /// Fails with `DuplicateRequest` while the same code is still being
    /// exchanged; a different code supersedes the older attempt. Nothing is
    /// sent until the returned handle is passed to `exchange`.
    pub async fn begin(&self, code: &str) -> Result<PendingExchange> {
        let guard = self
            .coordinator
            .begin_unique(EXCHANGE_OPERATION, code)
            .await
            .inspect_err(|_| warn!("authorization code already being exchanged"))?;
        Ok(PendingExchange {
            guard,
            code: code.to_owned(),
        })
    }

    /// Exchange the claimed code for a bearer token and store it.
    ///
    /// Failures leave the stored credentials untouched. A superseded
    /// attempt resolves to `NetworkError::Cancelled` without writing.
    pub async fn exchange(&self, pending: PendingExchange) -> Result<BearerToken> {
        let PendingExchange { guard, code } = pending;
        let request = ApiRequest::post(self.token_url(&code)?);
        let response: TokenResponse = match self.coordinator.execute(&guard, request).await {
            Ok(response) => response,
            Err(NetworkError::Cancelled) => {
                debug!("code exchange superseded");
                return Err(NetworkError::Cancelled.into());
            }
            Err(e) => {
                warn!(error = %e, "code exchange failed");
                return Err(e.into());
            }
        };

        let token = BearerToken::new(response.access_token);
        guard.commit(self.store.set(&token)).await??;
        info!(
            token_type = %response.token_type,
            scope = %response.scope,
            "authorization code exchanged"
        );
        Ok(token)
    }

    /// Abort an exchange that is still in flight.
    pub async fn cancel(&self) {
        self.coordinator.cancel(EXCHANGE_OPERATION).await;
    }

    fn token_url(&self, code: &str) -> Result<Url> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose().as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
        ];
        Url::parse_with_params(&self.config.token_endpoint, &params).map_err(|e| {
            Error::Network(NetworkError::InvalidRequest(format!(
                "bad token endpoint {}: {e}",
                self.config.token_endpoint
            )))
        })
    }
}
