//! HTTP execution and typed decoding
//!
//! `RequestCoordinator` is an explicitly constructed service object: the
//! auth and profile crates receive it as an `Arc` instead of reaching for a
//! global. It owns the `reqwest::Client` and the per-operation
//! `SingleFlight` registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{NetworkError, Result};
use crate::flight::{FlightGuard, SingleFlight};
use crate::request::ApiRequest;

/// Executes API requests and enforces single-flight per operation key.
pub struct RequestCoordinator {
    client: reqwest::Client,
    flights: Mutex<HashMap<String, Arc<SingleFlight>>>,
}

impl RequestCoordinator {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Start a flight for `key`, cancelling any request already in flight.
    pub async fn begin(&self, key: &str) -> FlightGuard {
        self.flight(key).supersede().await
    }

    /// Start a flight for `key` unless one with the same `tag` is running.
    pub async fn begin_unique(&self, key: &str, tag: &str) -> Result<FlightGuard> {
        self.flight(key).begin_unique(tag).await
    }

    /// Cancel the in-flight request for `key`, if any.
    pub async fn cancel(&self, key: &str) {
        self.flight(key).cancel().await;
    }

    /// Execute `request` as part of `guard`'s flight.
    ///
    /// Resolves to `NetworkError::Cancelled` if a newer flight for the same
    /// key starts before the response is decoded; the in-progress transfer
    /// is dropped.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        guard: &FlightGuard,
        request: ApiRequest,
    ) -> Result<T> {
        let outcome = guard.run(self.dispatch(guard.key(), request)).await;
        let result = outcome.and_then(|inner| inner);
        if let Err(NetworkError::Cancelled) = &result {
            record(guard.key(), "cancelled");
        }
        result
    }

    /// Execute `request` outside any flight.
    #[cfg(test)]
    pub(crate) async fn send<T: DeserializeOwned>(&self, operation: &str, request: ApiRequest) -> Result<T> {
        self.dispatch(operation, request).await
    }

    fn flight(&self, key: &str) -> Arc<SingleFlight> {
        let mut flights = self.flights.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            flights
                .entry(key.to_owned())
                .or_insert_with(|| SingleFlight::new(key)),
        )
    }

    async fn dispatch<T: DeserializeOwned>(&self, operation: &str, request: ApiRequest) -> Result<T> {
        let request_id = format!("req_{}", uuid::Uuid::new_v4().simple());
        debug!(
            operation,
            %request_id,
            method = %request.method(),
            path = request.url().path(),
            "sending api request"
        );

        let mut builder = self
            .client
            .request(request.method().clone(), request.url().clone());
        if let Some(token) = request.bearer() {
            builder = builder.bearer_auth(token.expose());
        }

        let response = builder.send().await.map_err(|e| {
            let err = if e.is_builder() {
                NetworkError::InvalidRequest(e.to_string())
            } else {
                NetworkError::UrlRequestError(e)
            };
            warn!(operation, %request_id, error = %err, "api request failed");
            record(operation, err.kind());
            err
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(operation, %request_id, status = status.as_u16(), "api returned error status");
            record(operation, "http_status");
            return Err(NetworkError::HttpStatusCode(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| {
            warn!(operation, %request_id, error = %e, "failed reading response body");
            record(operation, "transport");
            NetworkError::UrlRequestError(e)
        })?;

        if body.is_empty() {
            warn!(operation, %request_id, "api returned an empty body");
            record(operation, "empty_response");
            return Err(NetworkError::UrlSessionError);
        }

        match serde_json::from_slice::<T>(&body) {
            Ok(decoded) => {
                debug!(operation, %request_id, status = status.as_u16(), "api request succeeded");
                record(operation, "success");
                Ok(decoded)
            }
            Err(e) => {
                warn!(
                    operation,
                    %request_id,
                    error = %e,
                    body = %String::from_utf8_lossy(&body),
                    "could not decode api response"
                );
                record(operation, "decoding");
                Err(NetworkError::DecodingError(e))
            }
        }
    }
}

fn record(operation: &str, outcome: &'static str) {
    metrics::counter!(
        "api_requests_total",
        "operation" => operation.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
