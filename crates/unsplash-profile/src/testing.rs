//! Local stand-in for the photo API used by this crate's tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use api_client::RequestCoordinator;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;

/// Knobs and observations shared with the mock handlers.
#[derive(Clone, Default)]
pub struct MockApi {
    pub me_calls: Arc<AtomicUsize>,
    pub avatar_calls: Arc<AtomicUsize>,
    /// When set, `/me` answers with this status instead of a profile
    pub me_status: Arc<Mutex<Option<StatusCode>>>,
    /// When set, `/users/{username}` answers with this status
    pub avatar_status: Arc<Mutex<Option<StatusCode>>>,
    /// First `/me` call stalls and returns a different user
    pub slow_first_me: Arc<Mutex<bool>>,
    pub last_authorization: Arc<Mutex<Option<String>>>,
}

impl MockApi {
    pub fn fail_me(&self, status: StatusCode) {
        *self.me_status.lock().unwrap() = Some(status);
    }

    pub fn fail_avatar(&self, status: StatusCode) {
        *self.avatar_status.lock().unwrap() = Some(status);
    }

    pub fn stall_first_me(&self) {
        *self.slow_first_me.lock().unwrap() = true;
    }
}

async fn me(State(api): State<MockApi>, headers: HeaderMap) -> Response {
    let call = api.me_calls.fetch_add(1, Ordering::SeqCst);
    *api.last_authorization.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let status = *api.me_status.lock().unwrap();
    if let Some(status) = status {
        return (status, r#"{"errors":["OAuth error: The access token is invalid"]}"#).into_response();
    }

    let stall = call == 0 && *api.slow_first_me.lock().unwrap();
    if stall {
        tokio::time::sleep(Duration::from_millis(300)).await;
        return axum::Json(serde_json::json!({
            "username": "stale_user",
            "first_name": "Stale",
            "last_name": null,
            "bio": null
        }))
        .into_response();
    }

    axum::Json(serde_json::json!({
        "username": "jdoe",
        "first_name": "Jane",
        "last_name": "Doe",
        "bio": null
    }))
    .into_response()
}

async fn user(State(api): State<MockApi>, Path(username): Path<String>) -> Response {
    api.avatar_calls.fetch_add(1, Ordering::SeqCst);
    let status = *api.avatar_status.lock().unwrap();
    if let Some(status) = status {
        return status.into_response();
    }
    axum::Json(serde_json::json!({
        "username": username,
        "profile_image": {
            "small": format!("https://images.example/{username}/small.jpg"),
            "medium": format!("https://images.example/{username}/medium.jpg"),
            "large": format!("https://images.example/{username}/large.jpg")
        }
    }))
    .into_response()
}

/// Start the mock API and return its base URL.
pub async fn start(api: MockApi) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let app = axum::Router::new()
            .route("/me", get(me))
            .route("/users/{username}", get(user))
            .with_state(api);
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn coordinator() -> Arc<RequestCoordinator> {
    Arc::new(RequestCoordinator::new(reqwest::Client::new()))
}
