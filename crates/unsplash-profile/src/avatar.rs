//! Avatar lookup and change notification
//!
//! Avatar URLs come from the public user endpoint, not `/me`. A successful
//! fetch replaces the held reference and broadcasts `AvatarChanged` to every
//! subscriber so the UI can re-render.

use std::sync::{Arc, RwLock};

use api_client::{ApiRequest, FlightGuard, NetworkError, RequestCoordinator, Result, api_url};
use common::BearerToken;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

const AVATAR_OPERATION: &str = "avatar";

/// Avatar image URLs in the three sizes the API serves.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AvatarReference {
    pub small: String,
    pub medium: String,
    pub large: String,
}

/// Body of `GET /users/{username}`; only the avatar is read.
#[derive(Debug, Deserialize)]
struct UserResult {
    #[serde(alias = "profileImage")]
    profile_image: AvatarReference,
}

/// Published after every successful avatar fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarChanged {
    pub username: String,
    /// URL the UI displays (the small rendition)
    pub url: String,
    pub avatar: AvatarReference,
}

pub struct AvatarService {
    api_base: String,
    coordinator: Arc<RequestCoordinator>,
    avatar: RwLock<Option<AvatarReference>>,
    events: broadcast::Sender<AvatarChanged>,
}

impl AvatarService {
    pub fn new(api_base: impl Into<String>, coordinator: Arc<RequestCoordinator>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            api_base: api_base.into(),
            coordinator,
            avatar: RwLock::new(None),
            events,
        }
    }

    /// Register an observer for avatar changes.
    pub fn subscribe(&self) -> broadcast::Receiver<AvatarChanged> {
        self.events.subscribe()
    }

    /// Claim the avatar flight, cancelling any fetch already running.
    ///
    /// Taking the flight before the fetch is scheduled lets `reset` cancel
    /// a fetch that has been handed to a background task but not yet sent.
    pub async fn begin(&self) -> FlightGuard {
        self.coordinator.begin(AVATAR_OPERATION).await
    }

    /// Fetch `username`'s avatar under `guard`, store it, and notify subscribers.
    pub async fn fetch_avatar(
        &self,
        guard: FlightGuard,
        token: &BearerToken,
        username: &str,
    ) -> Result<AvatarReference> {
        let request = ApiRequest::get(api_url(&self.api_base, &["users", username])?)
            .with_bearer(token);

        let result: UserResult = self.coordinator.execute(&guard, request).await?;
        let avatar = result.profile_image;

        guard
            .commit(async {
                *self.avatar.write().unwrap_or_else(|e| e.into_inner()) = Some(avatar.clone());
                let event = AvatarChanged {
                    username: username.to_owned(),
                    url: avatar.small.clone(),
                    avatar: avatar.clone(),
                };
                // No subscribers is fine; the reference is still stored
                if self.events.send(event).is_err() {
                    debug!("no avatar subscribers");
                }
            })
            .await?;

        info!(username, "avatar updated");
        Ok(avatar)
    }

    pub fn avatar(&self) -> Option<AvatarReference> {
        self.avatar
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// URL of the small rendition, which is what the profile screen shows.
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar().map(|a| a.small)
    }

    /// Cancel any in-flight fetch and forget the held avatar.
    pub async fn reset(&self) {
        self.coordinator.cancel(AVATAR_OPERATION).await;
        *self.avatar.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

/// Whether an avatar error is worth a warning.
pub(crate) fn is_quiet(err: &NetworkError) -> bool {
    matches!(err, NetworkError::Cancelled)
}
