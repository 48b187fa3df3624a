//! Current-user profile
//!
//! `GET /me` runs under the `profile` single-flight. The held profile is
//! replaced wholesale, and only by the flight that is still current, so a
//! slow stale response can never overwrite a newer one.

use std::sync::{Arc, RwLock};

use api_client::{ApiRequest, NetworkError, RequestCoordinator, Result, api_url};
use common::BearerToken;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const PROFILE_OPERATION: &str = "profile";

/// Body of `GET /me`.
///
/// Accepts both the API's snake_case keys and camelCase spellings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileResult {
    pub username: String,
    #[serde(alias = "firstName")]
    pub first_name: String,
    #[serde(alias = "lastName", default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Profile as presented to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub username: String,
    /// First and last name joined by a space, trimmed
    pub display_name: String,
    /// `@username`
    pub login_handle: String,
    pub bio: Option<String>,
}

impl From<ProfileResult> for Profile {
    fn from(result: ProfileResult) -> Self {
        let last_name = result.last_name.unwrap_or_default();
        let display_name = format!("{} {}", result.first_name, last_name)
            .trim()
            .to_owned();
        Self {
            login_handle: format!("@{}", result.username),
            display_name,
            username: result.username,
            bio: result.bio,
        }
    }
}

pub struct ProfileService {
    api_base: String,
    coordinator: Arc<RequestCoordinator>,
    profile: RwLock<Option<Profile>>,
}

impl ProfileService {
    pub fn new(api_base: impl Into<String>, coordinator: Arc<RequestCoordinator>) -> Self {
        Self {
            api_base: api_base.into(),
            coordinator,
            profile: RwLock::new(None),
        }
    }

    /// Fetch the signed-in user's profile and make it current.
    pub async fn fetch_profile(&self, token: &BearerToken) -> Result<Profile> {
        let guard = self.coordinator.begin(PROFILE_OPERATION).await;
        let request = ApiRequest::get(api_url(&self.api_base, &["me"])?).with_bearer(token);

        let result: ProfileResult = match self.coordinator.execute(&guard, request).await {
            Ok(result) => result,
            Err(NetworkError::Cancelled) => {
                debug!("profile fetch superseded");
                return Err(NetworkError::Cancelled);
            }
            Err(e) => {
                warn!(error = %e, "profile fetch failed");
                return Err(e);
            }
        };

        let profile = Profile::from(result);
        guard
            .commit(async {
                *self.profile.write().unwrap_or_else(|e| e.into_inner()) = Some(profile.clone());
            })
            .await?;
        info!(username = %profile.username, "profile loaded");
        Ok(profile)
    }

    /// Most recently fetched profile.
    pub fn profile(&self) -> Option<Profile> {
        self.profile
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Cancel any in-flight fetch and forget the held profile.
    pub async fn reset(&self) {
        self.coordinator.cancel(PROFILE_OPERATION).await;
        *self.profile.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}
