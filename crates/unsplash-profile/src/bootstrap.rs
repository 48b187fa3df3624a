//! Post-authentication profile bootstrap
//!
//! Sequence: fetch `/me`, then kick off the avatar fetch in the background.
//! The bootstrap result is the profile alone; avatar errors are logged and
//! otherwise only observable as the absence of an `AvatarChanged` event.

use std::sync::Arc;

use api_client::{FlightGuard, RequestCoordinator, Result};
use common::BearerToken;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::avatar::{self, AvatarChanged, AvatarService};
use crate::profile::{Profile, ProfileService};

pub struct ProfileBootstrap {
    profiles: ProfileService,
    avatars: Arc<AvatarService>,
}

impl ProfileBootstrap {
    pub fn new(api_base: impl Into<String>, coordinator: Arc<RequestCoordinator>) -> Self {
        let api_base = api_base.into();
        Self {
            profiles: ProfileService::new(api_base.clone(), Arc::clone(&coordinator)),
            avatars: Arc::new(AvatarService::new(api_base, coordinator)),
        }
    }

    /// Fetch the profile, then start the avatar fetch without waiting for it.
    ///
    /// The avatar flight is claimed up front, so a `reset` at any point
    /// after this call starts also cancels the background fetch, and a
    /// newer bootstrap supersedes an older one's avatar.
    pub async fn bootstrap(&self, token: &BearerToken) -> Result<Profile> {
        let avatar_flight = self.avatars.begin().await;
        let profile = self.profiles.fetch_profile(token).await?;
        self.spawn_avatar_fetch(avatar_flight, token.clone(), profile.username.clone());
        Ok(profile)
    }

    /// Register an observer for avatar changes.
    pub fn subscribe(&self) -> broadcast::Receiver<AvatarChanged> {
        self.avatars.subscribe()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.profiles.profile()
    }

    pub fn avatar_url(&self) -> Option<String> {
        self.avatars.avatar_url()
    }

    /// Cancel in-flight fetches and drop cached profile and avatar.
    pub async fn reset(&self) {
        self.profiles.reset().await;
        self.avatars.reset().await;
    }

    fn spawn_avatar_fetch(&self, flight: FlightGuard, token: BearerToken, username: String) {
        let avatars = Arc::clone(&self.avatars);
        tokio::spawn(async move {
            match avatars.fetch_avatar(flight, &token, &username).await {
                Ok(_) => {}
                Err(e) if avatar::is_quiet(&e) => {
                    debug!(%username, "avatar fetch superseded");
                }
                Err(e) => {
                    warn!(%username, error = %e, "avatar fetch failed, keeping previous avatar");
                }
            }
        });
    }
}
