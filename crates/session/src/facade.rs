//! Session facade
//!
//! Owns the collaborators (token store, code exchange, profile bootstrap)
//! as explicitly constructed services and drives `handle_event` with the
//! outcome of each step. State transitions happen under a short std mutex
//! that is never held across an await.
//!
//! Every `begin_oauth` call is a numbered login attempt. Only the latest
//! attempt may advance the state; events from an attempt that was
//! superseded by a newer login or by `sign_out` are dropped.

use std::sync::{Arc, Mutex, MutexGuard};

use api_client::NetworkError;
use common::BearerToken;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use unsplash_auth::{AuthorizationOutcome, OAuthExchange, TokenStore};
use unsplash_profile::{AvatarChanged, Profile, ProfileBootstrap};

use crate::error::{Result, SessionError};
use crate::state::{SessionAction, SessionEvent, SessionState, handle_event};

/// Current state and the login attempt allowed to move it.
struct Lifecycle {
    state: SessionState,
    attempt: u64,
}

pub struct Session {
    store: Arc<TokenStore>,
    exchange: OAuthExchange,
    bootstrap: ProfileBootstrap,
    lifecycle: Mutex<Lifecycle>,
    /// Held while claiming the exchange flight and numbering the attempt,
    /// and for the whole of `sign_out`.
    login_gate: tokio::sync::Mutex<()>,
}

impl Session {
    /// Build a session; starts `Authenticated` when a token is already stored.
    pub async fn new(
        store: Arc<TokenStore>,
        exchange: OAuthExchange,
        bootstrap: ProfileBootstrap,
    ) -> Self {
        let initial = SessionState::initial(store.get().await.is_some());
        info!(state = ?initial, "session initialized");
        Self {
            store,
            exchange,
            bootstrap,
            lifecycle: Mutex::new(Lifecycle {
                state: initial,
                attempt: 0,
            }),
            login_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle().state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Exchange `code`, store the token, and bootstrap the profile.
    ///
    /// Returns `None` when the exchange succeeded but the profile fetch did
    /// not; the session is authenticated either way. Resubmitting a code
    /// that is still being exchanged fails with `DuplicateRequest` and
    /// leaves the original attempt in charge. An attempt overtaken by a
    /// newer login or a sign-out resolves to `Cancelled`.
    pub async fn begin_oauth(&self, code: &str) -> Result<Option<Profile>> {
        let (pending, attempt) = {
            let _gate = self.login_gate.lock().await;
            let pending = self.exchange.begin(code).await?;
            (pending, self.start_attempt())
        };

        let token = match self.exchange.exchange(pending).await {
            Ok(token) => token,
            Err(e) => {
                if self.apply_for(attempt, SessionEvent::ExchangeFailed).is_some() {
                    warn!(attempt, error = %e, "authorization code exchange failed");
                } else {
                    debug!(attempt, error = %e, "superseded login attempt ended");
                }
                return Err(e.into());
            }
        };

        if self.apply_for(attempt, SessionEvent::ExchangeSucceeded)
            != Some(SessionAction::BootstrapProfile)
        {
            return Err(NetworkError::Cancelled.into());
        }

        let profile = self.run_bootstrap(&token).await;
        if self
            .apply_for(attempt, SessionEvent::ProfileBootstrapped)
            .is_none()
        {
            return Err(NetworkError::Cancelled.into());
        }
        Ok(profile)
    }

    /// Feed the web-login result into the session.
    pub async fn complete_login(&self, outcome: AuthorizationOutcome) -> Result<Option<Profile>> {
        match outcome {
            AuthorizationOutcome::Code(code) => self.begin_oauth(&code).await,
            AuthorizationOutcome::Cancelled => {
                self.apply(SessionEvent::LoginCancelled);
                info!("web login cancelled");
                Err(SessionError::LoginCancelled)
            }
        }
    }

    /// Fetch the profile for the stored token (app start with a saved login).
    ///
    /// Only valid once the session is `Authenticated`.
    pub async fn bootstrap_profile(&self) -> Result<Profile> {
        if !self.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        let token = self
            .store
            .get()
            .await
            .ok_or(SessionError::NotAuthenticated)?;
        Ok(self.bootstrap.bootstrap(&token).await?)
    }

    /// Cancel in-flight work, clear the stored token and cached profile.
    pub async fn sign_out(&self) -> Result<()> {
        let _gate = self.login_gate.lock().await;
        if self.apply(SessionEvent::SignOut) == SessionAction::ClearCredentials {
            self.exchange.cancel().await;
            self.bootstrap.reset().await;
            self.store.clear().await?;
        }
        info!("signed out");
        Ok(())
    }

    /// Register an observer for avatar changes.
    pub fn subscribe_avatar(&self) -> broadcast::Receiver<AvatarChanged> {
        self.bootstrap.subscribe()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.bootstrap.profile()
    }

    pub fn avatar_url(&self) -> Option<String> {
        self.bootstrap.avatar_url()
    }

    async fn run_bootstrap(&self, token: &BearerToken) -> Option<Profile> {
        match self.bootstrap.bootstrap(token).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(error = %e, "profile bootstrap failed after login");
                None
            }
        }
    }

    /// Number a new login attempt and move to `Authenticating`.
    fn start_attempt(&self) -> u64 {
        let mut lifecycle = self.lifecycle();
        lifecycle.attempt += 1;
        transition(&mut lifecycle, SessionEvent::BeginOAuth);
        lifecycle.attempt
    }

    /// Apply `event` on behalf of `attempt`; `None` if a newer attempt or a
    /// sign-out has taken over.
    fn apply_for(&self, attempt: u64, event: SessionEvent) -> Option<SessionAction> {
        let mut lifecycle = self.lifecycle();
        if lifecycle.attempt != attempt {
            debug!(
                attempt,
                current = lifecycle.attempt,
                ?event,
                "dropping event from superseded login attempt"
            );
            return None;
        }
        Some(transition(&mut lifecycle, event))
    }

    fn apply(&self, event: SessionEvent) -> SessionAction {
        let mut lifecycle = self.lifecycle();
        if event == SessionEvent::SignOut {
            lifecycle.attempt += 1;
        }
        transition(&mut lifecycle, event)
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn transition(lifecycle: &mut Lifecycle, event: SessionEvent) -> SessionAction {
    let (next, action) = handle_event(lifecycle.state, event);
    if next != lifecycle.state {
        info!(from = ?lifecycle.state, to = ?next, ?event, "session state changed");
    }
    lifecycle.state = next;
    action
}
