//! Session state machine
//!
//! Pure state machine: receives events, returns (new_state, action).
//! The facade executes the I/O implied by each action.

/// Where the user is in the login lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No token stored
    Unauthenticated,
    /// Code exchange or the bootstrap that follows it is running
    Authenticating,
    /// Token stored and bootstrap attempted
    Authenticated,
}

/// Events that drive state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Web login delivered an authorization code
    BeginOAuth,
    /// Token endpoint returned a token and it was stored
    ExchangeSucceeded,
    /// Token endpoint or storage failed
    ExchangeFailed,
    /// Profile bootstrap finished, successfully or not
    ProfileBootstrapped,
    /// User aborted the web login
    LoginCancelled,
    /// User signed out
    SignOut,
}

/// Actions the caller should execute after a state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Trade the authorization code for a token
    ExchangeCode,
    /// Fetch the profile (and, in the background, the avatar)
    BootstrapProfile,
    /// Cancel in-flight work and wipe stored credentials
    ClearCredentials,
    /// No-op
    None,
}

impl SessionState {
    /// Initial state on process start.
    pub fn initial(has_token: bool) -> Self {
        if has_token {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }
}

/// Handle a state transition. Pure function: no I/O.
pub fn handle_event(state: SessionState, event: SessionEvent) -> (SessionState, SessionAction) {
    use SessionAction as A;
    use SessionEvent as E;
    use SessionState as S;

    match (state, event) {
        // Re-login from an authenticated session is allowed
        (_, E::BeginOAuth) => (S::Authenticating, A::ExchangeCode),

        (S::Authenticating, E::ExchangeSucceeded) => (S::Authenticating, A::BootstrapProfile),
        (S::Authenticating, E::ExchangeFailed) => (S::Unauthenticated, A::None),
        (S::Authenticating, E::ProfileBootstrapped) => (S::Authenticated, A::None),

        (_, E::SignOut) => (S::Unauthenticated, A::ClearCredentials),

        // Invalid/unhandled transition: stay in current state
        (state, _) => (state, A::None),
    }
}
