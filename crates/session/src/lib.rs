//! Authenticated session for the image feed client
//!
//! `Session` is the single entry point the UI layer calls. It ties the
//! token store, the code exchange, and the profile bootstrap together and
//! tracks where the user is in the login lifecycle through the pure state
//! machine in `state`.

pub mod error;
pub mod facade;
pub mod state;

pub use error::{Result, SessionError};
pub use facade::Session;
pub use state::{SessionAction, SessionEvent, SessionState, handle_event};
