//! Request coordination for the photo API
//!
//! Every network call in the workspace goes through `RequestCoordinator`:
//! it signs requests with the bearer token, maps transport and HTTP
//! failures onto `NetworkError`, and decodes JSON bodies into typed
//! responses. Logical operations (token exchange, profile fetch, avatar
//! fetch) run under a `SingleFlight` so a newer request always supersedes
//! an older one and the older one's result is never applied.

pub mod coordinator;
pub mod error;
pub mod flight;
pub mod request;

pub use coordinator::RequestCoordinator;
pub use error::{NetworkError, Result};
pub use flight::{FlightGuard, SingleFlight};
pub use request::{ApiRequest, api_url};
