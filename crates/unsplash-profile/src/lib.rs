//! Profile bootstrap for an authenticated session
//!
//! Once a bearer token exists, the client needs to know who the user is
//! and what their avatar looks like:
//!
//! 1. `ProfileService` fetches `/me` and derives the display fields
//! 2. `AvatarService` fetches `/users/{username}` and broadcasts `AvatarChanged`
//! 3. `ProfileBootstrap` sequences the two, with the avatar fetch running
//!    in the background so its failure never fails the bootstrap

pub mod avatar;
pub mod bootstrap;
pub mod profile;

pub use avatar::{AvatarChanged, AvatarReference, AvatarService};
pub use bootstrap::ProfileBootstrap;
pub use profile::{Profile, ProfileResult, ProfileService};

#[cfg(test)]
pub(crate) mod testing;
