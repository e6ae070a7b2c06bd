//! Client-side stores populated by the bootstrap.
//!
//! Stores change state only through their own operations: seeding from a
//! snapshot, applying a resolution or a session result.

mod auth;
mod tenant;

pub use auth::AuthStore;
pub use tenant::{FallbackRedirect, TenantStore};
