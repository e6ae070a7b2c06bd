//! Storehost client runtime.
//!
//! Everything that runs once a server-rendered page reaches the visitor:
//!
//! - [`hydration`] - the consumed-once hydration slot read from the page
//! - [`bootstrap`] - the coordinator that settles tenant and auth state
//! - [`stores`] - tenant and auth stores the UI reads from
//! - [`query`] - the query cache seeded from the snapshot
//! - [`cart`] - delta-based cart reconciliation against the platform
//! - [`navigation`] - epochs that let a superseded bootstrap drop its results
//!
//! # Example
//!
//! ```rust,ignore
//! let mut slot = storehost_client::prepare(&html)?;
//! let epoch = NavigationEpoch::new();
//! let queries = QueryClient::default();
//!
//! let outcome = BootstrapCoordinator::new(&resolver, &platform, &queries, epoch.begin())
//!     .run("tienda.shopmesh.io", slot.take())
//!     .await;
//!
//! if let Some(ready) = outcome.ready() {
//!     let cart = CartReconciler::new(platform.clone(), ready.tenant.scope().clone());
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bootstrap;
pub mod cart;
pub mod error;
pub mod hydration;
pub mod navigation;
pub mod query;
pub mod startup;
pub mod stores;

#[cfg(test)]
mod fakes;

pub use bootstrap::{BootstrapCoordinator, BootstrapOutcome, BootstrapPath, Bootstrapped};
pub use cart::{CartReconciler, CartState};
pub use error::{CartError, StartupError};
pub use hydration::{BootstrapFlags, HydrationSlot, SsrBootstrapPayload};
pub use navigation::{NavigationEpoch, NavigationToken};
pub use query::QueryClient;
pub use startup::prepare;
pub use stores::{AuthStore, FallbackRedirect, TenantStore};
