//! Storehost Core - Shared types library.
//!
//! This crate provides the types shared by every Storehost component:
//! - `platform` - HTTP client for the remote platform API and tenant resolution
//! - `storefront` - Server-rendering pass that produces hydration snapshots
//! - `client` - Client runtime that consumes snapshots and owns the stores
//! - `cli` - Operator tooling
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows the server and the client
//! to agree on one definition of every wire and snapshot format.
//!
//! # Modules
//!
//! - [`types`] - IDs, tenant identity, catalog, cart, auth and scope types
//! - [`host`] - Landing-host policy and store-not-found redirect targets
//! - [`route`] - Route classification for server-rendered pages
//! - [`query`] - Query keys shared by the snapshot and the client cache
//! - [`hydration`] - Hydration snapshot schema and HTML embedding

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod host;
pub mod hydration;
pub mod query;
pub mod route;
pub mod types;

pub use host::LandingHosts;
pub use hydration::{HydrationError, HydrationSnapshot, SeoMeta, SnapshotBuilder};
pub use query::QueryKey;
pub use route::{Route, RouteKind};
pub use types::*;
