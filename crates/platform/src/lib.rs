//! Storehost platform API client and tenant resolution.
//!
//! # Architecture
//!
//! - The remote platform API is the source of truth for tenants, sessions,
//!   carts and catalogs. Nothing is synced locally.
//! - Every collaborator is a trait ([`TenantLookup`], [`SessionApi`],
//!   [`CartApi`], [`CatalogApi`]) implemented by [`PlatformClient`], so the
//!   bootstrap logic can be exercised against in-memory fakes.
//! - Tenant-scoped calls take an explicit [`RequestScope`]; the client never
//!   remembers a tenant between calls.
//! - Catalog responses are cached in memory via `moka` (5 minute TTL).
//!
//! # Example
//!
//! ```rust,ignore
//! use storehost_core::LandingHosts;
//! use storehost_platform::{PlatformClient, TenantResolver};
//!
//! let client = PlatformClient::new(&config.platform)?;
//! let resolver = TenantResolver::new(client.clone(), LandingHosts::new("shopmesh.io", []));
//!
//! let resolution = resolver.resolve("tienda.shopmesh.io").await;
//! let products = client.products(&resolution.scope).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod client;
pub mod tenant;

pub use api::{
    AuthSession, CartApi, CatalogApi, PaymentProof, SessionApi, TenantLookup, TenantPayload,
};
pub use client::{PlatformClient, PlatformConfig, SessionToken};
pub use tenant::{Resolution, ResolutionReason, TenantResolver};

use storehost_core::RequestScope;
use thiserror::Error;

/// Errors that can occur when talking to the platform API.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No valid session credential.
    #[error("Unauthorized")]
    Unauthorized,

    /// A tenant-scoped call was attempted without a tenant.
    #[error("Tenant scope required for {0}")]
    MissingScope(&'static str),

    /// Rate limited by the platform.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PlatformError {
    /// Whether the error is a server/transport failure rather than a
    /// definitive answer from the platform.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited(_) => true,
            Self::Status { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}

/// Reject tenant-scoped calls made without a tenant.
pub(crate) fn require_tenant<'a>(
    scope: &'a RequestScope,
    operation: &'static str,
) -> Result<&'a storehost_core::TenantId, PlatformError> {
    scope
        .tenant()
        .ok_or(PlatformError::MissingScope(operation))
}
