//! Tenant resolution.
//!
//! Maps an inbound hostname to a tenant identity before any tenant-scoped
//! data is fetched. The resolver is a pure function of the hostname, the
//! landing-host policy and one remote lookup.

use storehost_core::{LandingHosts, RequestScope, TenantResolutionState};
use tracing::{info, instrument, warn};

use crate::PlatformError;
use crate::api::{TenantLookup, TenantPayload};

/// Why a resolution ended the way it did.
///
/// `NotFound` and `LookupFailed` produce the same observable state; the
/// reason is kept so callers can tell a confirmed absence from a lookup
/// that could not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionReason {
    Resolved,
    Landing,
    NotFound,
    LookupFailed,
}

impl ResolutionReason {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Resolved => "resolved",
            Self::Landing => "landing",
            Self::NotFound => "not_found",
            Self::LookupFailed => "lookup_failed",
        }
    }
}

/// Outcome of resolving one hostname.
///
/// The scope is produced together with the state, so no tenant-scoped
/// call can be made against a scope older than the resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub state: TenantResolutionState,
    pub scope: RequestScope,
    pub reason: ResolutionReason,
}

impl Resolution {
    fn landing() -> Self {
        Self {
            state: TenantResolutionState::landing(),
            scope: RequestScope::unscoped(),
            reason: ResolutionReason::Landing,
        }
    }

    fn not_found(reason: ResolutionReason, error: Option<String>) -> Self {
        Self {
            state: TenantResolutionState::not_found(error),
            scope: RequestScope::unscoped(),
            reason,
        }
    }
}

/// Resolves hostnames to tenants.
#[derive(Debug, Clone)]
pub struct TenantResolver<L> {
    lookup: L,
    landing: LandingHosts,
}

impl<L: TenantLookup> TenantResolver<L> {
    #[must_use]
    pub const fn new(lookup: L, landing: LandingHosts) -> Self {
        Self { lookup, landing }
    }

    #[must_use]
    pub const fn landing_hosts(&self) -> &LandingHosts {
        &self.landing
    }

    #[must_use]
    pub const fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Resolve a hostname.
    ///
    /// Landing hosts short-circuit without a remote call. Any other host
    /// triggers exactly one lookup; lookup failures are absorbed into the
    /// store-not-found state.
    #[instrument(skip(self), fields(hostname = %hostname))]
    pub async fn resolve(&self, hostname: &str) -> Resolution {
        let hostname = hostname.trim();

        if self.landing.is_landing(hostname) {
            info!("Landing host, skipping tenant lookup");
            return Resolution::landing();
        }

        match self.lookup.lookup_tenant(hostname).await {
            Ok(payload) => match payload.and_then(TenantPayload::into_identity) {
                Some(tenant) => {
                    info!(tenant_id = %tenant.id, slug = %tenant.slug, "Tenant resolved");
                    Resolution {
                        scope: RequestScope::for_tenant(tenant.id.clone()),
                        state: TenantResolutionState::resolved(tenant),
                        reason: ResolutionReason::Resolved,
                    }
                }
                None => {
                    info!("No tenant registered for host");
                    Resolution::not_found(ResolutionReason::NotFound, None)
                }
            },
            Err(e) => {
                warn!(error = %e, transient = e.is_transient(), "Tenant lookup failed");
                Resolution::not_found(ResolutionReason::LookupFailed, Some(lookup_error_message(&e)))
            }
        }
    }
}

fn lookup_error_message(error: &PlatformError) -> String {
    format!("tenant lookup failed: {error}")
}
