//! Explicit tenant scope for outgoing platform calls.

use serde::{Deserialize, Serialize};

use super::id::TenantId;

/// Header carrying the tenant scope on tenant-scoped requests.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// The tenant scope attached to a data-fetch call.
///
/// Produced by tenant resolution and passed by value to every tenant-scoped
/// call. Nothing holds a scope beyond the bootstrap that produced it, so a
/// hostname change can never leak a previous tenant into a new request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestScope {
    tenant: Option<TenantId>,
}

impl RequestScope {
    /// A scope with no tenant (landing pages, not-found hosts).
    #[must_use]
    pub const fn unscoped() -> Self {
        Self { tenant: None }
    }

    /// A scope bound to a tenant.
    #[must_use]
    pub const fn for_tenant(tenant: TenantId) -> Self {
        Self {
            tenant: Some(tenant),
        }
    }

    /// The tenant this scope is bound to.
    #[must_use]
    pub const fn tenant(&self) -> Option<&TenantId> {
        self.tenant.as_ref()
    }

    #[must_use]
    pub const fn is_scoped(&self) -> bool {
        self.tenant.is_some()
    }
}
