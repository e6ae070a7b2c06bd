use std::time::Duration;

use storehost_core::host::NOT_FOUND_REDIRECT_DELAY;
use storehost_core::{LandingHosts, RequestScope, TenantCondition, TenantResolutionState};
use storehost_platform::{Resolution, ResolutionReason};

/// Tenant state for the current page.
///
/// The scope is always derived from the state it was stored with, so
/// tenant-scoped calls never run against an older tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantStore {
    state: TenantResolutionState,
    scope: RequestScope,
    reason: Option<ResolutionReason>,
}

impl TenantStore {
    /// A store in the loading state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt the tenant state a server render computed.
    pub fn seed_from_snapshot(&mut self, state: TenantResolutionState) {
        self.scope = state
            .tenant_id()
            .cloned()
            .map_or_else(RequestScope::unscoped, RequestScope::for_tenant);
        self.reason = match state.condition() {
            TenantCondition::Resolved => Some(ResolutionReason::Resolved),
            TenantCondition::Landing => Some(ResolutionReason::Landing),
            TenantCondition::NotFound => Some(ResolutionReason::NotFound),
            TenantCondition::Loading => None,
        };
        self.state = state;
    }

    /// Adopt a fresh resolution, replacing whatever was seeded.
    pub fn apply_resolution(&mut self, resolution: Resolution) {
        self.state = resolution.state;
        self.scope = resolution.scope;
        self.reason = Some(resolution.reason);
    }

    #[must_use]
    pub const fn state(&self) -> &TenantResolutionState {
        &self.state
    }

    #[must_use]
    pub const fn scope(&self) -> &RequestScope {
        &self.scope
    }

    /// Why the store holds its state; `None` while loading.
    ///
    /// A snapshot cannot tell a failed lookup from a confirmed absence, so
    /// seeded not-found states report `NotFound`.
    #[must_use]
    pub const fn reason(&self) -> Option<ResolutionReason> {
        self.reason
    }

    /// The redirect to run when the store was not found.
    #[must_use]
    pub fn fallback_redirect(
        &self,
        landing: &LandingHosts,
        scheme: &str,
        authority: &str,
    ) -> Option<FallbackRedirect> {
        self.state.store_not_found.then(|| FallbackRedirect {
            target: landing.not_found_redirect(scheme, authority),
            delay: NOT_FOUND_REDIRECT_DELAY,
        })
    }
}

/// A timed redirect from a store-not-found page to the landing domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackRedirect {
    pub target: String,
    pub delay: Duration,
}

impl FallbackRedirect {
    /// Whole seconds left to show in the countdown after `elapsed`.
    #[must_use]
    pub fn remaining_seconds(&self, elapsed: Duration) -> u64 {
        let remaining = self.delay.saturating_sub(elapsed);
        remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
    }

    /// Wait out the countdown and return the target to navigate to.
    pub async fn wait(self) -> String {
        tokio::time::sleep(self.delay).await;
        self.target
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storehost_core::{TenantId, TenantIdentity};

    use super::*;

    fn landing() -> LandingHosts {
        LandingHosts::new("shopmesh.io", Vec::new())
    }

    #[test]
    fn test_seed_resolved_sets_scope() {
        let mut store = TenantStore::new();
        let tenant = TenantIdentity::from_business_name(TenantId::new("t1"), "Shop");
        store.seed_from_snapshot(TenantResolutionState::resolved(tenant));

        assert_eq!(store.scope().tenant(), Some(&TenantId::new("t1")));
        assert_eq!(store.reason(), Some(ResolutionReason::Resolved));
    }

    #[test]
    fn test_resolution_replaces_seeded_state() {
        let mut store = TenantStore::new();
        let tenant = TenantIdentity::from_business_name(TenantId::new("t1"), "Shop");
        store.seed_from_snapshot(TenantResolutionState::resolved(tenant));

        store.apply_resolution(Resolution {
            state: TenantResolutionState::not_found(Some("tenant lookup failed".to_string())),
            scope: RequestScope::unscoped(),
            reason: ResolutionReason::LookupFailed,
        });

        assert!(!store.scope().is_scoped());
        assert!(store.state().tenant.is_none());
        assert_eq!(store.reason(), Some(ResolutionReason::LookupFailed));
    }

    #[test]
    fn test_fallback_redirect_only_when_not_found() {
        let mut store = TenantStore::new();
        assert!(store.fallback_redirect(&landing(), "https", "x.shopmesh.io").is_none());

        store.seed_from_snapshot(TenantResolutionState::not_found(None));
        let redirect = store
            .fallback_redirect(&landing(), "http", "ghost.shopmesh.io")
            .unwrap();
        assert_eq!(redirect.target, "http://shopmesh.io");
        assert_eq!(redirect.delay, Duration::from_secs(5));
    }

    #[test]
    fn test_countdown_seconds() {
        let redirect = FallbackRedirect {
            target: "https://shopmesh.io".to_string(),
            delay: Duration::from_secs(5),
        };
        assert_eq!(redirect.remaining_seconds(Duration::ZERO), 5);
        assert_eq!(redirect.remaining_seconds(Duration::from_millis(1500)), 4);
        assert_eq!(redirect.remaining_seconds(Duration::from_secs(9)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_resolves_to_target_after_delay() {
        let redirect = FallbackRedirect {
            target: "http://localhost:5173".to_string(),
            delay: Duration::from_secs(5),
        };
        let start = tokio::time::Instant::now();
        assert_eq!(redirect.wait().await, "http://localhost:5173");
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
