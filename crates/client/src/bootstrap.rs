//! Bootstrap coordinator.
//!
//! Runs once per page lifetime. It decides from the hydration payload
//! whether the server's work can be trusted, resolves the tenant when it
//! cannot, and then settles authentication. Tenant state, and with it the
//! request scope, is fixed before any session call is made.

use storehost_core::SeoMeta;
use storehost_platform::{SessionApi, TenantLookup, TenantResolver};
use tracing::{debug, info, instrument};

use crate::hydration::{BootstrapFlags, SsrBootstrapPayload};
use crate::navigation::NavigationToken;
use crate::query::QueryClient;
use crate::stores::{AuthStore, TenantStore};

/// The one execution path a bootstrap takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapPath {
    /// No usable snapshot: resolve the tenant, then check the session.
    ColdStart,
    /// No usable snapshot but a session cookie was seen. Same calls as
    /// [`BootstrapPath::ColdStart`].
    ColdStartWithCookie,
    /// Tenant from the snapshot; the cookie still needs a session check.
    VerifyCookie,
    /// Tenant and auth both from the snapshot, no network.
    TrustSnapshot,
}

impl BootstrapPath {
    #[must_use]
    pub const fn from_flags(flags: BootstrapFlags) -> Self {
        match (flags.skip_tenant_bootstrap, flags.hydrate_auth_from_cookie) {
            (false, false) => Self::ColdStart,
            (false, true) => Self::ColdStartWithCookie,
            (true, true) => Self::VerifyCookie,
            (true, false) => Self::TrustSnapshot,
        }
    }

    #[must_use]
    pub const fn resolves_tenant(self) -> bool {
        matches!(self, Self::ColdStart | Self::ColdStartWithCookie)
    }

    #[must_use]
    pub const fn checks_session(self) -> bool {
        !matches!(self, Self::TrustSnapshot)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ColdStart => "cold_start",
            Self::ColdStartWithCookie => "cold_start_with_cookie",
            Self::VerifyCookie => "verify_cookie",
            Self::TrustSnapshot => "trust_snapshot",
        }
    }
}

/// Stores produced by a completed bootstrap.
#[derive(Debug)]
pub struct Bootstrapped {
    pub path: BootstrapPath,
    pub tenant: TenantStore,
    pub auth: AuthStore,
    /// SEO metadata from the snapshot, when the tenant came from it.
    pub seo: Option<SeoMeta>,
}

/// How a bootstrap ended.
#[derive(Debug)]
pub enum BootstrapOutcome {
    Ready(Bootstrapped),
    /// A later navigation began while the bootstrap was suspended; its
    /// results were discarded.
    Abandoned { path: BootstrapPath },
}

impl BootstrapOutcome {
    #[must_use]
    pub const fn path(&self) -> BootstrapPath {
        match self {
            Self::Ready(ready) => ready.path,
            Self::Abandoned { path } => *path,
        }
    }

    #[must_use]
    pub fn ready(self) -> Option<Bootstrapped> {
        match self {
            Self::Ready(ready) => Some(ready),
            Self::Abandoned { .. } => None,
        }
    }
}

/// Sequences tenant resolution and session hydration for one page.
pub struct BootstrapCoordinator<'a, L, S> {
    resolver: &'a TenantResolver<L>,
    session: &'a S,
    queries: &'a QueryClient,
    navigation: NavigationToken,
}

impl<'a, L: TenantLookup, S: SessionApi> BootstrapCoordinator<'a, L, S> {
    #[must_use]
    pub const fn new(
        resolver: &'a TenantResolver<L>,
        session: &'a S,
        queries: &'a QueryClient,
        navigation: NavigationToken,
    ) -> Self {
        Self {
            resolver,
            session,
            queries,
            navigation,
        }
    }

    /// Run the bootstrap for `hostname`.
    ///
    /// Consumes the coordinator and the payload, so neither can run twice.
    /// Resolution and session errors end up in the stores; they are never
    /// returned.
    #[instrument(skip(self, payload), fields(path = tracing::field::Empty))]
    pub async fn run(
        self,
        hostname: &str,
        payload: Option<SsrBootstrapPayload>,
    ) -> BootstrapOutcome {
        let flags = BootstrapFlags::from_payload(payload.as_ref());
        let path = BootstrapPath::from_flags(flags);
        tracing::Span::current().record("path", path.as_str());
        debug!(epoch = self.navigation.epoch(), ?flags, "Bootstrap starting");

        let mut tenant = TenantStore::new();
        let mut auth = AuthStore::new();
        let mut seo = None;

        if let Some(snapshot) = payload.map(SsrBootstrapPayload::into_snapshot) {
            auth.seed_from_snapshot(snapshot.auth);
            if flags.skip_tenant_bootstrap {
                tenant.seed_from_snapshot(snapshot.tenant);
                if let Some(tenant_id) = tenant.scope().tenant() {
                    self.queries.hydrate(tenant_id, snapshot.queries).await;
                }
                seo = Some(snapshot.seo);
            }
        }

        if path.resolves_tenant() {
            let resolution = self.resolver.resolve(hostname).await;
            if !self.navigation.is_current() {
                info!("Navigation superseded during tenant resolution");
                return BootstrapOutcome::Abandoned { path };
            }
            tenant.apply_resolution(resolution);
        }

        if path.checks_session() {
            let result = self.session.current_session(tenant.scope()).await;
            if !self.navigation.is_current() {
                info!("Navigation superseded during session check");
                return BootstrapOutcome::Abandoned { path };
            }
            auth.apply_session(result);
        } else {
            auth.mark_settled();
        }

        info!(
            condition = ?tenant.state().condition(),
            signed_in = auth.user().is_some(),
            "Bootstrap complete"
        );
        BootstrapOutcome::Ready(Bootstrapped {
            path,
            tenant,
            auth,
            seo,
        })
    }
}
