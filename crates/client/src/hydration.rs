//! Client side of the hydration transport.
//!
//! The server embeds one snapshot per rendered page. The client reads it
//! into a [`HydrationSlot`], and the bootstrap takes the payload out of the
//! slot exactly once. The payload is not `Clone`, so it cannot be replayed
//! into a second bootstrap or a later navigation.

use storehost_core::{HydrationSnapshot, RouteKind, SeoMeta};
use tracing::{debug, warn};

/// Holds the page's snapshot until the bootstrap takes it.
#[derive(Debug, Default)]
pub struct HydrationSlot {
    payload: Option<SsrBootstrapPayload>,
    taken: bool,
}

impl HydrationSlot {
    /// An empty slot, as on a page rendered without a snapshot.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            payload: None,
            taken: false,
        }
    }

    #[must_use]
    pub const fn from_snapshot(snapshot: HydrationSnapshot) -> Self {
        Self {
            payload: Some(SsrBootstrapPayload { snapshot }),
            taken: false,
        }
    }

    /// Read the snapshot embedded in a page.
    ///
    /// A missing, malformed or unsupported snapshot leaves the slot empty,
    /// and the bootstrap takes the cold-start path.
    #[must_use]
    pub fn from_html(html: &str) -> Self {
        match HydrationSnapshot::from_html(html) {
            Some(Ok(snapshot)) => {
                debug!(route = snapshot.route.as_str(), "Hydration snapshot found");
                Self::from_snapshot(snapshot)
            }
            Some(Err(e)) => {
                warn!(error = %e, "Ignoring unreadable hydration snapshot");
                Self::empty()
            }
            None => Self::empty(),
        }
    }

    /// Take the payload. Returns `Some` at most once per slot.
    pub fn take(&mut self) -> Option<SsrBootstrapPayload> {
        if self.taken {
            warn!("Hydration payload already consumed");
            return None;
        }
        self.taken = true;
        self.payload.take()
    }

    #[must_use]
    pub const fn is_consumed(&self) -> bool {
        self.taken
    }
}

/// The consumed-once bootstrap payload.
#[derive(Debug)]
pub struct SsrBootstrapPayload {
    snapshot: HydrationSnapshot,
}

impl SsrBootstrapPayload {
    #[must_use]
    pub const fn route(&self) -> RouteKind {
        self.snapshot.route
    }

    #[must_use]
    pub const fn seo(&self) -> &SeoMeta {
        &self.snapshot.seo
    }

    #[must_use]
    pub const fn snapshot(&self) -> &HydrationSnapshot {
        &self.snapshot
    }

    pub(crate) fn into_snapshot(self) -> HydrationSnapshot {
        self.snapshot
    }
}

/// Decisions the bootstrap derives from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BootstrapFlags {
    /// The server already resolved the tenant for this page.
    pub skip_tenant_bootstrap: bool,
    /// A session cookie was seen but no user could be embedded.
    pub hydrate_auth_from_cookie: bool,
}

impl BootstrapFlags {
    #[must_use]
    pub const fn from_payload(payload: Option<&SsrBootstrapPayload>) -> Self {
        match payload {
            Some(payload) => Self {
                skip_tenant_bootstrap: payload.snapshot.is_server_computed(),
                hydrate_auth_from_cookie: payload.snapshot.auth.needs_verification(),
            },
            None => Self {
                skip_tenant_bootstrap: false,
                hydrate_auth_from_cookie: false,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storehost_core::{AuthBootstrapState, SnapshotBuilder, TenantResolutionState};

    use super::*;

    fn snapshot(route: RouteKind, auth: AuthBootstrapState) -> HydrationSnapshot {
        SnapshotBuilder::new(route)
            .tenant(TenantResolutionState::landing())
            .auth(auth)
            .finish()
    }

    #[test]
    fn test_take_returns_payload_once() {
        let mut slot = HydrationSlot::from_snapshot(snapshot(
            RouteKind::Home,
            AuthBootstrapState::anonymous(false),
        ));

        assert!(slot.take().is_some());
        assert!(slot.is_consumed());
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_empty_slot_is_consumed_by_first_take() {
        let mut slot = HydrationSlot::empty();
        assert!(slot.take().is_none());
        assert!(slot.is_consumed());
    }

    #[test]
    fn test_from_html_round_trip() {
        let tag = snapshot(RouteKind::Products, AuthBootstrapState::anonymous(true))
            .to_script_tag()
            .unwrap();
        let html = format!(r#"<html><body><div id="app"></div>{tag}</body></html>"#);

        let payload = HydrationSlot::from_html(&html).take().unwrap();
        assert_eq!(payload.route(), RouteKind::Products);
    }

    #[test]
    fn test_unreadable_snapshot_is_absent() {
        let html = r#"<script id="__SSR_BOOTSTRAP__" type="application/json">{"version":99}</script>"#;
        assert!(HydrationSlot::from_html(html).take().is_none());
        assert!(HydrationSlot::from_html("<html></html>").take().is_none());
    }

    #[test]
    fn test_flags() {
        assert_eq!(BootstrapFlags::from_payload(None), BootstrapFlags::default());

        let mut slot = HydrationSlot::from_snapshot(snapshot(
            RouteKind::Spa,
            AuthBootstrapState::anonymous(true),
        ));
        let flags = BootstrapFlags::from_payload(slot.take().as_ref());
        assert!(!flags.skip_tenant_bootstrap);
        assert!(flags.hydrate_auth_from_cookie);

        let mut slot = HydrationSlot::from_snapshot(snapshot(
            RouteKind::Home,
            AuthBootstrapState::anonymous(false),
        ));
        let flags = BootstrapFlags::from_payload(slot.take().as_ref());
        assert!(flags.skip_tenant_bootstrap);
        assert!(!flags.hydrate_auth_from_cookie);
    }
}
