//! Authentication bootstrap state.
//!
//! Only the non-secret view of a session crosses the server/client
//! boundary. The bearer token itself is never a field of these types.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// The signed-in user as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: UserId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Authentication state as seen during bootstrap.
///
/// `has_auth_cookie` is a server-side hint that a session credential was
/// present on the request. It is never proof of authentication; it only
/// decides whether the client must verify the session with a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthBootstrapState {
    pub user: Option<UserIdentity>,
    pub loading: bool,
    pub billing_required: bool,
    pub has_auth_cookie: bool,
}

impl Default for AuthBootstrapState {
    fn default() -> Self {
        Self::loading()
    }
}

impl AuthBootstrapState {
    /// Initial state before any session check.
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            user: None,
            loading: true,
            billing_required: false,
            has_auth_cookie: false,
        }
    }

    /// A settled anonymous state.
    #[must_use]
    pub const fn anonymous(has_auth_cookie: bool) -> Self {
        Self {
            user: None,
            loading: false,
            billing_required: false,
            has_auth_cookie,
        }
    }

    /// A settled, verified session.
    #[must_use]
    pub const fn authenticated(user: UserIdentity, billing_required: bool) -> Self {
        Self {
            user: Some(user),
            loading: false,
            billing_required,
            has_auth_cookie: true,
        }
    }

    /// True when a cookie was seen but no user could be embedded, so the
    /// client has to verify the session itself.
    #[must_use]
    pub const fn needs_verification(&self) -> bool {
        self.has_auth_cookie && self.user.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserIdentity {
        UserIdentity {
            id: UserId::new("u1"),
            email: "owner@example.com".to_string(),
            name: None,
        }
    }

    #[test]
    fn test_needs_verification() {
        assert!(AuthBootstrapState::anonymous(true).needs_verification());
        assert!(!AuthBootstrapState::anonymous(false).needs_verification());
        assert!(!AuthBootstrapState::authenticated(user(), false).needs_verification());
    }

    #[test]
    fn test_default_is_loading() {
        let state = AuthBootstrapState::default();
        assert!(state.loading);
        assert!(state.user.is_none());
    }
}
