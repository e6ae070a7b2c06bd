use storehost_core::{AuthBootstrapState, UserIdentity};
use storehost_platform::{AuthSession, PlatformError};
use tracing::{info, warn};

/// Authentication state for the current page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthStore {
    state: AuthBootstrapState,
}

impl AuthStore {
    /// A store in the loading state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt the auth state a server render embedded.
    ///
    /// The `loading` flag is kept as embedded; call [`AuthStore::mark_settled`]
    /// when the embedded state is to be trusted without a round trip.
    pub fn seed_from_snapshot(&mut self, state: AuthBootstrapState) {
        self.state = state;
    }

    /// Finish loading without a network call.
    pub const fn mark_settled(&mut self) {
        self.state.loading = false;
    }

    /// Apply the result of a session round trip.
    ///
    /// Errors are absorbed: the visitor is treated as signed out and the
    /// cookie hint is kept.
    pub fn apply_session(&mut self, result: Result<Option<AuthSession>, PlatformError>) {
        let has_auth_cookie = self.state.has_auth_cookie;
        self.state = match result {
            Ok(Some(session)) => {
                info!(user_id = %session.user.id, "Session verified");
                AuthBootstrapState::authenticated(session.user, session.billing_required)
            }
            Ok(None) => AuthBootstrapState::anonymous(has_auth_cookie),
            Err(e) => {
                warn!(error = %e, "Session check failed, continuing signed out");
                AuthBootstrapState::anonymous(has_auth_cookie)
            }
        };
    }

    #[must_use]
    pub const fn state(&self) -> &AuthBootstrapState {
        &self.state
    }

    #[must_use]
    pub const fn user(&self) -> Option<&UserIdentity> {
        self.state.user.as_ref()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.state.loading
    }
}
