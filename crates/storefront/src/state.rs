//! Application state shared across handlers.

use std::sync::Arc;

use storehost_core::LandingHosts;
use storehost_platform::{PlatformClient, PlatformError, TenantResolver};

use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the platform client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    platform: PlatformClient,
    resolver: TenantResolver<PlatformClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform client cannot be configured.
    pub fn new(config: StorefrontConfig) -> Result<Self, PlatformError> {
        let platform = PlatformClient::new(&config.platform()?)?;
        Ok(Self::with_platform(config, platform))
    }

    /// Create application state around an existing platform client.
    #[must_use]
    pub fn with_platform(config: StorefrontConfig, platform: PlatformClient) -> Self {
        let resolver = TenantResolver::new(platform.clone(), config.landing_hosts());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                platform,
                resolver,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the platform API client.
    #[must_use]
    pub fn platform(&self) -> &PlatformClient {
        &self.inner.platform
    }

    /// Get a reference to the tenant resolver.
    #[must_use]
    pub fn resolver(&self) -> &TenantResolver<PlatformClient> {
        &self.inner.resolver
    }

    /// Get a reference to the landing-host policy.
    #[must_use]
    pub fn landing_hosts(&self) -> &LandingHosts {
        self.inner.resolver.landing_hosts()
    }
}
