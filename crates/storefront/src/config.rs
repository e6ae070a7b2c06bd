//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL of the platform's own storefront
//! - `PLATFORM_API_URL` - Base URL of the platform API
//! - `PLATFORM_ROOT_DOMAIN` - Root domain tenants are served under (e.g. shopmesh.io)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_ENV` - `development` or `production` (default: development)
//! - `PLATFORM_API_KEY` - Server-side API key for the platform API
//! - `LANDING_HOSTS` - Comma-separated extra landing hostnames
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::BTreeSet;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use storehost_core::LandingHosts;
use storehost_platform::{PlatformConfig, PlatformError};
use thiserror::Error;
use url::Url;

/// Shortest API key accepted.
const MIN_API_KEY_LEN: usize = 24;

/// Fewest distinct characters an API key may use.
const MIN_API_KEY_DISTINCT: usize = 10;

/// Fragments that mark a value copied from a sample `.env`.
const PLACEHOLDER_FRAGMENTS: &[&str] = &[
    "changeme",
    "placeholder",
    "example",
    "your-",
    "your_",
    "replace",
    "xxxx",
    "todo",
    "dummy",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid environment variable {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("Rejected secret in {key}: {reason}")]
    WeakSecret { key: &'static str, reason: String },
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Storefront application configuration.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the platform storefront
    pub base_url: Url,
    /// Deployment environment
    pub environment: Environment,
    /// Platform API base URL
    pub platform_api_url: Url,
    /// Platform API key (server-side only)
    pub platform_api_key: Option<SecretString>,
    /// Root domain tenants are served under
    pub root_domain: String,
    /// Extra landing hostnames besides the root domain
    pub extra_landing_hosts: Vec<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted = |set: bool| if set { "[REDACTED]" } else { "unset" };
        f.debug_struct("StorefrontConfig")
            .field("listen", &self.socket_addr())
            .field("base_url", &self.base_url.as_str())
            .field("environment", &self.environment)
            .field("platform_api_url", &self.platform_api_url.as_str())
            .field("platform_api_key", &redacted(self.platform_api_key.is_some()))
            .field("root_domain", &self.root_domain)
            .field("extra_landing_hosts", &self.extra_landing_hosts)
            .field("sentry_dsn", &redacted(self.sentry_dsn.is_some()))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

/// Reads raw values by key. The process environment in production; a map
/// in tests.
struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    /// A trimmed value; blank counts as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    fn parsed<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            })
        })
    }

    /// A required http(s) URL.
    fn url(&self, key: &'static str) -> Result<Url, ConfigError> {
        let raw = self.required(key)?;
        let url = Url::parse(&raw).map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid {
                key,
                reason: format!("unsupported scheme '{scheme}'"),
            }),
        }
    }

    /// A comma-separated list, blanks dropped.
    fn list(&self, key: &str) -> Vec<String> {
        self.optional(key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn secret(&self, key: &'static str) -> Result<Option<SecretString>, ConfigError> {
        self.optional(key)
            .map(|value| {
                check_secret(key, &value)?;
                Ok(SecretString::from(value))
            })
            .transpose()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if the API key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(lookup);

        Ok(Self {
            host: vars.parsed("STOREFRONT_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: vars.parsed("STOREFRONT_PORT", 3000)?,
            base_url: vars.url("STOREFRONT_BASE_URL")?,
            environment: vars.parsed("STOREFRONT_ENV", Environment::Development)?,
            platform_api_url: vars.url("PLATFORM_API_URL")?,
            platform_api_key: vars.secret("PLATFORM_API_KEY")?,
            root_domain: vars.required("PLATFORM_ROOT_DOMAIN")?,
            extra_landing_hosts: vars.list("LANDING_HOSTS"),
            sentry_dsn: vars.optional("SENTRY_DSN"),
            sentry_environment: vars.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// The landing-host policy for this deployment.
    #[must_use]
    pub fn landing_hosts(&self) -> LandingHosts {
        LandingHosts::new(&self.root_domain, self.extra_landing_hosts.clone())
    }

    /// Configuration for the platform API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform URL cannot carry API paths.
    pub fn platform(&self) -> Result<PlatformConfig, PlatformError> {
        let mut config = PlatformConfig::new(self.platform_api_url.as_str())?;
        config.api_key.clone_from(&self.platform_api_key);
        Ok(config)
    }
}

/// Reject keys that are sample values or too short to be generated.
fn check_secret(key: &'static str, value: &str) -> Result<(), ConfigError> {
    let lower = value.to_ascii_lowercase();
    if let Some(fragment) = PLACEHOLDER_FRAGMENTS.iter().find(|f| lower.contains(**f)) {
        return Err(ConfigError::WeakSecret {
            key,
            reason: format!("looks like a placeholder (contains '{fragment}')"),
        });
    }

    if value.len() < MIN_API_KEY_LEN {
        return Err(ConfigError::WeakSecret {
            key,
            reason: format!("shorter than {MIN_API_KEY_LEN} characters"),
        });
    }

    let distinct = value.chars().collect::<BTreeSet<_>>().len();
    if distinct < MIN_API_KEY_DISTINCT {
        return Err(ConfigError::WeakSecret {
            key,
            reason: format!("only {distinct} distinct characters; use a generated key"),
        });
    }

    Ok(())
}
