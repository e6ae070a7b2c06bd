//! Tenant resolution command.
//!
//! # Usage
//!
//! ```bash
//! storehost resolve tienda.shopmesh.io
//! ```
//!
//! # Environment Variables
//!
//! - `PLATFORM_API_URL` - Base URL of the platform API
//! - `PLATFORM_API_KEY` - Optional server-side API key
//! - `PLATFORM_ROOT_DOMAIN` - Root domain whose hosts are landing hosts
//! - `LANDING_HOSTS` - Comma-separated extra landing hosts

use secrecy::SecretString;
use serde::Serialize;
use storehost_core::host::normalize_host;
use storehost_core::{LandingHosts, TenantId, TenantResolutionState};
use storehost_platform::{PlatformClient, PlatformConfig, Resolution, TenantResolver};

use super::{CommandError, required_env};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveOutput {
    hostname: String,
    reason: &'static str,
    scope: Option<TenantId>,
    state: TenantResolutionState,
}

impl ResolveOutput {
    fn new(hostname: String, resolution: Resolution) -> Self {
        Self {
            hostname,
            reason: resolution.reason.as_str(),
            scope: resolution.scope.tenant().cloned(),
            state: resolution.state,
        }
    }
}

/// Resolve `hostname` and render the outcome as pretty JSON.
///
/// # Errors
///
/// Returns an error if the environment is incomplete or the output cannot
/// be serialized. Lookup failures are part of the output, not errors.
pub async fn run(hostname: &str) -> Result<String, CommandError> {
    dotenvy::dotenv().ok();

    let mut config = PlatformConfig::new(&required_env("PLATFORM_API_URL")?)?;
    config.api_key = std::env::var("PLATFORM_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .map(SecretString::from);

    let root_domain = required_env("PLATFORM_ROOT_DOMAIN")?;
    let extra = std::env::var("LANDING_HOSTS")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(String::from)
        .collect::<Vec<_>>();

    let resolver = TenantResolver::new(
        PlatformClient::new(&config)?,
        LandingHosts::new(&root_domain, extra),
    );

    let hostname = normalize_host(hostname);
    tracing::info!(hostname = %hostname, api = %config.base_url, "Resolving tenant");
    let resolution = resolver.resolve(&hostname).await;

    Ok(serde_json::to_string_pretty(&ResolveOutput::new(
        hostname, resolution,
    ))?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storehost_core::{RequestScope, TenantIdentity};
    use storehost_platform::ResolutionReason;

    use super::*;

    #[test]
    fn test_output_carries_reason_and_scope() {
        let tenant = TenantIdentity::from_business_name(TenantId::new("t-1"), "la tienda");
        let resolution = Resolution {
            scope: RequestScope::for_tenant(tenant.id.clone()),
            state: TenantResolutionState::resolved(tenant),
            reason: ResolutionReason::Resolved,
        };

        let json = serde_json::to_value(ResolveOutput::new("tienda.shopmesh.io".into(), resolution))
            .unwrap();

        assert_eq!(json["reason"], "resolved");
        assert_eq!(json["scope"], "t-1");
        assert_eq!(json["state"]["tenant"]["slug"], "la-tienda");
    }

    #[test]
    fn test_missing_env_is_reported_by_name() {
        let err = required_env("STOREHOST_CLI_TEST_UNSET").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing environment variable: STOREHOST_CLI_TEST_UNSET"
        );
    }
}
