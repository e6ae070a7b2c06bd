//! Tenant resolution over HTTP against the mock platform.

#![allow(clippy::unwrap_used)]

use storehost_core::{LandingHosts, TenantCondition, TenantId};
use storehost_integration_tests::{
    BROKEN_HOST, MockPlatform, ROOT_DOMAIN, TENANT_HOST, UNKNOWN_HOST,
};
use storehost_platform::{
    PlatformClient, PlatformConfig, ResolutionReason, TenantLookup, TenantResolver,
};

const LOOKUP_PATH: &str = "/public/tenant/resolve";

fn resolver(client: PlatformClient) -> TenantResolver<PlatformClient> {
    TenantResolver::new(client, LandingHosts::new(ROOT_DOMAIN, Vec::new()))
}

#[tokio::test]
async fn test_landing_hosts_make_no_lookup() {
    let platform = MockPlatform::start().await.unwrap();
    let resolver = resolver(platform.client().unwrap());

    for host in [ROOT_DOMAIN, "www.shopmesh.test", "localhost", "127.0.0.1", "SHOPMESH.TEST:8080"] {
        let resolution = resolver.resolve(host).await;
        assert_eq!(resolution.state.condition(), TenantCondition::Landing, "{host}");
        assert!(!resolution.scope.is_scoped());
    }

    assert_eq!(platform.calls_to(LOOKUP_PATH), 0);
}

#[tokio::test]
async fn test_tenant_host_resolves_with_one_lookup() {
    let platform = MockPlatform::start().await.unwrap();
    let resolver = resolver(platform.client().unwrap());

    let resolution = resolver.resolve(TENANT_HOST).await;

    assert_eq!(platform.calls_to(LOOKUP_PATH), 1);
    let call = &platform.calls()[0];
    assert_eq!(call.query.as_deref(), Some("url=tienda.shopmesh.test"));
    assert_eq!(call.tenant, None);

    assert_eq!(resolution.reason, ResolutionReason::Resolved);
    assert_eq!(resolution.scope.tenant(), Some(&TenantId::new("t-1")));
    let tenant = resolution.state.tenant.unwrap();
    assert_eq!(tenant.slug, "la-tienda-feliz");
    assert_eq!(tenant.name, "La Tienda Feliz");
    assert_eq!(tenant.banner, None);
    let links = tenant.social_links.unwrap();
    assert_eq!(links.len(), 1);
}

#[tokio::test]
async fn test_empty_payload_is_store_not_found() {
    let platform = MockPlatform::start().await.unwrap();
    let resolver = resolver(platform.client().unwrap());

    let resolution = resolver.resolve(UNKNOWN_HOST).await;

    assert_eq!(resolution.reason, ResolutionReason::NotFound);
    assert!(resolution.state.store_not_found);
    assert!(resolution.state.tenant.is_none());
    assert!(resolution.state.error.is_none());
    assert!(!resolution.scope.is_scoped());
}

#[tokio::test]
async fn test_server_error_is_store_not_found_with_reason() {
    let platform = MockPlatform::start().await.unwrap();
    let resolver = resolver(platform.client().unwrap());

    let resolution = resolver.resolve(BROKEN_HOST).await;

    assert_eq!(resolution.reason, ResolutionReason::LookupFailed);
    assert!(resolution.state.store_not_found);
    assert!(resolution.state.tenant.is_none());
    assert!(resolution.state.error.is_some());
    assert_eq!(platform.calls_to(LOOKUP_PATH), 1);
}

#[tokio::test]
async fn test_unreachable_platform_is_lookup_failure() {
    // Bind and drop a listener so the port is known to be closed.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let client = PlatformClient::new(&PlatformConfig::new(&format!("http://{addr}/")).unwrap())
        .unwrap();

    assert!(client.lookup_tenant(TENANT_HOST).await.is_err());

    let resolution = resolver(client).resolve(TENANT_HOST).await;
    assert_eq!(resolution.reason, ResolutionReason::LookupFailed);
    assert_eq!(resolution.state.condition(), TenantCondition::NotFound);
}
