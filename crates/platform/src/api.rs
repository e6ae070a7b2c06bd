//! Collaborator contracts for the platform API.
//!
//! Each trait covers one external interface. [`PlatformClient`] implements
//! all of them over HTTP; tests substitute in-memory fakes.
//!
//! [`PlatformClient`]: crate::PlatformClient

use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use storehost_core::{
    Cart, CartDelta, Category, CheckoutResult, Product, ProductId, RequestScope, TenantId,
    TenantIdentity, UserIdentity,
};

use crate::PlatformError;

/// Tenant payload returned by `GET /public/tenant/resolve`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantPayload {
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default)]
    pub favicon: Option<String>,
    #[serde(default)]
    pub social_media: Option<BTreeMap<String, Option<String>>>,
}

impl TenantPayload {
    /// Normalize into a tenant identity.
    ///
    /// Returns `None` when the payload carries no usable tenant id.
    #[must_use]
    pub fn into_identity(self) -> Option<TenantIdentity> {
        let id = self
            .tenant_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())?;

        let mut tenant = TenantIdentity::from_business_name(
            TenantId::new(id),
            self.business_name.as_deref().unwrap_or_default(),
        );
        tenant.logo = self.logo.filter(|s| !s.is_empty());
        tenant.banner = self.banner.filter(|s| !s.is_empty());
        tenant.favicon = self.favicon.filter(|s| !s.is_empty());
        tenant.social_links = self.social_media.map(|links| {
            links
                .into_iter()
                .filter_map(|(network, url)| url.filter(|u| !u.is_empty()).map(|u| (network, u)))
                .collect()
        });
        Some(tenant)
    }
}

/// A verified session as reported by `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: UserIdentity,
    #[serde(default)]
    pub billing_required: bool,
}

/// An out-of-band proof-of-payment artifact submitted at checkout.
#[derive(Clone)]
pub struct PaymentProof {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for PaymentProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentProof")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Hostname → tenant lookup.
pub trait TenantLookup: Send + Sync {
    /// Look up the tenant registered for a hostname.
    ///
    /// `Ok(None)` means the platform answered but has no tenant payload.
    fn lookup_tenant(
        &self,
        hostname: &str,
    ) -> impl Future<Output = Result<Option<TenantPayload>, PlatformError>> + Send;
}

/// Session verification.
pub trait SessionApi: Send + Sync {
    /// Verify the current session credential.
    ///
    /// `Ok(None)` means no valid session.
    fn current_session(
        &self,
        scope: &RequestScope,
    ) -> impl Future<Output = Result<Option<AuthSession>, PlatformError>> + Send;
}

/// Remote cart, the source of truth for quantities.
pub trait CartApi: Send + Sync {
    fn fetch_cart(
        &self,
        scope: &RequestScope,
    ) -> impl Future<Output = Result<Cart, PlatformError>> + Send;

    fn apply_delta(
        &self,
        scope: &RequestScope,
        delta: &CartDelta,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    fn checkout(
        &self,
        scope: &RequestScope,
        proof: PaymentProof,
    ) -> impl Future<Output = Result<CheckoutResult, PlatformError>> + Send;
}

/// Public catalog reads used for server-side pre-fetching.
pub trait CatalogApi: Send + Sync {
    fn products(
        &self,
        scope: &RequestScope,
    ) -> impl Future<Output = Result<Vec<Product>, PlatformError>> + Send;

    fn product(
        &self,
        scope: &RequestScope,
        id: &ProductId,
    ) -> impl Future<Output = Result<Product, PlatformError>> + Send;

    fn categories(
        &self,
        scope: &RequestScope,
    ) -> impl Future<Output = Result<Vec<Category>, PlatformError>> + Send;

    fn category(
        &self,
        scope: &RequestScope,
        slug: &str,
    ) -> impl Future<Output = Result<Category, PlatformError>> + Send;

    fn category_products(
        &self,
        scope: &RequestScope,
        slug: &str,
    ) -> impl Future<Output = Result<Vec<Product>, PlatformError>> + Send;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_normalizes_identity() {
        let payload: TenantPayload = serde_json::from_str(
            r#"{
                "tenantId": "t-7",
                "businessName": "la  tienda feliz",
                "logo": "https://cdn.example/logo.png",
                "banner": "",
                "socialMedia": {"instagram": "https://ig.example/tienda", "x": null}
            }"#,
        )
        .unwrap();

        let tenant = payload.into_identity().unwrap();
        assert_eq!(tenant.id.as_str(), "t-7");
        assert_eq!(tenant.slug, "la-tienda-feliz");
        assert_eq!(tenant.name, "La Tienda Feliz");
        assert_eq!(tenant.logo.as_deref(), Some("https://cdn.example/logo.png"));
        assert!(tenant.banner.is_none());
        let links = tenant.social_links.unwrap();
        assert_eq!(links.len(), 1);
        assert!(links.contains_key("instagram"));
    }

    #[test]
    fn test_payload_without_id_is_unusable() {
        let blank = TenantPayload {
            tenant_id: Some("  ".to_string()),
            business_name: Some("Shop".to_string()),
            ..TenantPayload::default()
        };
        assert!(blank.into_identity().is_none());
        assert!(TenantPayload::default().into_identity().is_none());
    }

    #[test]
    fn test_payment_proof_debug_hides_bytes() {
        let proof = PaymentProof {
            file_name: "receipt.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        };
        let debug = format!("{proof:?}");
        assert!(debug.contains("receipt.png"));
        assert!(debug.contains("len: 3"));
    }
}
