//! Platform API client implementation.
//!
//! Uses `reqwest` for HTTP. Responses are wrapped in a `{"data": ...}`
//! envelope. Catalog reads are cached using `moka` (5-minute TTL).

mod cache;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use storehost_core::{
    Cart, CartDelta, Category, CheckoutResult, Product, ProductId, QueryKey, RequestScope,
    TENANT_HEADER,
};
use tracing::{debug, instrument};
use url::Url;

use crate::api::{
    AuthSession, CartApi, CatalogApi, PaymentProof, SessionApi, TenantLookup, TenantPayload,
};
use crate::{PlatformError, require_tenant};

use cache::CacheValue;

/// Header carrying the server-to-platform API key.
const API_KEY_HEADER: &str = "x-api-key";

/// Maximum number of response-body characters kept in errors and logs.
const ERROR_BODY_LIMIT: usize = 200;

/// Platform API connection settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct PlatformConfig {
    /// Base URL of the platform API (e.g. `https://api.shopmesh.io/v1`)
    pub base_url: Url,
    /// Server-side API key, if the deployment uses one
    pub api_key: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PlatformConfig {
    /// Settings for a base URL with no API key and a 10-second timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or cannot carry a path.
    pub fn new(base_url: &str) -> Result<Self, PlatformError> {
        let base_url =
            Url::parse(base_url).map_err(|e| PlatformError::Config(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(PlatformError::Config(format!(
                "{base_url}: not a hierarchical URL"
            )));
        }

        Ok(Self {
            base_url,
            api_key: None,
            timeout: Duration::from_secs(10),
        })
    }
}

/// Opaque bearer token carried by the session cookie.
#[derive(Clone)]
pub struct SessionToken(SecretString);

impl SessionToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

// =============================================================================
// PlatformClient
// =============================================================================

/// Client for the platform API.
///
/// Cheap to clone. [`PlatformClient::with_session`] returns a copy that
/// authenticates as the holder of a session token; the shared connection
/// pool and cache are reused.
#[derive(Clone)]
pub struct PlatformClient {
    inner: Arc<PlatformClientInner>,
    session: Option<SessionToken>,
}

struct PlatformClientInner {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<SecretString>,
    cache: Cache<String, CacheValue>,
}

impl PlatformClient {
    /// Create a new platform client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &PlatformConfig) -> Result<Self, PlatformError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(PlatformClientInner {
                client,
                base_url: config.base_url.clone(),
                api_key: config.api_key.clone(),
                cache,
            }),
            session: None,
        })
    }

    /// A copy of this client that sends `token` as its bearer credential.
    #[must_use]
    pub fn with_session(&self, token: SessionToken) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            session: Some(token),
        }
    }

    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Probe the platform API for readiness checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the API is unreachable or unhealthy.
    pub async fn ping(&self) -> Result<(), PlatformError> {
        let request = self.request(Method::GET, &["health"], None)?;
        Self::read_body(request).await.map(|_| ())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, PlatformError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| PlatformError::Config("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build a request, attaching credentials and the tenant scope if given.
    fn request(
        &self,
        method: Method,
        segments: &[&str],
        scope: Option<&RequestScope>,
    ) -> Result<RequestBuilder, PlatformError> {
        let mut request = self.inner.client.request(method, self.endpoint(segments)?);

        if let Some(tenant) = scope.and_then(RequestScope::tenant) {
            request = request.header(TENANT_HEADER, tenant.as_str());
        }
        if let Some(key) = &self.inner.api_key {
            request = request.header(API_KEY_HEADER, key.expose_secret());
        }
        if let Some(token) = &self.session {
            request = request.bearer_auth(token.expose());
        }

        Ok(request)
    }

    /// Send a request and return the body of a successful response.
    async fn read_body(request: RequestBuilder) -> Result<String, PlatformError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(PlatformError::RateLimited(retry_after));
        }

        let path = response.url().path().to_string();
        let body = response.text().await?;

        match status {
            s if s.is_success() => Ok(body),
            StatusCode::UNAUTHORIZED => Err(PlatformError::Unauthorized),
            StatusCode::NOT_FOUND => Err(PlatformError::NotFound(path)),
            _ => {
                tracing::error!(
                    status = %status,
                    body = %body.chars().take(500).collect::<String>(),
                    "Platform API returned non-success status"
                );
                Err(PlatformError::Status {
                    status,
                    body: body.chars().take(ERROR_BODY_LIMIT).collect(),
                })
            }
        }
    }

    /// Send a request and unwrap the `data` envelope.
    async fn execute<T: DeserializeOwned>(
        request: RequestBuilder,
    ) -> Result<Option<T>, PlatformError> {
        let body = Self::read_body(request).await?;

        if body.trim().is_empty() {
            return Ok(None);
        }

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse platform API response"
            );
            PlatformError::Parse(e)
        })?;

        Ok(envelope.data)
    }

    async fn cache_get<T>(&self, key: &QueryKey, hit: fn(CacheValue) -> Option<T>) -> Option<T> {
        let value = self.inner.cache.get(&key.cache_key()).await.and_then(hit);
        if value.is_some() {
            debug!(key = %key, "Cache hit");
        }
        value
    }

    async fn cache_put(&self, key: &QueryKey, value: CacheValue) {
        self.inner.cache.insert(key.cache_key(), value).await;
    }
}

// =============================================================================
// Tenant lookup
// =============================================================================

impl TenantLookup for PlatformClient {
    #[instrument(skip(self), fields(hostname = %hostname))]
    async fn lookup_tenant(&self, hostname: &str) -> Result<Option<TenantPayload>, PlatformError> {
        let request = self
            .request(Method::GET, &["public", "tenant", "resolve"], None)?
            .query(&[("url", hostname)]);

        match Self::execute::<TenantPayload>(request).await {
            // A 404 is a definitive "no tenant" answer, not a failure.
            Err(PlatformError::NotFound(_)) => Ok(None),
            other => other,
        }
    }
}

// =============================================================================
// Session
// =============================================================================

impl SessionApi for PlatformClient {
    #[instrument(skip(self, scope), fields(tenant_id = ?scope.tenant()))]
    async fn current_session(
        &self,
        scope: &RequestScope,
    ) -> Result<Option<AuthSession>, PlatformError> {
        if self.session.is_none() {
            return Ok(None);
        }

        let request = self.request(Method::GET, &["auth", "me"], Some(scope))?;
        match Self::execute::<AuthSession>(request).await {
            Err(PlatformError::Unauthorized) => Ok(None),
            other => other,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

impl CartApi for PlatformClient {
    #[instrument(skip(self, scope), fields(tenant_id = ?scope.tenant()))]
    async fn fetch_cart(&self, scope: &RequestScope) -> Result<Cart, PlatformError> {
        require_tenant(scope, "cart")?;
        let request = self.request(Method::GET, &["cart"], Some(scope))?;
        Ok(Self::execute::<Cart>(request).await?.unwrap_or_default())
    }

    #[instrument(
        skip(self, scope, delta),
        fields(tenant_id = ?scope.tenant(), product_id = %delta.product_id, delta = delta.delta)
    )]
    async fn apply_delta(&self, scope: &RequestScope, delta: &CartDelta) -> Result<(), PlatformError> {
        require_tenant(scope, "cart")?;
        let request = self
            .request(Method::POST, &["cart", "items"], Some(scope))?
            .json(delta);
        Self::read_body(request).await.map(|_| ())
    }

    #[instrument(skip(self, scope, proof), fields(tenant_id = ?scope.tenant(), file = %proof.file_name))]
    async fn checkout(
        &self,
        scope: &RequestScope,
        proof: PaymentProof,
    ) -> Result<CheckoutResult, PlatformError> {
        require_tenant(scope, "checkout")?;

        let part = reqwest::multipart::Part::bytes(proof.bytes)
            .file_name(proof.file_name)
            .mime_str(&proof.content_type)?;
        let form = reqwest::multipart::Form::new().part("proof", part);

        let request = self
            .request(Method::POST, &["cart", "checkout"], Some(scope))?
            .multipart(form);
        Ok(Self::execute::<CheckoutResult>(request)
            .await?
            .unwrap_or_default())
    }
}

// =============================================================================
// Catalog
// =============================================================================

impl CatalogApi for PlatformClient {
    #[instrument(skip(self, scope), fields(tenant_id = ?scope.tenant()))]
    async fn products(&self, scope: &RequestScope) -> Result<Vec<Product>, PlatformError> {
        let key = QueryKey::Products {
            tenant: require_tenant(scope, "products")?.clone(),
        };

        let hit = |v: CacheValue| match v {
            CacheValue::Products(p) => Some(p),
            _ => None,
        };
        if let Some(products) = self.cache_get(&key, hit).await {
            return Ok(products);
        }

        let request = self.request(Method::GET, &["public", "products"], Some(scope))?;
        let products: Vec<Product> = Self::execute(request).await?.unwrap_or_default();

        self.cache_put(&key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    #[instrument(skip(self, scope), fields(tenant_id = ?scope.tenant(), product_id = %id))]
    async fn product(&self, scope: &RequestScope, id: &ProductId) -> Result<Product, PlatformError> {
        let key = QueryKey::Product {
            tenant: require_tenant(scope, "product")?.clone(),
            id: id.clone(),
        };

        let hit = |v: CacheValue| match v {
            CacheValue::Product(p) => Some(*p),
            _ => None,
        };
        if let Some(product) = self.cache_get(&key, hit).await {
            return Ok(product);
        }

        let request = self.request(
            Method::GET,
            &["public", "products", id.as_str()],
            Some(scope),
        )?;
        let product: Product = Self::execute(request)
            .await?
            .ok_or_else(|| PlatformError::NotFound(format!("product {id}")))?;

        self.cache_put(&key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    #[instrument(skip(self, scope), fields(tenant_id = ?scope.tenant()))]
    async fn categories(&self, scope: &RequestScope) -> Result<Vec<Category>, PlatformError> {
        let key = QueryKey::Categories {
            tenant: require_tenant(scope, "categories")?.clone(),
        };

        let hit = |v: CacheValue| match v {
            CacheValue::Categories(c) => Some(c),
            _ => None,
        };
        if let Some(categories) = self.cache_get(&key, hit).await {
            return Ok(categories);
        }

        let request = self.request(Method::GET, &["public", "categories"], Some(scope))?;
        let categories: Vec<Category> = Self::execute(request).await?.unwrap_or_default();

        self.cache_put(&key, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    #[instrument(skip(self, scope), fields(tenant_id = ?scope.tenant(), slug = %slug))]
    async fn category(&self, scope: &RequestScope, slug: &str) -> Result<Category, PlatformError> {
        let key = QueryKey::Category {
            tenant: require_tenant(scope, "category")?.clone(),
            slug: slug.to_string(),
        };

        let hit = |v: CacheValue| match v {
            CacheValue::Category(c) => Some(*c),
            _ => None,
        };
        if let Some(category) = self.cache_get(&key, hit).await {
            return Ok(category);
        }

        let request = self.request(Method::GET, &["public", "categories", slug], Some(scope))?;
        let category: Category = Self::execute(request)
            .await?
            .ok_or_else(|| PlatformError::NotFound(format!("category {slug}")))?;

        self.cache_put(&key, CacheValue::Category(Box::new(category.clone())))
            .await;
        Ok(category)
    }

    #[instrument(skip(self, scope), fields(tenant_id = ?scope.tenant(), slug = %slug))]
    async fn category_products(
        &self,
        scope: &RequestScope,
        slug: &str,
    ) -> Result<Vec<Product>, PlatformError> {
        let key = QueryKey::CategoryProducts {
            tenant: require_tenant(scope, "category products")?.clone(),
            slug: slug.to_string(),
        };

        let hit = |v: CacheValue| match v {
            CacheValue::Products(p) => Some(p),
            _ => None,
        };
        if let Some(products) = self.cache_get(&key, hit).await {
            return Ok(products);
        }

        let request = self.request(
            Method::GET,
            &["public", "categories", slug, "products"],
            Some(scope),
        )?;
        let products: Vec<Product> = Self::execute(request).await?.unwrap_or_default();

        self.cache_put(&key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }
}
