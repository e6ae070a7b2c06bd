//! Integration tests for Storehost.
//!
//! Every test runs against [`MockPlatform`], an axum server on an ephemeral
//! local port that speaks the platform API's wire format. No external
//! services are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storehost-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `tenant_resolution` - Hostname lookup over HTTP
//! - `storefront_pages` - Server rendering through the storefront router
//! - `bootstrap_flow` - Rendered snapshot consumed by the client bootstrap
//! - `cart_flow` - Cart reconciliation against the remote cart

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::{Multipart, Path, Query, Request, State},
    http::{HeaderMap, Method, StatusCode, header::AUTHORIZATION},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use storehost_platform::{PlatformClient, PlatformConfig, PlatformError};
use storehost_storefront::config::{Environment, StorefrontConfig};
use storehost_storefront::state::AppState;
use tokio::net::TcpListener;
use url::Url;

/// Root domain the mock tenants live under.
pub const ROOT_DOMAIN: &str = "shopmesh.test";
/// Host of the seeded tenant `t-1`.
pub const TENANT_HOST: &str = "tienda.shopmesh.test";
/// Host of the seeded tenant `t-2`, which has an empty catalog.
pub const OTHER_TENANT_HOST: &str = "otra.shopmesh.test";
/// Host the platform answers with an empty payload.
pub const UNKNOWN_HOST: &str = "vacia.shopmesh.test";
/// Host whose lookup fails with a server error.
pub const BROKEN_HOST: &str = "caida.shopmesh.test";
/// The only bearer token the mock accepts.
pub const VALID_TOKEN: &str = "tok-valid";

const TENANT_HEADER: &str = "x-tenant-id";

/// One request received by the mock.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub tenant: Option<String>,
    pub bearer: Option<String>,
}

#[derive(Default)]
struct MockState {
    calls: Mutex<Vec<RecordedCall>>,
    carts: Mutex<HashMap<String, BTreeMap<String, i64>>>,
    deltas: Mutex<Vec<(String, i64)>>,
    proofs: Mutex<Vec<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process stand-in for the platform API.
///
/// Seeded with two tenants (`t-1` at [`TENANT_HOST`] with a small catalog,
/// `t-2` at [`OTHER_TENANT_HOST`] with none), an empty answer for
/// [`UNKNOWN_HOST`] and a 500 for [`BROKEN_HOST`].
pub struct MockPlatform {
    addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockPlatform {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(MockState::default());
        let router = Router::new()
            .route("/health", get(|| async { "ok" }))
            .route("/public/tenant/resolve", get(resolve_tenant))
            .route("/auth/me", get(current_session))
            .route("/cart", get(fetch_cart))
            .route("/cart/items", post(apply_delta))
            .route("/cart/checkout", post(checkout))
            .route("/public/products", get(products))
            .route("/public/products/{id}", get(product))
            .route("/public/categories", get(categories))
            .route("/public/categories/{slug}", get(category))
            .route("/public/categories/{slug}/products", get(category_products))
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move { axum::serve(listener, router).await });

        Ok(Self { addr, state })
    }

    /// Base URL of the mock API.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// A platform client pointed at the mock.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built.
    pub fn client(&self) -> Result<PlatformClient, PlatformError> {
        let mut config = PlatformConfig::new(&self.base_url())?;
        config.timeout = Duration::from_secs(5);
        PlatformClient::new(&config)
    }

    /// Every request received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.state.calls).clone()
    }

    /// Number of requests received for a path.
    #[must_use]
    pub fn calls_to(&self, path: &str) -> usize {
        lock(&self.state.calls)
            .iter()
            .filter(|c| c.path == path)
            .count()
    }

    /// Cart deltas received, as `(tenant, delta)`.
    #[must_use]
    pub fn deltas(&self) -> Vec<(String, i64)> {
        lock(&self.state.deltas).clone()
    }

    /// File names of submitted payment proofs.
    #[must_use]
    pub fn proofs(&self) -> Vec<String> {
        lock(&self.state.proofs).clone()
    }

    /// Forget recorded calls, keeping cart contents.
    pub fn reset_calls(&self) {
        lock(&self.state.calls).clear();
    }
}

/// Storefront configuration pointed at a platform URL.
///
/// # Errors
///
/// Returns an error if `platform_url` is not a valid URL.
pub fn storefront_config(platform_url: &str) -> Result<StorefrontConfig, url::ParseError> {
    Ok(StorefrontConfig {
        host: std::net::Ipv4Addr::LOCALHOST.into(),
        port: 0,
        base_url: Url::parse(&format!("http://{ROOT_DOMAIN}"))?,
        environment: Environment::Development,
        platform_api_url: Url::parse(platform_url)?,
        platform_api_key: None,
        root_domain: ROOT_DOMAIN.to_string(),
        extra_landing_hosts: Vec::new(),
        sentry_dsn: None,
        sentry_environment: None,
    })
}

/// Storefront state wired to the mock.
///
/// # Errors
///
/// Returns an error if the configuration or platform client is invalid.
pub fn storefront_state(platform: &MockPlatform) -> Result<AppState, Box<dyn std::error::Error>> {
    let config = storefront_config(&platform.base_url())?;
    Ok(AppState::with_platform(config, platform.client()?))
}

/// Read a response body as text.
///
/// # Errors
///
/// Returns an error if the body cannot be read or is not UTF-8.
pub async fn body_text(response: Response) -> Result<String, Box<dyn std::error::Error>> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

/// A GET request for `path` on `host`, optionally with a session cookie.
///
/// # Errors
///
/// Returns an error if the request cannot be built.
pub fn page_request(
    host: &str,
    path: &str,
    session: Option<&str>,
) -> Result<Request, axum::http::Error> {
    let mut builder = axum::http::Request::builder().uri(path).header("host", host);
    if let Some(token) = session {
        builder = builder.header("cookie", format!("storehost_session={token}"));
    }
    builder.body(Body::empty())
}

// =============================================================================
// Mock handlers
// =============================================================================

async fn record(State(state): State<Arc<MockState>>, request: Request, next: Next) -> Response {
    let call = {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        RecordedCall {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            query: request.uri().query().map(String::from),
            tenant: header(TENANT_HEADER),
            bearer: header(AUTHORIZATION.as_str())
                .and_then(|v| v.strip_prefix("Bearer ").map(String::from)),
        }
    };
    lock(&state.calls).push(call);
    next.run(request).await
}

fn tenant_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get(TENANT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn missing_tenant() -> Response {
    (StatusCode::BAD_REQUEST, "x-tenant-id required").into_response()
}

fn data(value: Value) -> Response {
    Json(json!({ "data": value })).into_response()
}

fn product_json(id: &str, name: &str, amount: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("{name}, hecho a mano"),
        "price": {"amount": amount, "currencyCode": "MXN"},
        "images": [format!("https://cdn.shopmesh.test/{id}.jpg")],
        "categoryId": "c-ropa",
    })
}

fn catalog(tenant: &str) -> Vec<Value> {
    if tenant == "t-1" {
        vec![
            product_json("p1", "Camisa de lino", "450.00"),
            product_json("p2", "Sombrero", "320.50"),
        ]
    } else {
        Vec::new()
    }
}

fn category_json(tenant: &str, slug: &str) -> Option<Value> {
    (tenant == "t-1" && slug == "ropa").then(|| {
        json!({"id": "c-ropa", "name": "Ropa", "slug": "ropa", "description": "Ropa de temporada"})
    })
}

async fn resolve_tenant(Query(params): Query<HashMap<String, String>>) -> Response {
    match params.get("url").map(String::as_str) {
        Some(TENANT_HOST) => data(json!({
            "tenantId": "t-1",
            "businessName": "la  tienda feliz",
            "logo": "https://cdn.shopmesh.test/t-1/logo.png",
            "banner": "",
            "socialMedia": {"instagram": "https://instagram.com/tiendafeliz", "tiktok": null},
        })),
        Some(OTHER_TENANT_HOST) => data(json!({"tenantId": "t-2", "businessName": "otra tienda"})),
        Some(BROKEN_HOST) => (StatusCode::INTERNAL_SERVER_ERROR, "lookup unavailable").into_response(),
        _ => data(Value::Null),
    }
}

async fn current_session(headers: HeaderMap) -> Response {
    let authorized = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {VALID_TOKEN}"));
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "invalid session").into_response();
    }
    data(json!({
        "user": {"id": "u1", "email": "ana@tiendafeliz.test", "name": "Ana"},
        "billingRequired": false,
    }))
}

fn cart_json(state: &MockState, tenant: &str) -> Value {
    let carts = lock(&state.carts);
    let items: Vec<Value> = carts
        .get(tenant)
        .into_iter()
        .flatten()
        .filter(|(_, quantity)| **quantity > 0)
        .map(|(product_id, quantity)| json!({"productId": product_id, "quantity": quantity}))
        .collect();
    json!({ "items": items })
}

async fn fetch_cart(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    match tenant_of(&headers) {
        Some(tenant) => data(cart_json(&state, &tenant)),
        None => missing_tenant(),
    }
}

async fn apply_delta(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(tenant) = tenant_of(&headers) else {
        return missing_tenant();
    };
    let (Some(product_id), Some(delta)) = (body["productId"].as_str(), body["delta"].as_i64())
    else {
        return (StatusCode::UNPROCESSABLE_ENTITY, "productId and delta required").into_response();
    };

    *lock(&state.carts)
        .entry(tenant.clone())
        .or_default()
        .entry(product_id.to_string())
        .or_insert(0) += delta;
    lock(&state.deltas).push((tenant, delta));
    StatusCode::NO_CONTENT.into_response()
}

async fn checkout(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let Some(tenant) = tenant_of(&headers) else {
        return missing_tenant();
    };

    let mut proof = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("proof") {
            proof = field.file_name().map(String::from);
            let _ = field.bytes().await;
        }
    }
    let Some(proof) = proof else {
        return (StatusCode::UNPROCESSABLE_ENTITY, "proof required").into_response();
    };
    lock(&state.proofs).push(proof);

    // The pre-checkout cart is echoed back before it is emptied.
    let echoed = cart_json(&state, &tenant);
    lock(&state.carts).remove(&tenant);
    data(json!({"orderId": "o-100", "status": "pending_review", "cart": echoed}))
}

async fn products(headers: HeaderMap) -> Response {
    tenant_of(&headers).map_or_else(missing_tenant, |tenant| data(json!(catalog(&tenant))))
}

async fn product(headers: HeaderMap, Path(id): Path<String>) -> Response {
    let Some(tenant) = tenant_of(&headers) else {
        return missing_tenant();
    };
    catalog(&tenant)
        .into_iter()
        .find(|p| p["id"] == id.as_str())
        .map_or_else(
            || (StatusCode::NOT_FOUND, "no such product").into_response(),
            data,
        )
}

async fn categories(headers: HeaderMap) -> Response {
    tenant_of(&headers).map_or_else(missing_tenant, |tenant| {
        data(json!(category_json(&tenant, "ropa").into_iter().collect::<Vec<_>>()))
    })
}

async fn category(headers: HeaderMap, Path(slug): Path<String>) -> Response {
    let Some(tenant) = tenant_of(&headers) else {
        return missing_tenant();
    };
    category_json(&tenant, &slug).map_or_else(
        || (StatusCode::NOT_FOUND, "no such category").into_response(),
        data,
    )
}

async fn category_products(headers: HeaderMap, Path(slug): Path<String>) -> Response {
    let Some(tenant) = tenant_of(&headers) else {
        return missing_tenant();
    };
    if category_json(&tenant, &slug).is_none() {
        return (StatusCode::NOT_FOUND, "no such category").into_response();
    }
    data(json!(catalog(&tenant)))
}
