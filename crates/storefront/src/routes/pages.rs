//! Server-rendered page shells.
//!
//! Every page is the same HTML shell: a mount point for the client runtime
//! plus the hydration snapshot computed for this request. Only routes the
//! client would fetch data for on first paint are computed here; any other
//! path gets a `spa` snapshot and the client bootstraps from scratch.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, Uri, header::HOST},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use storehost_core::host::{NOT_FOUND_REDIRECT_DELAY, normalize_host};
use storehost_core::{
    AuthBootstrapState, HydrationSnapshot, QueryKey, RequestScope, Route, RouteKind, SeoMeta,
    SnapshotBuilder, TenantId, TenantIdentity,
};
use storehost_platform::{CatalogApi, PlatformError, SessionApi};
use tracing::{info, instrument, warn};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::session_token;
use crate::state::AppState;

const FORWARDED_HOST: &str = "x-forwarded-host";
const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Page shell with the embedded snapshot.
#[derive(Template, WebTemplate)]
#[template(path = "shell.html")]
pub struct ShellTemplate {
    pub seo: SeoMeta,
    pub snapshot_tag: String,
}

/// Store-not-found page with a timed redirect to the landing domain.
#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub hostname: String,
    pub target: String,
    pub delay_seconds: u64,
}

/// Render the shell for any GET path.
///
/// The tenant lookup receives the normalized hostname (lower-cased, port
/// and trailing dot removed) rather than the raw `Host` header value.
#[instrument(skip(state, headers, uri), fields(path = %uri.path(), host = tracing::field::Empty))]
pub async fn render(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response> {
    let authority = request_authority(&headers, &uri);
    let hostname = normalize_host(&authority);
    tracing::Span::current().record("host", hostname.as_str());

    let landing = state.landing_hosts().is_landing(&hostname);
    let route = Route::classify(uri.path(), landing);
    let token = session_token(&headers);

    if !route.kind().is_server_computed() {
        let auth = AuthBootstrapState {
            has_auth_cookie: token.is_some(),
            ..AuthBootstrapState::loading()
        };
        let snapshot = SnapshotBuilder::new(RouteKind::Spa)
            .auth(auth)
            .seo(SeoMeta {
                title: state.landing_hosts().root_domain().to_string(),
                ..SeoMeta::default()
            })
            .finish();
        return shell(&snapshot);
    }

    let resolution = state.resolver().resolve(&hostname).await;

    if resolution.state.store_not_found {
        let scheme = request_scheme(&headers, state.config().base_url.scheme());
        let target = state.landing_hosts().not_found_redirect(&scheme, &authority);
        info!(reason = resolution.reason.as_str(), target = %target, "Store not found");
        return Ok(not_found_page(hostname, target));
    }

    let auth = match token {
        Some(token) => {
            session_state(&state.platform().with_session(token), &resolution.scope).await
        }
        None => AuthBootstrapState::anonymous(false),
    };

    let mut builder = SnapshotBuilder::new(route.kind());
    let seo = match &resolution.state.tenant {
        Some(tenant) => {
            let canonical_url = format!(
                "{}://{authority}{}",
                request_scheme(&headers, state.config().base_url.scheme()),
                uri.path()
            );
            let mut seo = prefetch(
                state.platform(),
                &route,
                tenant,
                &resolution.scope,
                &mut builder,
            )
            .await?;
            seo.canonical_url = Some(canonical_url);
            seo
        }
        None => SeoMeta {
            title: state.landing_hosts().root_domain().to_string(),
            ..SeoMeta::default()
        },
    };

    let snapshot = builder
        .tenant(resolution.state)
        .auth(auth)
        .seo(seo)
        .finish();
    shell(&snapshot)
}

fn shell(snapshot: &HydrationSnapshot) -> Result<Response> {
    let template = ShellTemplate {
        seo: snapshot.seo.clone(),
        snapshot_tag: snapshot.to_script_tag()?,
    };
    Ok(template.into_response())
}

/// The fallback page shown when a hostname has no store.
#[must_use]
pub fn not_found_page(hostname: String, target: String) -> Response {
    let template = NotFoundTemplate {
        hostname,
        target,
        delay_seconds: NOT_FOUND_REDIRECT_DELAY.as_secs(),
    };
    (StatusCode::NOT_FOUND, template).into_response()
}

/// Verify a session with the platform.
///
/// Only called when a session cookie was present. Any failure leaves the
/// user out of the snapshot with the cookie hint set, so the client
/// verifies the session itself.
pub async fn session_state<S: SessionApi>(api: &S, scope: &RequestScope) -> AuthBootstrapState {
    match api.current_session(scope).await {
        Ok(Some(session)) => {
            AuthBootstrapState::authenticated(session.user, session.billing_required)
        }
        Ok(None) => AuthBootstrapState::anonymous(true),
        Err(e) => {
            warn!(error = %e, "Session probe failed, deferring to client");
            AuthBootstrapState::anonymous(true)
        }
    }
}

/// Fetch the queries a route renders on first paint into the snapshot.
///
/// Returns the page's SEO metadata. Catalog failures leave the entry out of
/// the snapshot so the client fetches it; a missing product or category is
/// a 404.
///
/// # Errors
///
/// Returns an error when the routed product or category does not exist,
/// or a fetched value cannot be serialized.
pub async fn prefetch<C: CatalogApi>(
    catalog: &C,
    route: &Route,
    tenant: &TenantIdentity,
    scope: &RequestScope,
    builder: &mut SnapshotBuilder,
) -> Result<SeoMeta> {
    let id = &tenant.id;
    let mut seo = SeoMeta {
        title: tenant.name.clone(),
        description: None,
        canonical_url: None,
        image: tenant.logo.clone(),
        favicon: tenant.favicon.clone(),
    };

    match route {
        Route::Landing | Route::Spa => {}
        Route::Home => {
            record(builder, &products_key(id), catalog.products(scope).await)?;
            record(builder, &categories_key(id), catalog.categories(scope).await)?;
        }
        Route::Products => {
            record(builder, &products_key(id), catalog.products(scope).await)?;
            seo.title = format!("Products | {}", tenant.name);
        }
        Route::Product(product_id) => {
            let key = QueryKey::Product {
                tenant: id.clone(),
                id: product_id.clone(),
            };
            let product = found(catalog.product(scope, product_id).await, "product", product_id.as_str())?;
            if let Some(product) = record(builder, &key, product)? {
                seo.title = format!("{} | {}", product.name, tenant.name);
                if let Some(image) = product.primary_image() {
                    seo.image = Some(image.to_string());
                }
                seo.description = Some(
                    product
                        .description
                        .unwrap_or_else(|| format!("{}, {}", product.name, product.price)),
                );
            }
        }
        Route::Category(slug) => {
            let key = QueryKey::Category {
                tenant: id.clone(),
                slug: slug.clone(),
            };
            let category = found(catalog.category(scope, slug).await, "category", slug)?;
            if let Some(category) = record(builder, &key, category)? {
                seo.title = format!("{} | {}", category.name, tenant.name);
                seo.description = category.description;
            }
            let products_key = QueryKey::CategoryProducts {
                tenant: id.clone(),
                slug: slug.clone(),
            };
            record(builder, &products_key, catalog.category_products(scope, slug).await)?;
        }
    }

    add_breadcrumb(
        "render",
        "Prefetched route queries",
        &[("route", route.kind().as_str()), ("tenant_id", id.as_str())],
    );
    Ok(seo)
}

/// Turn a platform 404 for the routed resource into a page 404.
fn found<T>(
    result: std::result::Result<T, PlatformError>,
    kind: &str,
    name: &str,
) -> Result<std::result::Result<T, PlatformError>> {
    match result {
        Err(PlatformError::NotFound(_)) => Err(AppError::NotFound(format!("{kind} {name}"))),
        other => Ok(other),
    }
}

/// Store a fetched value under its key; failures are logged and skipped.
fn record<T: Serialize>(
    builder: &mut SnapshotBuilder,
    key: &QueryKey,
    result: std::result::Result<T, PlatformError>,
) -> Result<Option<T>> {
    match result {
        Ok(value) => {
            builder.prefetched(key, &value)?;
            Ok(Some(value))
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Prefetch failed, client will fetch");
            Ok(None)
        }
    }
}

fn products_key(tenant: &TenantId) -> QueryKey {
    QueryKey::Products {
        tenant: tenant.clone(),
    }
}

fn categories_key(tenant: &TenantId) -> QueryKey {
    QueryKey::Categories {
        tenant: tenant.clone(),
    }
}

/// The authority the visitor used: a proxy's forwarded host, the `Host`
/// header, or the request URI.
fn request_authority(headers: &HeaderMap, uri: &Uri) -> String {
    headers
        .get(FORWARDED_HOST)
        .or_else(|| headers.get(HOST))
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| uri.authority().map(|a| a.as_str().to_string()))
        .unwrap_or_default()
}

/// The scheme the visitor used, falling back to the configured one.
fn request_scheme(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(FORWARDED_PROTO)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| value == "http" || value == "https")
        .unwrap_or_else(|| fallback.to_string())
}
