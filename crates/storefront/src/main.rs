//! Storehost Storefront - Multi-tenant server-rendering front end.
//!
//! One process serves every tenant. The `Host` header decides which store a
//! request belongs to; the platform API supplies tenants, sessions and the
//! public catalog. Each page carries a hydration snapshot for the client
//! runtime.
//!
//! Session tokens stay in the visitor's cookie. The server forwards them to
//! the platform for verification and never writes them into a page.

#![cfg_attr(not(test), forbid(unsafe_code))]

use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use storehost_storefront::config::StorefrontConfig;
use storehost_storefront::state::AppState;
use tokio::net::TcpListener;
use tracing::{Level, Metadata};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "storehost_storefront=info,storehost_platform=info,tower_http=debug";

#[tokio::main]
async fn main() {
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Sentry must be live before the subscriber so the layer has a client
    let _sentry = config.sentry_dsn.as_deref().map(|dsn| start_sentry(dsn, &config));
    init_tracing();

    tracing::info!(
        root_domain = %config.root_domain,
        environment = ?config.environment,
        platform = %config.platform_api_url,
        "Configuration loaded"
    );

    if let Err(e) = serve(config).await {
        tracing::error!(error = %e, "Storefront stopped");
        std::process::exit(1);
    }
}

fn start_sentry(dsn: &str, config: &StorefrontConfig) -> sentry::ClientInitGuard {
    let options = sentry::ClientOptions {
        release: sentry::release_name!(),
        environment: config.sentry_environment.clone().map(Into::into),
        attach_stacktrace: true,
        ..Default::default()
    };
    sentry::init((dsn, options))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(to_sentry))
        .init();
}

/// Warnings and errors become Sentry events; info and debug ride along as breadcrumbs.
fn to_sentry(metadata: &Metadata<'_>) -> EventFilter {
    match *metadata.level() {
        Level::ERROR | Level::WARN => EventFilter::Event,
        Level::INFO | Level::DEBUG => EventFilter::Breadcrumb,
        Level::TRACE => EventFilter::Ignore,
    }
}

async fn serve(config: StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.socket_addr();
    let state = AppState::new(config)?;

    let app = storehost_storefront::app(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "storefront listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable; Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received, draining connections");
}
