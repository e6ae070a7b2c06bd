//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health               - Liveness check
//! GET    /health/ready         - Readiness check (pings the platform API)
//!
//! # Session
//! POST   /session              - Store a session token in the cookie
//! DELETE /session              - Clear the session cookie
//!
//! # Pages (HTML shell + hydration snapshot)
//! GET    /                     - Landing page or tenant home
//! GET    /products             - Product listing
//! GET    /products/{id}        - Product detail
//! GET    /category/{slug}      - Category page
//! GET    (fallback)            - Any other path, `spa` snapshot
//! ```

pub mod health;
pub mod pages;
pub mod session;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/session", post(session::create).delete(session::destroy))
        .route("/", get(pages::render))
        .fallback(get(pages::render))
}
