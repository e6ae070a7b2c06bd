//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, outermost)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame and referrer policy)
//!
//! The session cookie is not a layer: handlers read it with
//! [`session::session_token`] and write it with [`session::session_cookie`].

pub mod request_id;
pub mod security_headers;
pub mod session;

pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE_NAME, clear_session_cookie, session_cookie, session_token};
