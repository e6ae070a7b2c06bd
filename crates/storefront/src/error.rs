//! Request errors for the storefront.
//!
//! Handlers return [`Result`]; server-side failures are reported to Sentry
//! before the response is written. Clients only ever see a short public
//! message, never the underlying cause.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storehost_core::HydrationError;
use storehost_platform::PlatformError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// The hydration snapshot could not be serialized.
    #[error("Hydration error: {0}")]
    Hydration(#[from] HydrationError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// The routed product or category does not exist for this tenant.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::Platform(PlatformError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Platform(PlatformError::Unauthorized) => StatusCode::UNAUTHORIZED,
            Self::Platform(PlatformError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
            Self::Platform(
                PlatformError::Http(_)
                | PlatformError::Status { .. }
                | PlatformError::Parse(_),
            ) => StatusCode::BAD_GATEWAY,
            Self::Platform(PlatformError::MissingScope(_) | PlatformError::Config(_))
            | Self::Hydration(_)
            | Self::Template(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// What the visitor is told. Client errors echo their detail; everything
    /// else gets a fixed phrase.
    fn public_message(&self) -> String {
        match self {
            Self::NotFound(_) | Self::BadRequest(_) => self.to_string(),
            Self::Platform(
                PlatformError::Http(_)
                | PlatformError::Status { .. }
                | PlatformError::Parse(_),
            ) => "Upstream service error".to_string(),
            _ => self
                .status()
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Request failed");
        } else {
            tracing::debug!(error = %self, %status, "Request rejected");
        }

        (status, self.public_message()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Record a render step so a later Sentry report shows what led up to it.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        data: data
            .iter()
            .map(|(k, v)| ((*k).to_string(), serde_json::Value::from(*v)))
            .collect(),
        ..Default::default()
    });
}
