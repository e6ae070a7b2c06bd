//! Session cookie endpoints.
//!
//! The token is minted by the platform's auth scheme; these handlers only
//! move it into (or out of) the storefront's cookie so server renders can
//! see it.

use axum::{
    Json,
    extract::State,
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::cookie::Cookie;
use tracing::{info, instrument};

use crate::error::{AppError, Result};
use crate::middleware::{clear_session_cookie, session_cookie};
use crate::state::AppState;

/// Longest token accepted into the cookie.
const MAX_TOKEN_LEN: usize = 4096;

/// Body of `POST /session`.
#[derive(Deserialize)]
pub struct SessionRequest {
    pub token: String,
}

impl std::fmt::Debug for SessionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRequest")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Store a session token in the cookie.
#[instrument(skip(state, request))]
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> Result<Response> {
    let token = request.token.trim();
    if token.is_empty() || token.len() > MAX_TOKEN_LEN {
        return Err(AppError::BadRequest("invalid session token".to_string()));
    }
    if !token.chars().all(|c| c.is_ascii_graphic() && c != ';' && c != ',') {
        return Err(AppError::BadRequest("invalid session token".to_string()));
    }

    info!("Session cookie set");
    with_cookie(&session_cookie(token, state.config().is_production()))
}

/// Remove the session cookie.
#[instrument(skip(state))]
pub async fn destroy(State(state): State<AppState>) -> Result<Response> {
    info!("Session cookie cleared");
    with_cookie(&clear_session_cookie(state.config().is_production()))
}

fn with_cookie(cookie: &Cookie<'_>) -> Result<Response> {
    let value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| AppError::Internal(format!("cookie header: {e}")))?;
    Ok((StatusCode::NO_CONTENT, [(SET_COOKIE, value)]).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_with_cookie_sets_header() {
        let response = with_cookie(&session_cookie("abc", false)).unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let header = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(header.starts_with("storehost_session=abc"));
    }

    #[test]
    fn test_session_request_debug_redacts_token() {
        let request = SessionRequest {
            token: "very-private".to_string(),
        };
        assert!(!format!("{request:?}").contains("very-private"));
    }
}
