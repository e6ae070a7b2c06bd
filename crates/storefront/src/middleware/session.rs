//! Session cookie handling.
//!
//! The cookie carries an opaque bearer token minted by the platform's
//! auth scheme. The storefront never inspects it; it only forwards it to
//! the platform when probing the session during a render.

use axum::http::{HeaderMap, header::COOKIE};
use storehost_platform::SessionToken;
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "storehost_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Read the session token from the request's `Cookie` headers.
///
/// An empty cookie value counts as no session.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME && !cookie.value().is_empty())
        .map(|cookie| SessionToken::new(cookie.value()))
}

/// Build the session cookie for a token.
///
/// `secure` should only be set in production, where the storefront is
/// served over HTTPS.
#[must_use]
pub fn session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token.to_string()))
        .max_age(Duration::seconds(SESSION_EXPIRY_SECONDS))
        .secure(secure)
        .same_site(SameSite::Lax)
        .http_only(true)
        .path("/")
        .build()
}

/// Build a cookie that removes the session.
#[must_use]
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .max_age(Duration::ZERO)
        .secure(secure)
        .same_site(SameSite::Lax)
        .http_only(true)
        .path("/")
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok-123", false).to_string();
        assert!(cookie.starts_with("storehost_session=tok-123"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(!cookie.contains("Secure"));

        assert!(session_cookie("tok-123", true).to_string().contains("Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie(false).to_string();
        assert!(cookie.starts_with("storehost_session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_session_token_from_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            COOKIE,
            HeaderValue::from_static("a=1; storehost_session=abc.def; b=2"),
        );

        let token = session_token(&headers).unwrap();
        assert_eq!(token.expose(), "abc.def");
    }

    #[test]
    fn test_empty_or_missing_cookie_is_no_session() {
        let mut headers = HeaderMap::new();
        assert!(session_token(&headers).is_none());

        headers.insert(COOKIE, HeaderValue::from_static("storehost_session="));
        assert!(session_token(&headers).is_none());
    }
}
