//! Snapshot inspection command.
//!
//! Fetches a server-rendered page and prints the hydration snapshot it
//! embeds, the same payload the client bootstrap would consume.
//!
//! # Usage
//!
//! ```bash
//! storehost snapshot https://tienda.shopmesh.io/products
//! storehost snapshot https://tienda.shopmesh.io/ --session "$TOKEN"
//! ```

use reqwest::header::COOKIE;
use storehost_core::HydrationSnapshot;

use super::CommandError;

/// Cookie the storefront reads the session token from.
const SESSION_COOKIE_NAME: &str = "storehost_session";

/// Fetch `url` and render its snapshot as pretty JSON.
///
/// # Errors
///
/// Returns an error if the page cannot be fetched or carries no decodable
/// snapshot.
pub async fn run(url: &str, session: Option<&str>) -> Result<String, CommandError> {
    let mut request = reqwest::Client::new().get(url);
    if let Some(token) = session {
        request = request.header(COOKIE, format!("{SESSION_COOKIE_NAME}={token}"));
    }

    let response = request.send().await?;
    let status = response.status();
    tracing::info!("GET {url} -> {status}");
    let html = response.text().await?;

    let snapshot = decode(&html)?;
    Ok(serde_json::to_string_pretty(&snapshot)?)
}

fn decode(html: &str) -> Result<HydrationSnapshot, CommandError> {
    HydrationSnapshot::from_html(html)
        .ok_or_else(|| CommandError::Snapshot("page has no snapshot element".to_string()))?
        .map_err(|e| CommandError::Snapshot(e.to_string()))
}
