//! Hydration snapshot schema and HTML embedding.
//!
//! A snapshot is produced by a single server-rendering pass and embedded in
//! the page as a JSON script element. The client reads it once at startup
//! and never re-fetches it.
//!
//! ```text
//! <script id="__SSR_BOOTSTRAP__" type="application/json">{"version":1,...}</script>
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::query::QueryKey;
use crate::route::RouteKind;
use crate::types::{AuthBootstrapState, TenantResolutionState};

/// Current snapshot schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// DOM id of the script element carrying the snapshot.
pub const SNAPSHOT_ELEMENT_ID: &str = "__SSR_BOOTSTRAP__";

const SCRIPT_CLOSE: &str = "</script>";

/// Errors decoding an embedded snapshot.
#[derive(Debug, Error)]
pub enum HydrationError {
    #[error("snapshot JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0} (expected {v})", v = SNAPSHOT_VERSION)]
    UnsupportedVersion(u32),
    #[error("snapshot script element is not terminated")]
    Unterminated,
}

/// SEO metadata computed during rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoMeta {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

/// The server-computed bootstrap payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydrationSnapshot {
    pub version: u32,
    pub route: RouteKind,
    pub tenant: TenantResolutionState,
    pub auth: AuthBootstrapState,
    /// Pre-fetched query results keyed by [`QueryKey::cache_key`].
    #[serde(default)]
    pub queries: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub seo: SeoMeta,
    pub generated_at: DateTime<Utc>,
}

impl HydrationSnapshot {
    /// Whether the client may skip its own tenant bootstrap.
    #[must_use]
    pub const fn is_server_computed(&self) -> bool {
        self.route.is_server_computed()
    }

    /// Serialize as an HTML `<script>` element.
    ///
    /// Characters that could terminate the element or confuse an HTML/JS
    /// parser are emitted as JSON unicode escapes.
    ///
    /// # Errors
    ///
    /// Returns an error if a pre-fetched value fails to serialize.
    pub fn to_script_tag(&self) -> Result<String, HydrationError> {
        let json = serde_json::to_string(self)?;
        Ok(format!(
            r#"<script id="{SNAPSHOT_ELEMENT_ID}" type="application/json">{}{SCRIPT_CLOSE}"#,
            escape_json_for_html(&json)
        ))
    }

    /// Decode a snapshot from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or an unsupported version.
    pub fn from_json(json: &str) -> Result<Self, HydrationError> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(HydrationError::UnsupportedVersion(snapshot.version));
        }
        Ok(snapshot)
    }

    /// Find and decode the snapshot embedded in an HTML document.
    ///
    /// Returns `None` when the page carries no snapshot element.
    #[must_use]
    pub fn from_html(html: &str) -> Option<Result<Self, HydrationError>> {
        let marker = format!(r#"id="{SNAPSHOT_ELEMENT_ID}""#);
        let start = html.find(&marker)?;
        let after_marker = html.get(start..)?;
        let open_end = after_marker.find('>')?;
        let body = after_marker.get(open_end + 1..)?;

        Some(
            body.find(SCRIPT_CLOSE)
                .ok_or(HydrationError::Unterminated)
                .and_then(|end| Self::from_json(body.get(..end).unwrap_or_default())),
        )
    }
}

fn escape_json_for_html(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

/// Accumulates one render pass's results into a snapshot.
///
/// `finish` consumes the builder, so a render produces exactly one snapshot.
#[derive(Debug)]
pub struct SnapshotBuilder {
    route: RouteKind,
    tenant: TenantResolutionState,
    auth: AuthBootstrapState,
    queries: BTreeMap<String, serde_json::Value>,
    seo: SeoMeta,
}

impl SnapshotBuilder {
    /// Start a snapshot for a route. Tenant and auth start in their loading states.
    #[must_use]
    pub fn new(route: RouteKind) -> Self {
        Self {
            route,
            tenant: TenantResolutionState::loading(),
            auth: AuthBootstrapState::loading(),
            queries: BTreeMap::new(),
            seo: SeoMeta::default(),
        }
    }

    #[must_use]
    pub fn tenant(mut self, tenant: TenantResolutionState) -> Self {
        self.tenant = tenant;
        self
    }

    #[must_use]
    pub fn auth(mut self, auth: AuthBootstrapState) -> Self {
        self.auth = auth;
        self
    }

    #[must_use]
    pub fn seo(mut self, seo: SeoMeta) -> Self {
        self.seo = seo;
        self
    }

    /// Record a pre-fetched query result.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    pub fn prefetched<T: Serialize>(
        &mut self,
        key: &QueryKey,
        value: &T,
    ) -> Result<(), HydrationError> {
        self.queries
            .insert(key.cache_key(), serde_json::to_value(value)?);
        Ok(())
    }

    #[must_use]
    pub fn finish(self) -> HydrationSnapshot {
        HydrationSnapshot {
            version: SNAPSHOT_VERSION,
            route: self.route,
            tenant: self.tenant,
            auth: self.auth,
            queries: self.queries,
            seo: self.seo,
            generated_at: Utc::now(),
        }
    }
}
