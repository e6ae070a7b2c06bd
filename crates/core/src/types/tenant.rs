//! Tenant identity and resolution state.
//!
//! A tenant is one customer business served from a shared code base. The
//! identity is derived from the platform's lookup payload; the resolution
//! state is what the stores and the server-rendered snapshot carry.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::id::TenantId;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // Static pattern
    Regex::new(r"\s+").unwrap()
});

static NON_SLUG_CHAR: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // Static pattern
    Regex::new(r"[^a-z0-9-]").unwrap()
});

static HYPHEN_RUN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // Static pattern
    Regex::new(r"-{2,}").unwrap()
});

/// Derive a URL slug from a business name.
///
/// Lower-cases, replaces whitespace runs with a single hyphen, strips any
/// character outside `[a-z0-9-]`, then collapses and trims hyphens.
///
/// ```rust
/// # use storehost_core::slugify;
/// assert_eq!(slugify("la  tienda feliz"), "la-tienda-feliz");
/// assert_eq!(slugify("Café & Co."), "caf-co");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let hyphenated = WHITESPACE_RUN.replace_all(&lower, "-");
    let stripped = NON_SLUG_CHAR.replace_all(&hyphenated, "");
    let collapsed = HYPHEN_RUN.replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_string()
}

/// Capitalize every whitespace-separated word, joined by single spaces.
///
/// Only the first character of each word changes; the rest is kept as-is.
#[must_use]
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Social network links keyed by network name (e.g. `instagram`).
pub type SocialLinks = BTreeMap<String, String>;

/// A resolved tenant.
///
/// Immutable for the lifetime of a navigation session; a hostname change
/// produces a new identity rather than mutating this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantIdentity {
    pub id: TenantId,
    /// Display name, title-cased.
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_links: Option<SocialLinks>,
}

impl TenantIdentity {
    /// Build an identity from a raw business name, normalizing slug and display name.
    #[must_use]
    pub fn from_business_name(id: TenantId, business_name: &str) -> Self {
        Self {
            id,
            name: title_case(business_name),
            slug: slugify(business_name),
            logo: None,
            banner: None,
            favicon: None,
            social_links: None,
        }
    }
}

/// The steady-state condition of a tenant resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantCondition {
    Loading,
    Landing,
    NotFound,
    Resolved,
}

/// Observable tenant resolution state.
///
/// Exactly one of `{tenant present, is_landing_domain, store_not_found,
/// loading}` holds; see [`TenantResolutionState::condition`]. `error` is
/// advisory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantResolutionState {
    pub tenant: Option<TenantIdentity>,
    pub loading: bool,
    pub error: Option<String>,
    pub is_landing_domain: bool,
    pub store_not_found: bool,
}

impl Default for TenantResolutionState {
    fn default() -> Self {
        Self::loading()
    }
}

impl TenantResolutionState {
    /// Initial state before resolution has run.
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            tenant: None,
            loading: true,
            error: None,
            is_landing_domain: false,
            store_not_found: false,
        }
    }

    /// The hostname is one of the platform's own landing hosts.
    #[must_use]
    pub const fn landing() -> Self {
        Self {
            tenant: None,
            loading: false,
            error: None,
            is_landing_domain: true,
            store_not_found: false,
        }
    }

    /// A tenant was found for the hostname.
    #[must_use]
    pub const fn resolved(tenant: TenantIdentity) -> Self {
        Self {
            tenant: Some(tenant),
            loading: false,
            error: None,
            is_landing_domain: false,
            store_not_found: false,
        }
    }

    /// No tenant could be established for the hostname.
    #[must_use]
    pub const fn not_found(error: Option<String>) -> Self {
        Self {
            tenant: None,
            loading: false,
            error,
            is_landing_domain: false,
            store_not_found: true,
        }
    }

    /// The active condition, checked in precedence order.
    #[must_use]
    pub const fn condition(&self) -> TenantCondition {
        if self.store_not_found {
            TenantCondition::NotFound
        } else if self.is_landing_domain {
            TenantCondition::Landing
        } else if self.tenant.is_some() {
            TenantCondition::Resolved
        } else {
            TenantCondition::Loading
        }
    }

    /// The resolved tenant id, if any.
    #[must_use]
    pub fn tenant_id(&self) -> Option<&TenantId> {
        self.tenant.as_ref().map(|t| &t.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_collapses_whitespace() {
        assert_eq!(slugify("la  tienda feliz"), "la-tienda-feliz");
        assert_eq!(slugify("  Mi   Tienda  "), "mi-tienda");
    }

    #[test]
    fn test_slugify_strips_non_alphanumeric() {
        assert_eq!(slugify("Joe's Shop!"), "joes-shop");
        assert_eq!(slugify("A - B"), "a-b");
        assert_eq!(slugify("100% Pure"), "100-pure");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("la  tienda feliz"), "La Tienda Feliz");
        assert_eq!(title_case("ñandú store"), "Ñandú Store");
        assert_eq!(title_case("iPhone repairs"), "IPhone Repairs");
    }

    #[test]
    fn test_from_business_name() {
        let tenant = TenantIdentity::from_business_name(TenantId::new("t1"), "la  tienda feliz");
        assert_eq!(tenant.slug, "la-tienda-feliz");
        assert_eq!(tenant.name, "La Tienda Feliz");
    }

    #[test]
    fn test_condition_is_exclusive() {
        assert_eq!(
            TenantResolutionState::loading().condition(),
            TenantCondition::Loading
        );
        assert_eq!(
            TenantResolutionState::landing().condition(),
            TenantCondition::Landing
        );
        assert_eq!(
            TenantResolutionState::not_found(Some("timeout".into())).condition(),
            TenantCondition::NotFound
        );
        let tenant = TenantIdentity::from_business_name(TenantId::new("t1"), "shop");
        let state = TenantResolutionState::resolved(tenant);
        assert_eq!(state.condition(), TenantCondition::Resolved);
        assert_eq!(state.tenant_id().map(TenantId::as_str), Some("t1"));
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let json = serde_json::to_value(TenantResolutionState::landing()).unwrap_or_default();
        assert_eq!(json["isLandingDomain"], true);
        assert_eq!(json["storeNotFound"], false);
    }
}
