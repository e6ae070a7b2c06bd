//! Route classification for server-rendered pages.
//!
//! The classification travels in the hydration snapshot. `spa` marks a
//! page the server did not compute anything for, so the client must
//! bootstrap from scratch.

use serde::{Deserialize, Serialize};

use crate::types::ProductId;

/// Route classification carried in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    Landing,
    Home,
    Products,
    Product,
    Category,
    Spa,
}

impl RouteKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Landing => "landing",
            Self::Home => "home",
            Self::Products => "products",
            Self::Product => "product",
            Self::Category => "category",
            Self::Spa => "spa",
        }
    }

    /// Whether the server rendering pass computed state for this route.
    #[must_use]
    pub const fn is_server_computed(&self) -> bool {
        !matches!(self, Self::Spa)
    }
}

/// A classified request path with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    Home,
    Products,
    Product(ProductId),
    Category(String),
    Spa,
}

impl Route {
    /// Classify a request path.
    ///
    /// On a landing host only `/` is server-rendered. Tenant hosts render
    /// `/`, `/products`, `/products/{id}` and `/category/{slug}`; anything
    /// else falls back to `spa`. Path parameters are percent-decoded; one
    /// that is not valid UTF-8 once decoded also yields `spa`.
    #[must_use]
    pub fn classify(path: &str, landing_host: bool) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if landing_host {
            return if segments.is_empty() {
                Self::Landing
            } else {
                Self::Spa
            };
        }

        match segments.as_slice() {
            [] => Self::Home,
            ["products"] => Self::Products,
            ["products", id] => {
                decode(id).map_or(Self::Spa, |id| Self::Product(ProductId::new(id)))
            }
            ["category", slug] => decode(slug).map_or(Self::Spa, Self::Category),
            _ => Self::Spa,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> RouteKind {
        match self {
            Self::Landing => RouteKind::Landing,
            Self::Home => RouteKind::Home,
            Self::Products => RouteKind::Products,
            Self::Product(_) => RouteKind::Product,
            Self::Category(_) => RouteKind::Category,
            Self::Spa => RouteKind::Spa,
        }
    }
}

/// Percent-decode one path segment.
fn decode(segment: &str) -> Option<String> {
    urlencoding::decode(segment).ok().map(std::borrow::Cow::into_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_tenant_routes() {
        assert_eq!(Route::classify("/", false), Route::Home);
        assert_eq!(Route::classify("/products/", false), Route::Products);
        assert_eq!(
            Route::classify("/products/p-9?ref=home", false),
            Route::Product(ProductId::new("p-9"))
        );
        assert_eq!(
            Route::classify("/category/shoes", false),
            Route::Category("shoes".to_string())
        );
        assert_eq!(Route::classify("/checkout", false), Route::Spa);
        assert_eq!(Route::classify("/products/p-9/reviews", false), Route::Spa);
    }

    #[test]
    fn test_classify_decodes_parameters() {
        assert_eq!(
            Route::classify("/products/caf%C3%A9", false),
            Route::Product(ProductId::new("café"))
        );
        assert_eq!(
            Route::classify("/category/ropa%20nueva", false),
            Route::Category("ropa nueva".to_string())
        );
        assert_eq!(Route::classify("/products/%FF", false), Route::Spa);
    }

    #[test]
    fn test_classify_landing_routes() {
        assert_eq!(Route::classify("/", true), Route::Landing);
        assert_eq!(Route::classify("/pricing", true), Route::Spa);
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&RouteKind::Spa).unwrap_or_default();
        assert_eq!(json, "\"spa\"");
        assert!(!RouteKind::Spa.is_server_computed());
        assert!(RouteKind::Category.is_server_computed());
    }
}
