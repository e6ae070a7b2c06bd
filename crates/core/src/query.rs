//! Query keys shared by the server snapshot and the client query cache.
//!
//! The server stores pre-fetched results under [`QueryKey::cache_key`] and
//! the client looks them up with the same function, so a hydrated entry is
//! recognized as satisfying an identical client fetch.

use std::fmt;

use urlencoding::encode;

use crate::types::{ProductId, TenantId};

/// A cacheable data-fetch, always qualified by its tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Products { tenant: TenantId },
    Product { tenant: TenantId, id: ProductId },
    Categories { tenant: TenantId },
    Category { tenant: TenantId, slug: String },
    CategoryProducts { tenant: TenantId, slug: String },
}

impl QueryKey {
    /// Stable string key used in snapshots and caches.
    ///
    /// Free-form segments are percent-encoded, so a `:` inside a tenant id
    /// or slug can never be read as a separator.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let prefix = Self::tenant_prefix(self.tenant());
        match self {
            Self::Products { .. } => format!("{prefix}products"),
            Self::Product { id, .. } => format!("{prefix}product:{}", encode(id.as_str())),
            Self::Categories { .. } => format!("{prefix}categories"),
            Self::Category { slug, .. } => format!("{prefix}category:{}", encode(slug)),
            Self::CategoryProducts { slug, .. } => {
                format!("{prefix}category:{}:products", encode(slug))
            }
        }
    }

    /// Prefix shared by every cache key of one tenant, and by no key of
    /// any other tenant.
    #[must_use]
    pub fn tenant_prefix(tenant: &TenantId) -> String {
        format!("tenant:{}:", encode(tenant.as_str()))
    }

    /// Whether `key` is a well-formed cache key of `tenant`.
    ///
    /// Past the tenant prefix, every free-form segment is encoded and so
    /// holds no `:`. A key that only shares the prefix is rejected.
    #[must_use]
    pub fn is_key_of(key: &str, tenant: &TenantId) -> bool {
        let Some(rest) = key.strip_prefix(&Self::tenant_prefix(tenant)) else {
            return false;
        };
        let segments: Vec<&str> = rest.split(':').collect();
        match segments.as_slice() {
            ["products" | "categories"] => true,
            ["product" | "category", param] | ["category", param, "products"] => {
                !param.is_empty()
            }
            _ => false,
        }
    }

    #[must_use]
    pub const fn tenant(&self) -> &TenantId {
        match self {
            Self::Products { tenant }
            | Self::Product { tenant, .. }
            | Self::Categories { tenant }
            | Self::Category { tenant, .. }
            | Self::CategoryProducts { tenant, .. } => tenant,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_keys_are_tenant_qualified() {
        let a = QueryKey::Products {
            tenant: TenantId::new("a"),
        };
        let b = QueryKey::Products {
            tenant: TenantId::new("b"),
        };
        assert_ne!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), "tenant:a:products");
        assert!(a.cache_key().starts_with(&QueryKey::tenant_prefix(a.tenant())));
        assert!(!b.cache_key().starts_with(&QueryKey::tenant_prefix(a.tenant())));
    }

    #[test]
    fn test_category_keys_do_not_collide() {
        let tenant = TenantId::new("t");
        let category = QueryKey::Category {
            tenant: tenant.clone(),
            slug: "shoes".to_string(),
        };
        let products = QueryKey::CategoryProducts {
            tenant,
            slug: "shoes".to_string(),
        };
        assert_ne!(category.cache_key(), products.cache_key());
    }

    #[test]
    fn test_tenant_ids_with_separators_stay_distinct() {
        let outer = TenantId::new("a");
        let nested = QueryKey::Products {
            tenant: TenantId::new("a:b"),
        };
        assert_eq!(nested.cache_key(), "tenant:a%3Ab:products");
        assert!(!nested.cache_key().starts_with(&QueryKey::tenant_prefix(&outer)));
    }

    #[test]
    fn test_slug_cannot_forge_another_key() {
        let tenant = TenantId::new("t");
        let forged = QueryKey::Category {
            tenant: tenant.clone(),
            slug: "shoes:products".to_string(),
        };
        let products = QueryKey::CategoryProducts {
            tenant,
            slug: "shoes".to_string(),
        };
        assert_ne!(forged.cache_key(), products.cache_key());
    }

    #[test]
    fn test_is_key_of_checks_the_whole_key() {
        let tenant = TenantId::new("a");
        let own = QueryKey::CategoryProducts {
            tenant: tenant.clone(),
            slug: "x:y".to_string(),
        };
        assert!(QueryKey::is_key_of(&own.cache_key(), &tenant));
        assert!(!QueryKey::is_key_of("tenant:a:b:products", &tenant));
        assert!(!QueryKey::is_key_of("tenant:a:product:", &tenant));
        assert!(!QueryKey::is_key_of("tenant:b:products", &tenant));
    }
}
