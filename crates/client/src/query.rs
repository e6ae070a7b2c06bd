//! Client query cache.
//!
//! Holds query results under [`QueryKey::cache_key`], the same key the
//! server used when it pre-fetched them. Entries live for the freshness
//! window, so a hydrated entry satisfies an identical fetch made soon after
//! bootstrap without a network call.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use storehost_core::{QueryKey, TenantId};
use storehost_platform::PlatformError;
use tracing::{debug, warn};

/// Default freshness window for cached queries.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);

/// Cached query results, tenant-qualified by key.
#[derive(Clone)]
pub struct QueryClient {
    cache: Cache<String, serde_json::Value>,
    stale_time: Duration,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("entries", &self.cache.entry_count())
            .field("stale_time", &self.stale_time)
            .finish()
    }
}

impl QueryClient {
    #[must_use]
    pub fn new(stale_time: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(500)
            .time_to_live(stale_time)
            .support_invalidation_closures()
            .build();
        Self { cache, stale_time }
    }

    #[must_use]
    pub const fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// Seed the cache from a snapshot's query map.
    ///
    /// Only entries keyed for `tenant` are accepted. Returns how many were
    /// inserted.
    pub async fn hydrate(
        &self,
        tenant: &TenantId,
        queries: BTreeMap<String, serde_json::Value>,
    ) -> usize {
        let mut inserted = 0;
        for (key, value) in queries {
            if QueryKey::is_key_of(&key, tenant) {
                self.cache.insert(key, value).await;
                inserted += 1;
            } else {
                warn!(key = %key, tenant_id = %tenant, "Dropping snapshot query for another tenant");
            }
        }
        debug!(tenant_id = %tenant, inserted, "Query cache hydrated");
        inserted
    }

    /// A fresh cached value, if one decodes as `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let value = self.cache.get(&key.cache_key()).await?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(key = %key, error = %e, "Cached query has unexpected shape");
                None
            }
        }
    }

    /// Return the cached value for `key`, or run `fetch` and cache its result.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; failures are not cached.
    pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, fetch: F) -> Result<T, PlatformError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, PlatformError>>,
    {
        if let Some(cached) = self.get(key).await {
            debug!(key = %key, "Query cache hit");
            return Ok(cached);
        }

        let value = fetch().await?;
        match serde_json::to_value(&value) {
            Ok(json) => self.cache.insert(key.cache_key(), json).await,
            Err(e) => warn!(key = %key, error = %e, "Query result not cacheable"),
        }
        Ok(value)
    }

    /// Drop every entry for one tenant.
    pub fn invalidate_tenant(&self, tenant: &TenantId) {
        let prefix = QueryKey::tenant_prefix(tenant);
        if let Err(e) = self
            .cache
            .invalidate_entries_if(move |key, _| key.starts_with(&prefix))
        {
            warn!(error = %e, "Tenant invalidation unavailable");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn products_key(tenant: &str) -> QueryKey {
        QueryKey::Products {
            tenant: TenantId::new(tenant),
        }
    }

    #[tokio::test]
    async fn test_hydrated_entry_satisfies_fetch() {
        let client = QueryClient::default();
        let tenant = TenantId::new("t1");
        let mut queries = BTreeMap::new();
        queries.insert(
            products_key("t1").cache_key(),
            serde_json::json!(["hydrated"]),
        );
        assert_eq!(client.hydrate(&tenant, queries).await, 1);

        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let value: Vec<String> = client
            .fetch(&products_key("t1"), move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(vec!["network".to_string()])
            })
            .await
            .unwrap();

        assert_eq!(value, vec!["hydrated".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_hydrate_drops_other_tenants() {
        let client = QueryClient::default();
        let mut queries = BTreeMap::new();
        queries.insert(products_key("t1").cache_key(), serde_json::json!([]));
        queries.insert(products_key("t2").cache_key(), serde_json::json!([]));

        assert_eq!(client.hydrate(&TenantId::new("t1"), queries).await, 1);
        assert!(client.get::<Vec<String>>(&products_key("t2")).await.is_none());
    }

    #[tokio::test]
    async fn test_hydrate_rejects_nested_tenant_ids() {
        let client = QueryClient::default();
        let mut queries = BTreeMap::new();
        queries.insert(products_key("a:b").cache_key(), serde_json::json!(["other"]));
        queries.insert("tenant:a:b:products".to_string(), serde_json::json!(["forged"]));

        assert_eq!(client.hydrate(&TenantId::new("a"), queries).await, 0);
        assert!(client.get::<Vec<String>>(&products_key("a")).await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_caches_success_only() {
        let client = QueryClient::default();
        let key = products_key("t1");

        let err = client
            .fetch::<Vec<String>, _, _>(&key, || async { Err(PlatformError::Unauthorized) })
            .await;
        assert!(err.is_err());
        assert!(client.get::<Vec<String>>(&key).await.is_none());

        let fetched: Vec<String> = client
            .fetch(&key, || async { Ok(vec!["a".to_string()]) })
            .await
            .unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(client.get::<Vec<String>>(&key).await.unwrap(), fetched);
    }

    #[tokio::test]
    async fn test_invalidate_tenant() {
        let client = QueryClient::default();
        let mut queries = BTreeMap::new();
        queries.insert(products_key("t1").cache_key(), serde_json::json!(["x"]));
        client.hydrate(&TenantId::new("t1"), queries).await;

        client.invalidate_tenant(&TenantId::new("t1"));
        assert!(client.get::<Vec<String>>(&products_key("t1")).await.is_none());
    }
}
