//! In-memory collaborators for unit tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use storehost_core::{Cart, CartDelta, CartItem, CheckoutResult, ProductId, RequestScope};
use storehost_platform::{
    AuthSession, CartApi, PaymentProof, PlatformError, SessionApi, TenantLookup, TenantPayload,
};

type Hook = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone, Default)]
pub struct FakeLookup {
    pub payload: Option<TenantPayload>,
    pub fail: bool,
    pub calls: Arc<AtomicUsize>,
    pub on_call: Option<Hook>,
}

impl FakeLookup {
    pub fn tenant(id: &str, name: &str) -> Self {
        Self {
            payload: Some(TenantPayload {
                tenant_id: Some(id.to_string()),
                business_name: Some(name.to_string()),
                ..TenantPayload::default()
            }),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TenantLookup for FakeLookup {
    async fn lookup_tenant(&self, _hostname: &str) -> Result<Option<TenantPayload>, PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = &self.on_call {
            hook();
        }
        if self.fail {
            return Err(PlatformError::RateLimited(1));
        }
        Ok(self.payload.clone())
    }
}

#[derive(Clone, Default)]
pub struct FakeSession {
    pub session: Option<AuthSession>,
    pub scopes: Arc<Mutex<Vec<RequestScope>>>,
    pub on_call: Option<Hook>,
}

impl FakeSession {
    pub fn calls(&self) -> usize {
        self.scopes.lock().map_or(0, |s| s.len())
    }
}

impl SessionApi for FakeSession {
    async fn current_session(
        &self,
        scope: &RequestScope,
    ) -> Result<Option<AuthSession>, PlatformError> {
        if let Ok(mut scopes) = self.scopes.lock() {
            scopes.push(scope.clone());
        }
        if let Some(hook) = &self.on_call {
            hook();
        }
        Ok(self.session.clone())
    }
}

/// A remote cart that applies deltas the way the platform does.
#[derive(Clone, Default)]
pub struct FakeCart {
    pub remote: Arc<Mutex<BTreeMap<ProductId, i64>>>,
    pub deltas: Arc<Mutex<Vec<CartDelta>>>,
    pub scopes: Arc<Mutex<Vec<RequestScope>>>,
    pub fetches: Arc<AtomicUsize>,
    pub checkouts: Arc<AtomicUsize>,
    pub fail_fetch: bool,
    pub fail_mutations: bool,
}

impl FakeCart {
    pub fn sent_deltas(&self) -> Vec<i64> {
        self.deltas
            .lock()
            .map(|d| d.iter().map(|delta| delta.delta).collect())
            .unwrap_or_default()
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> Cart {
        let remote = self.remote.lock().map(|r| r.clone()).unwrap_or_default();
        Cart::new(remote.into_iter().filter(|(_, q)| *q > 0).map(|(product_id, q)| CartItem {
            product_id,
            quantity: u32::try_from(q).unwrap_or(u32::MAX),
        }))
    }

    fn note_scope(&self, scope: &RequestScope) {
        if let Ok(mut scopes) = self.scopes.lock() {
            scopes.push(scope.clone());
        }
    }
}

impl CartApi for FakeCart {
    async fn fetch_cart(&self, scope: &RequestScope) -> Result<Cart, PlatformError> {
        self.note_scope(scope);
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch {
            return Err(PlatformError::RateLimited(1));
        }
        Ok(self.snapshot())
    }

    async fn apply_delta(&self, scope: &RequestScope, delta: &CartDelta) -> Result<(), PlatformError> {
        self.note_scope(scope);
        if self.fail_mutations {
            return Err(PlatformError::Unauthorized);
        }
        if let Ok(mut deltas) = self.deltas.lock() {
            deltas.push(delta.clone());
        }
        if let Ok(mut remote) = self.remote.lock() {
            *remote.entry(delta.product_id.clone()).or_insert(0) += delta.delta;
        }
        Ok(())
    }

    async fn checkout(
        &self,
        scope: &RequestScope,
        _proof: PaymentProof,
    ) -> Result<CheckoutResult, PlatformError> {
        self.note_scope(scope);
        self.checkouts.fetch_add(1, Ordering::SeqCst);
        if self.fail_mutations {
            return Err(PlatformError::Unauthorized);
        }
        Ok(CheckoutResult {
            order_id: Some(storehost_core::OrderId::new("o-1")),
            status: Some("pending_review".to_string()),
            cart: Some(self.snapshot()),
        })
    }
}
