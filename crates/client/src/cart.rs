//! Cart reconciler.
//!
//! The remote cart is authoritative. The local copy is only a read cache:
//! every mutation is sent as a signed delta against the last known remote
//! quantity, followed by a refresh.

use storehost_core::{Cart, CartDelta, CheckoutResult, ProductId, RequestScope};
use storehost_platform::{CartApi, PaymentProof};
use tracing::{debug, info, instrument, warn};

use crate::error::CartError;

/// Local view of the remote cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    /// `None` until loaded, after a failed refresh, or after checkout.
    pub cart: Option<Cart>,
    pub loading: bool,
}

/// Keeps a local cart consistent with the platform's.
pub struct CartReconciler<C> {
    api: C,
    scope: RequestScope,
    state: CartState,
}

impl<C: CartApi> CartReconciler<C> {
    /// A reconciler for the tenant in `scope`. Nothing is loaded yet.
    #[must_use]
    pub fn new(api: C, scope: RequestScope) -> Self {
        Self {
            api,
            scope,
            state: CartState::default(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &CartState {
        &self.state
    }

    #[must_use]
    pub const fn cart(&self) -> Option<&Cart> {
        self.state.cart.as_ref()
    }

    #[must_use]
    pub const fn scope(&self) -> &RequestScope {
        &self.scope
    }

    /// Last known quantity of a product.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.state
            .cart
            .as_ref()
            .map_or(0, |cart| cart.quantity_of(product_id))
    }

    /// Replace the local cache with the server cart.
    ///
    /// Failures leave the cart empty rather than surfacing an error.
    #[instrument(skip(self), fields(tenant_id = ?self.scope.tenant()))]
    pub async fn refresh(&mut self) -> Option<&Cart> {
        self.state.loading = true;
        self.state.cart = match self.api.fetch_cart(&self.scope).await {
            Ok(cart) => {
                debug!(lines = cart.items().len(), "Cart refreshed");
                Some(cart)
            }
            Err(e) => {
                warn!(error = %e, "Cart refresh failed, clearing local cart");
                None
            }
        };
        self.state.loading = false;
        self.state.cart.as_ref()
    }

    /// Add `quantity` units of a product.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for zero, or the platform error
    /// if the mutation fails.
    pub async fn add(&mut self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        self.send(CartDelta {
            product_id,
            delta: i64::from(quantity),
        })
        .await
    }

    /// Move a product's quantity to `quantity`. No call is made when it
    /// already matches.
    ///
    /// # Errors
    ///
    /// Returns the platform error if the mutation fails.
    pub async fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        let current = self.quantity_of(&product_id);
        match CartDelta::between(product_id, current, quantity) {
            Some(delta) => self.send(delta).await,
            None => Ok(()),
        }
    }

    /// Remove a product entirely.
    ///
    /// # Errors
    ///
    /// Returns the platform error if the mutation fails.
    pub async fn remove(&mut self, product_id: ProductId) -> Result<(), CartError> {
        self.set_quantity(product_id, 0).await
    }

    /// Submit the cart with a proof of payment.
    ///
    /// A successful checkout always clears the local cart, whatever cart the
    /// platform echoes back.
    ///
    /// # Errors
    ///
    /// Returns the platform error; the local cart is left untouched.
    #[instrument(skip(self, proof), fields(tenant_id = ?self.scope.tenant()))]
    pub async fn checkout(&mut self, proof: PaymentProof) -> Result<CheckoutResult, CartError> {
        let result = self.api.checkout(&self.scope, proof).await?;
        info!(order_id = ?result.order_id, status = ?result.status, "Checkout submitted");
        self.state.cart = None;
        Ok(result)
    }

    #[instrument(skip(self), fields(tenant_id = ?self.scope.tenant()))]
    async fn send(&mut self, delta: CartDelta) -> Result<(), CartError> {
        self.api.apply_delta(&self.scope, &delta).await?;
        self.refresh().await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storehost_core::TenantId;

    use super::*;
    use crate::fakes::FakeCart;

    fn reconciler(api: FakeCart) -> CartReconciler<FakeCart> {
        CartReconciler::new(api, RequestScope::for_tenant(TenantId::new("t-1")))
    }

    fn proof() -> PaymentProof {
        PaymentProof {
            file_name: "receipt.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xff, 0xd8],
        }
    }

    #[tokio::test]
    async fn test_repeated_set_quantity_sends_one_delta() {
        let api = FakeCart::default();
        let mut cart = reconciler(api.clone());
        let p = ProductId::new("p1");

        cart.set_quantity(p.clone(), 3).await.unwrap();
        cart.set_quantity(p.clone(), 3).await.unwrap();

        assert_eq!(api.sent_deltas(), vec![3]);
        assert_eq!(cart.quantity_of(&p), 3);
    }

    #[tokio::test]
    async fn test_add_then_remove_sends_opposite_deltas() {
        let api = FakeCart::default();
        let mut cart = reconciler(api.clone());
        let p = ProductId::new("p1");

        cart.add(p.clone(), 2).await.unwrap();
        cart.remove(p.clone()).await.unwrap();

        assert_eq!(api.sent_deltas(), vec![2, -2]);
        assert_eq!(cart.quantity_of(&p), 0);
        assert!(cart.cart().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_quantity_is_relative_to_remote() {
        let api = FakeCart::default();
        api.remote.lock().unwrap().insert(ProductId::new("p1"), 5);
        let mut cart = reconciler(api.clone());
        cart.refresh().await;

        cart.set_quantity(ProductId::new("p1"), 2).await.unwrap();

        assert_eq!(api.sent_deltas(), vec![-3]);
        assert_eq!(cart.quantity_of(&ProductId::new("p1")), 2);
    }

    #[tokio::test]
    async fn test_remove_absent_product_makes_no_call() {
        let api = FakeCart::default();
        let mut cart = reconciler(api.clone());

        cart.remove(ProductId::new("p9")).await.unwrap();

        assert!(api.sent_deltas().is_empty());
        assert_eq!(api.fetches(), 0);
    }

    #[tokio::test]
    async fn test_add_zero_is_rejected() {
        let api = FakeCart::default();
        let mut cart = reconciler(api.clone());

        let err = cart.add(ProductId::new("p1"), 0).await.unwrap_err();

        assert!(matches!(err, CartError::InvalidQuantity(0)));
        assert!(api.sent_deltas().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_clears_local_cart() {
        let api = FakeCart::default();
        let mut cart = reconciler(api.clone());
        cart.add(ProductId::new("p1"), 1).await.unwrap();
        assert!(cart.cart().is_some());

        let result = cart.checkout(proof()).await.unwrap();

        assert_eq!(result.order_id.unwrap().as_str(), "o-1");
        // The echoed cart still has the line; the local cart is gone anyway.
        assert!(result.cart.is_some());
        assert!(cart.cart().is_none());
    }

    #[tokio::test]
    async fn test_failed_checkout_keeps_cart() {
        let api = FakeCart::default();
        api.remote.lock().unwrap().insert(ProductId::new("p1"), 1);
        let mut cart = reconciler(FakeCart {
            fail_mutations: true,
            ..api.clone()
        });
        cart.refresh().await;

        let err = cart.checkout(proof()).await.unwrap_err();

        assert!(matches!(err, CartError::Platform(_)));
        assert_eq!(cart.quantity_of(&ProductId::new("p1")), 1);
    }

    #[tokio::test]
    async fn test_mutation_errors_propagate() {
        let api = FakeCart {
            fail_mutations: true,
            ..FakeCart::default()
        };
        let mut cart = reconciler(api.clone());

        let err = cart.add(ProductId::new("p1"), 1).await.unwrap_err();

        assert!(matches!(err, CartError::Platform(_)));
        assert_eq!(api.fetches(), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_empties_cart() {
        let api = FakeCart {
            fail_fetch: true,
            ..FakeCart::default()
        };
        let mut cart = reconciler(api);

        assert!(cart.refresh().await.is_none());
        assert!(!cart.state().loading);
    }

    #[tokio::test]
    async fn test_every_call_carries_scope() {
        let api = FakeCart::default();
        let mut cart = reconciler(api.clone());

        cart.add(ProductId::new("p1"), 1).await.unwrap();
        cart.checkout(proof()).await.unwrap();

        let scopes = api.scopes.lock().unwrap();
        assert_eq!(scopes.len(), 3);
        assert!(
            scopes
                .iter()
                .all(|s| s.tenant() == Some(&TenantId::new("t-1")))
        );
    }
}
