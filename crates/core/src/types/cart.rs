//! Cart model and delta arithmetic.
//!
//! The platform holds the authoritative quantities. A local [`Cart`] is a
//! read cache, and every change is sent as a signed [`CartDelta`] against
//! the last known remote quantity, never as an absolute value.

use serde::{Deserialize, Serialize};

use super::id::{OrderId, ProductId};

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A cart, ordered and unique by product id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Build a cart, merging duplicate product lines in first-seen order.
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut merged: Vec<CartItem> = Vec::new();
        for item in items {
            match merged.iter_mut().find(|m| m.product_id == item.product_id) {
                Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
                None => merged.push(item),
            }
        }
        Self { items: merged }
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.iter().all(|i| i.quantity == 0)
    }

    /// Last known quantity for a product (zero when absent).
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.items
            .iter()
            .find(|i| &i.product_id == product_id)
            .map_or(0, |i| i.quantity)
    }

    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |acc, i| acc.saturating_add(i.quantity))
    }
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wire {
            #[serde(default)]
            items: Vec<CartItem>,
        }

        let wire = Wire::deserialize(deserializer)?;
        Ok(Self::new(wire.items))
    }
}

/// A signed quantity change for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDelta {
    pub product_id: ProductId,
    pub delta: i64,
}

impl CartDelta {
    /// The delta that moves `current` to `target`, or `None` when they match.
    #[must_use]
    pub fn between(product_id: ProductId, current: u32, target: u32) -> Option<Self> {
        let delta = i64::from(target) - i64::from(current);
        (delta != 0).then_some(Self { product_id, delta })
    }
}

/// Result of a checkout submission.
///
/// Any cart echoed back is informational; a completed checkout always
/// terminates the local cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResult {
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub cart: Option<Cart>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: &str, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            quantity,
        }
    }

    #[test]
    fn test_new_merges_duplicates_in_order() {
        let cart = Cart::new([item("a", 1), item("b", 2), item("a", 3)]);
        assert_eq!(cart.items(), &[item("a", 4), item("b", 2)]);
        assert_eq!(cart.total_quantity(), 6);
    }

    #[test]
    fn test_quantity_of_missing_is_zero() {
        let cart = Cart::new([item("a", 1)]);
        assert_eq!(cart.quantity_of(&ProductId::new("zzz")), 0);
    }

    #[test]
    fn test_delta_between() {
        let p = ProductId::new("p");
        assert_eq!(CartDelta::between(p.clone(), 3, 3), None);
        assert_eq!(CartDelta::between(p.clone(), 0, 2).unwrap().delta, 2);
        assert_eq!(CartDelta::between(p, 5, 0).unwrap().delta, -5);
    }

    #[test]
    fn test_cart_deserializes_from_wire() {
        let cart: Cart = serde_json::from_str(
            r#"{"items":[{"productId":"a","quantity":1},{"productId":"a","quantity":1}]}"#,
        )
        .unwrap();
        assert_eq!(cart.quantity_of(&ProductId::new("a")), 2);

        let empty: Cart = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_delta_wire_format() {
        let delta = CartDelta {
            product_id: ProductId::new("p1"),
            delta: -2,
        };
        let json = serde_json::to_value(&delta).unwrap();
        assert_eq!(json, serde_json::json!({"productId": "p1", "delta": -2}));
    }
}
