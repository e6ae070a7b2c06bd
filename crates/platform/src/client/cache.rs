//! Cache types for catalog responses.
//!
//! Entries are keyed by [`storehost_core::QueryKey::cache_key`], which is
//! always tenant-qualified.

use storehost_core::{Category, Product};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Category(Box<Category>),
    Categories(Vec<Category>),
}
