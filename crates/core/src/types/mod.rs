//! Core types for Storehost.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod id;
pub mod price;
pub mod scope;
pub mod tenant;

pub use auth::{AuthBootstrapState, UserIdentity};
pub use cart::{Cart, CartDelta, CartItem, CheckoutResult};
pub use catalog::{Category, Product};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use scope::{RequestScope, TENANT_HEADER};
pub use tenant::{
    SocialLinks, TenantCondition, TenantIdentity, TenantResolutionState, slugify, title_case,
};
