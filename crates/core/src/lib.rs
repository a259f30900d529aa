//! Paws & Claws Core - Shared domain library.
//!
//! This crate provides the domain used by the storefront:
//! - [`types`] - Newtype wrappers for IDs, money, emails, categories and statuses
//! - [`catalog`] - Product records and the category filter
//! - [`cart`] - The shopping-cart reducer
//! - [`pricing`] - Order summary computation (subtotal, shipping, tax, total)
//! - [`order`] - Order records as kept by the external order store
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session handling. Everything here is synchronous and total,
//! which keeps the cart and pricing rules testable in isolation.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod order;
pub mod pricing;
pub mod types;

pub use cart::{Cart, CartLine};
pub use catalog::{Catalog, CatalogError, Product};
pub use order::{NewOrder, Order};
pub use pricing::OrderSummary;
pub use types::*;
