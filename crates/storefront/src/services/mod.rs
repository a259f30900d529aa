//! Business logic services for storefront.
//!
//! # Services
//!
//! - `checkout` - Payment confirmation and order recording

pub mod checkout;

pub use checkout::{CheckoutError, CheckoutFlow, CheckoutReceipt, CheckoutState};
