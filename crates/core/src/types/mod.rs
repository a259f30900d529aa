//! Core types for Paws & Claws.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use category::{Category, CategoryFilter};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use status::*;
