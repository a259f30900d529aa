//! Domain models for storefront.

pub mod session;

pub use session::{AccessToken, SessionUser, UserSession, keys as session_keys};
