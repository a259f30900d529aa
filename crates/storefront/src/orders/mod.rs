//! Order store seam.
//!
//! Orders are persisted by an external relational store. Calls are made on
//! behalf of the signed-in user so the store's row-level policies apply.

mod postgrest;

pub use postgrest::PostgrestOrderStore;

use async_trait::async_trait;
use thiserror::Error;

use paws_claws_core::{NewOrder, Order};

use crate::models::UserSession;

/// Postgres "undefined table".
pub const UNDEFINED_TABLE_CODE: &str = "42P01";

/// PostgREST "table not found in schema cache".
pub const SCHEMA_CACHE_MISS_CODE: &str = "PGRST205";

/// Errors returned by an [`OrderStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// No backend is configured for this deployment.
    #[error("order history is unavailable: the order store is not configured")]
    NotConfigured,

    /// The order table does not exist.
    #[error("order table not found: {0}")]
    RelationMissing(String),

    /// The store refused the request.
    #[error("{message}")]
    Rejected {
        /// Store error code, when one was given.
        code: Option<String>,
        /// Message as reported by the store.
        message: String,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl StoreError {
    /// Classify an error reported by the store.
    #[must_use]
    pub fn from_code(code: Option<String>, message: String) -> Self {
        match code.as_deref() {
            Some(UNDEFINED_TABLE_CODE | SCHEMA_CACHE_MISS_CODE) => Self::RelationMissing(message),
            _ => Self::Rejected { code, message },
        }
    }

    #[must_use]
    pub const fn is_relation_missing(&self) -> bool {
        matches!(self, Self::RelationMissing(_))
    }
}

/// An external store of orders.
#[async_trait]
pub trait OrderStore: Send + Sync + 'static {
    /// Write a new order and return it as stored.
    async fn insert(&self, session: &UserSession, order: NewOrder) -> Result<Order, StoreError>;

    /// The session user's orders, newest first.
    async fn list_for_user(&self, session: &UserSession) -> Result<Vec<Order>, StoreError>;
}

/// Stand-in used when no backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotConfiguredStore;

#[async_trait]
impl OrderStore for NotConfiguredStore {
    async fn insert(&self, _session: &UserSession, _order: NewOrder) -> Result<Order, StoreError> {
        Err(StoreError::NotConfigured)
    }

    async fn list_for_user(&self, _session: &UserSession) -> Result<Vec<Order>, StoreError> {
        Err(StoreError::NotConfigured)
    }
}
