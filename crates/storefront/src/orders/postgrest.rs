//! PostgREST-backed order store.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use paws_claws_core::{NewOrder, Order, order::sort_newest_first};

use super::{OrderStore, StoreError};
use crate::config::{SupabaseConfig, anon_key};
use crate::models::UserSession;

/// PostgREST error body.
#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    code: Option<String>,
    message: Option<String>,
}

fn parse_error(status: reqwest::StatusCode, body: &str) -> StoreError {
    let parsed: ErrorResponse = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .unwrap_or_else(|| format!("order store returned {status}"));
    StoreError::from_code(parsed.code, message)
}

/// Order table exposed through the PostgREST API (`/rest/v1/{table}`).
#[derive(Clone)]
pub struct PostgrestOrderStore {
    inner: Arc<PostgrestOrderStoreInner>,
}

struct PostgrestOrderStoreInner {
    client: reqwest::Client,
    table_url: Url,
    anon_key: String,
}

impl PostgrestOrderStore {
    /// Create a new store client.
    ///
    /// # Errors
    ///
    /// Returns an error if the table name does not form a valid URL.
    pub fn new(client: reqwest::Client, config: &SupabaseConfig) -> Result<Self, url::ParseError> {
        let table_url = config
            .url
            .join(&format!("rest/v1/{}", config.orders_table))?;
        Ok(Self {
            inner: Arc::new(PostgrestOrderStoreInner {
                client,
                table_url,
                anon_key: anon_key(config).to_string(),
            }),
        })
    }

    fn request(&self, method: reqwest::Method, url: Url, session: &UserSession) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(session.access_token.expose())
    }

    async fn read_success(response: reqwest::Response) -> Result<String, StoreError> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(parse_error(status, &body))
        }
    }
}

#[async_trait]
impl OrderStore for PostgrestOrderStore {
    #[instrument(skip(self, session, order), fields(user_id = %session.user.id, total = %order.total))]
    async fn insert(&self, session: &UserSession, order: NewOrder) -> Result<Order, StoreError> {
        let response = self
            .request(reqwest::Method::POST, self.inner.table_url.clone(), session)
            .header("Prefer", "return=representation")
            .json(&order)
            .send()
            .await?;

        let body = Self::read_success(response).await?;
        let mut rows: Vec<Order> = serde_json::from_str(&body)?;
        rows.pop().ok_or_else(|| StoreError::Rejected {
            code: None,
            message: "order store returned no row for the new order".to_string(),
        })
    }

    #[instrument(skip(self, session), fields(user_id = %session.user.id))]
    async fn list_for_user(&self, session: &UserSession) -> Result<Vec<Order>, StoreError> {
        let mut url = self.inner.table_url.clone();
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("user_id", &format!("eq.{}", session.user.id))
            .append_pair("order", "created_at.desc");

        let response = self
            .request(reqwest::Method::GET, url, session)
            .send()
            .await?;

        let body = Self::read_success(response).await?;
        let mut orders: Vec<Order> = serde_json::from_str(&body)?;
        // Rows with equal timestamps may come back in any order; keep it stable.
        sort_newest_first(&mut orders);
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn test_parse_undefined_table() {
        let err = parse_error(
            StatusCode::NOT_FOUND,
            r#"{"code":"42P01","details":null,"hint":null,"message":"relation \"public.orders\" does not exist"}"#,
        );
        assert!(err.is_relation_missing());
    }

    #[test]
    fn test_parse_schema_cache_miss() {
        let err = parse_error(
            StatusCode::NOT_FOUND,
            r#"{"code":"PGRST205","message":"Could not find the table 'public.orders' in the schema cache"}"#,
        );
        assert!(err.is_relation_missing());
    }

    #[test]
    fn test_parse_unstructured_error() {
        let err = parse_error(StatusCode::SERVICE_UNAVAILABLE, "upstream down");
        assert_eq!(err.to_string(), "order store returned 503 Service Unavailable");
    }
}
