//! Orders as stored in the external order store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::cart::CartLine;
use crate::types::{Money, OrderId, OrderStatus, UserId};

/// A completed checkout. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(deserialize_with = "order_id_from_any")]
    pub id: OrderId,
    pub user_id: UserId,
    pub total: Money,
    pub status: OrderStatus,
    pub items: Vec<CartLine>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Attach an id to an order that has not been persisted.
    #[must_use]
    pub fn from_new(id: OrderId, new: NewOrder) -> Self {
        Self {
            id,
            user_id: new.user_id,
            total: new.total,
            status: new.status,
            items: new.items,
            created_at: new.created_at,
        }
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |count, line| count.saturating_add(line.quantity))
    }
}

/// The row written at checkout; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewOrder {
    pub user_id: UserId,
    pub total: Money,
    pub status: OrderStatus,
    pub items: Vec<CartLine>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// A completed order for `items`, stamped now.
    #[must_use]
    pub fn completed(user_id: UserId, total: Money, items: Vec<CartLine>) -> Self {
        Self {
            user_id,
            total,
            status: OrderStatus::Completed,
            items,
            created_at: Utc::now(),
        }
    }
}

/// Sort newest first, the order history's display order.
pub fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

// Order stores may key rows by uuid or by serial integer.
fn order_id_from_any<'de, D>(deserializer: D) -> Result<OrderId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => OrderId::new(text),
        RawId::Number(number) => OrderId::new(number.to_string()),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: serde_json::Value, created_at: &str) -> serde_json::Value {
        json!({
            "id": id,
            "user_id": "user-1",
            "total": 25.8,
            "status": "completed",
            "items": [{
                "id": "3", "name": "Squeaky Bone", "category": "Toys",
                "description": "Indestructible.", "price": 8.99,
                "image": "https://img.test/3", "rating": 4.5, "reviews": 210,
                "tags": ["New"], "quantity": 2
            }],
            "created_at": created_at
        })
    }

    #[test]
    fn test_parses_store_row() {
        let order: Order =
            serde_json::from_value(row(json!("ord-1"), "2026-03-01T10:00:00+00:00")).unwrap();
        assert_eq!(order.id.as_str(), "ord-1");
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.total, Money::from_cents(2580));
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.items[0].line_total(), Money::from_cents(1798));
    }

    #[test]
    fn test_parses_numeric_id() {
        let order: Order =
            serde_json::from_value(row(json!(42), "2026-03-01T10:00:00Z")).unwrap();
        assert_eq!(order.id.as_str(), "42");
    }

    #[test]
    fn test_new_order_wire_shape() {
        let new = NewOrder::completed(UserId::new("user-1"), Money::from_cents(10800), vec![]);
        let value = serde_json::to_value(&new).unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["total"], "108.00");
        assert!(value.get("id").is_none());
        assert!(value["items"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_sort_newest_first() {
        let mut orders: Vec<Order> = [
            "2026-01-01T00:00:00Z",
            "2026-03-01T00:00:00Z",
            "2026-02-01T00:00:00Z",
        ]
        .iter()
        .enumerate()
        .map(|(i, ts)| serde_json::from_value(row(json!(i), ts)).unwrap())
        .collect();

        sort_newest_first(&mut orders);
        let ids: Vec<_> = orders.iter().map(|o| o.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["1", "2", "0"]);
    }
}
