//! The cart reducer.
//!
//! A [`Cart`] is a plain value: the storefront loads it from the visitor's
//! session, applies one intent and writes it back. Every operation is total;
//! unknown product ids are silently ignored.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::{Money, ProductId};

/// A product snapshot plus the quantity ordered.
///
/// Serializes with the product fields flattened next to `quantity`, which is
/// the shape orders embed in their `items` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    fn new(product: Product) -> Self {
        Self {
            product,
            quantity: 1,
        }
    }

    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.product.price * self.quantity
    }
}

/// Lines keyed by product id, in the order they were first added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `product`.
    ///
    /// Increments the existing line, or appends a new line with quantity 1.
    pub fn add(&mut self, product: Product) {
        match self.position(&product.id) {
            Some(index) => {
                if let Some(line) = self.lines.get_mut(index) {
                    line.quantity = line.quantity.saturating_add(1);
                }
            }
            None => self.lines.push(CartLine::new(product)),
        }
    }

    /// Remove the line for `id`, if any.
    pub fn remove(&mut self, id: &ProductId) {
        self.lines.retain(|line| &line.product.id != id);
    }

    /// Shift the quantity of `id` by `delta`, never going below 1.
    ///
    /// A no-op when the product is not in the cart.
    pub fn update_quantity(&mut self, id: &ProductId, delta: i32) {
        if let Some(line) = self.lines.iter_mut().find(|line| &line.product.id == id) {
            line.quantity = line.quantity.saturating_add_signed(delta).max(1);
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.product.id == id)
    }

    /// Total units across all lines (the nav badge count).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |count, line| count.saturating_add(line.quantity))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Consume the cart, yielding its lines as an order snapshot.
    #[must_use]
    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    fn position(&self, id: &ProductId) -> Option<usize> {
        self.lines.iter().position(|line| &line.product.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn product(id: &str, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            category: Category::Toys,
            description: String::new(),
            price: Money::from_cents(cents),
            old_price: None,
            image: String::new(),
            rating: 4.0,
            reviews: 1,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_add_same_product_twice_merges_lines() {
        let mut cart = Cart::new();
        cart.add(product("bone", 899));
        cart.add(product("bone", 899));

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.get(&ProductId::new("bone")).unwrap().quantity, 2);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_add_keeps_insertion_order() {
        let mut cart = Cart::new();
        cart.add(product("b", 100));
        cart.add(product("a", 100));
        cart.add(product("b", 100));

        let ids: Vec<_> = cart.lines().iter().map(|l| l.product.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_update_quantity_clamps_at_one() {
        let mut cart = Cart::new();
        cart.add(product("bone", 899));
        cart.update_quantity(&ProductId::new("bone"), 4);
        assert_eq!(cart.item_count(), 5);

        cart.update_quantity(&ProductId::new("bone"), -100);
        assert_eq!(cart.get(&ProductId::new("bone")).unwrap().quantity, 1);

        cart.update_quantity(&ProductId::new("bone"), i32::MIN);
        assert_eq!(cart.get(&ProductId::new("bone")).unwrap().quantity, 1);
    }

    #[test]
    fn test_update_quantity_saturates_upwards() {
        let mut cart = Cart::new();
        cart.add(product("bone", 899));
        cart.update_quantity(&ProductId::new("bone"), i32::MAX);
        cart.update_quantity(&ProductId::new("bone"), i32::MAX);
        assert_eq!(cart.item_count(), u32::MAX);
    }

    #[test]
    fn test_update_quantity_absent_is_noop() {
        let mut cart = Cart::new();
        cart.add(product("bone", 899));
        let before = cart.clone();
        cart.update_quantity(&ProductId::new("missing"), 3);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_absent_leaves_cart_unchanged() {
        let mut cart = Cart::new();
        cart.add(product("bone", 899));
        let before = cart.clone();
        cart.remove(&ProductId::new("missing"));
        assert_eq!(cart, before);

        cart.remove(&ProductId::new("bone"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear_always_empties() {
        let mut cart = Cart::new();
        cart.clear();
        assert!(cart.is_empty());

        cart.add(product("a", 100));
        cart.add(product("b", 200));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_line_wire_shape_is_flat() {
        let mut cart = Cart::new();
        cart.add(product("bone", 899));
        let json = serde_json::to_value(&cart).unwrap();

        let line = &json.as_array().unwrap()[0];
        assert_eq!(line["id"], "bone");
        assert_eq!(line["quantity"], 1);
        assert_eq!(line["price"], "8.99");

        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }
}
