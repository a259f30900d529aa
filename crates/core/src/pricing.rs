//! Order totals.
//!
//! Totals are recomputed from the cart on every read and never stored on the
//! cart itself.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::cart::{Cart, CartLine};
use crate::types::Money;

/// Subtotal at or above which shipping is free, in dollars.
pub const FREE_SHIPPING_THRESHOLD: i64 = 100;

/// Flat shipping fee below the threshold, in dollars.
pub const FLAT_SHIPPING_FEE: i64 = 15;

/// Sales tax rate applied to the subtotal.
#[must_use]
pub fn tax_rate() -> Decimal {
    Decimal::new(8, 2)
}

/// The four figures shown under the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

impl OrderSummary {
    /// Compute the summary for a set of lines.
    #[must_use]
    pub fn for_lines(lines: &[CartLine]) -> Self {
        let subtotal: Money = lines.iter().map(CartLine::line_total).sum();
        let shipping = shipping_for(subtotal);
        let tax = subtotal.times_rate(tax_rate()).round_to_cents();

        Self {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }

    #[must_use]
    pub fn from_cart(cart: &Cart) -> Self {
        Self::for_lines(cart.lines())
    }

    #[must_use]
    pub fn has_free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }
}

/// Shipping owed for a given subtotal.
#[must_use]
pub fn shipping_for(subtotal: Money) -> Money {
    if subtotal >= Money::from_dollars(FREE_SHIPPING_THRESHOLD) {
        Money::ZERO
    } else {
        Money::from_dollars(FLAT_SHIPPING_FEE)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::Product;
    use crate::types::{Category, ProductId};

    fn product(id: &str, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: id.to_string(),
            category: Category::Food,
            description: String::new(),
            price: Money::from_cents(cents),
            old_price: None,
            image: String::new(),
            rating: 5.0,
            reviews: 0,
            tags: Vec::new(),
        }
    }

    fn cart_of(items: &[(&str, i64, u32)]) -> Cart {
        let mut cart = Cart::new();
        for (id, cents, quantity) in items {
            for _ in 0..*quantity {
                cart.add(product(id, *cents));
            }
        }
        cart
    }

    #[test]
    fn test_threshold_subtotal_ships_free() {
        let summary = OrderSummary::from_cart(&cart_of(&[("a", 5000, 2)]));
        assert_eq!(summary.subtotal, Money::from_dollars(100));
        assert_eq!(summary.shipping, Money::ZERO);
        assert_eq!(summary.tax, Money::from_cents(800));
        assert_eq!(summary.total, Money::from_cents(10800));
        assert!(summary.has_free_shipping());
    }

    #[test]
    fn test_small_order_pays_flat_shipping() {
        let summary = OrderSummary::from_cart(&cart_of(&[("a", 1000, 1)]));
        assert_eq!(summary.subtotal, Money::from_dollars(10));
        assert_eq!(summary.shipping, Money::from_dollars(15));
        assert_eq!(summary.tax, Money::from_cents(80));
        assert_eq!(summary.total, Money::from_cents(2580));
    }

    #[test]
    fn test_just_below_threshold_pays_shipping() {
        let summary = OrderSummary::from_cart(&cart_of(&[("a", 9999, 1)]));
        assert_eq!(summary.shipping, Money::from_dollars(15));
    }

    #[test]
    fn test_tax_is_rounded_to_cents() {
        // 24.99 + 8.99 * 3 = 51.96; 51.96 * 0.08 = 4.1568
        let summary = OrderSummary::from_cart(&cart_of(&[("a", 2499, 1), ("b", 899, 3)]));
        assert_eq!(summary.subtotal, Money::from_cents(5196));
        assert_eq!(summary.tax, Money::from_cents(416));
        assert_eq!(summary.total, Money::from_cents(5196 + 1500 + 416));
    }

    #[test]
    fn test_empty_cart() {
        let summary = OrderSummary::from_cart(&Cart::new());
        assert_eq!(summary.subtotal, Money::ZERO);
        assert_eq!(summary.tax, Money::ZERO);
        assert_eq!(summary.shipping, Money::from_dollars(15));
    }

    #[test]
    fn test_total_is_sum_of_parts() {
        let summary = OrderSummary::from_cart(&cart_of(&[("a", 4500, 1), ("b", 1299, 2)]));
        assert_eq!(
            summary.total,
            summary.subtotal + summary.shipping + summary.tax
        );
    }
}
