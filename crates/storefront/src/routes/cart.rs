//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Every mutation is a form POST
//! that loads the cart, applies one reducer operation, saves it and
//! redirects back.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use paws_claws_core::{Cart, CartLine, OrderSummary, ProductId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::SessionCart;
use crate::models::session_keys;
use crate::routes::NavView;
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone, Debug)]
pub struct CartLineView {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub image: String,
    pub unit_price: String,
    pub quantity: u32,
    pub line_total: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product.id.to_string(),
            name: line.product.name.clone(),
            category: line.product.category.to_string(),
            image: line.product.image.clone(),
            unit_price: line.product.price.display(),
            quantity: line.quantity,
            line_total: line.line_total().display(),
        }
    }
}

/// Order summary display data for templates.
#[derive(Clone, Debug)]
pub struct SummaryView {
    pub subtotal: String,
    pub shipping: String,
    pub tax: String,
    pub total: String,
}

impl From<&OrderSummary> for SummaryView {
    fn from(summary: &OrderSummary) -> Self {
        Self {
            subtotal: summary.subtotal.display(),
            shipping: if summary.has_free_shipping() {
                "Free".to_string()
            } else {
                summary.shipping.display()
            },
            tax: summary.tax.display(),
            total: summary.total.display(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone, Debug)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub summary: SummaryView,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.lines().iter().map(CartLineView::from).collect(),
            summary: SummaryView::from(&OrderSummary::from_cart(cart)),
            item_count: cart.item_count(),
        }
    }
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub return_to: Option<String>,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub delta: i32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub nav: NavView,
    pub cart: CartView,
    pub error: Option<String>,
}

/// Cart count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

fn parse_product_id(raw: String) -> Result<ProductId> {
    if raw.trim().is_empty() {
        return Err(AppError::BadRequest("product_id is required".to_string()));
    }
    Ok(ProductId::new(raw))
}

/// Only follow same-site relative paths.
fn safe_return_to(return_to: Option<&str>) -> &str {
    match return_to {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/cart",
    }
}

/// Display cart page.
#[instrument(skip(session))]
pub async fn show(session: Session, Query(query): Query<MessageQuery>) -> Result<CartShowTemplate> {
    let stored = SessionCart::load(session.clone()).await?;
    Ok(CartShowTemplate {
        nav: NavView::load(&session).await,
        cart: CartView::from(&stored.cart),
        error: query.error,
    })
}

/// Add one unit of a product.
#[instrument(skip(state, stored))]
pub async fn add(
    State(state): State<AppState>,
    mut stored: SessionCart,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let product_id = parse_product_id(form.product_id)?;
    let product = state
        .catalog()
        .get(&product_id)
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    stored.cart.add(product.clone());
    stored.save().await?;

    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
    Ok(Redirect::to(safe_return_to(form.return_to.as_deref())))
}

/// Shift a line's quantity; never drops below one.
#[instrument(skip(stored))]
pub async fn update(mut stored: SessionCart, Form(form): Form<UpdateCartForm>) -> Result<Redirect> {
    let product_id = parse_product_id(form.product_id)?;
    stored.cart.update_quantity(&product_id, form.delta);
    stored.save().await?;
    Ok(Redirect::to("/cart"))
}

/// Remove a line.
#[instrument(skip(stored))]
pub async fn remove(
    mut stored: SessionCart,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect> {
    let product_id = parse_product_id(form.product_id)?;
    stored.cart.remove(&product_id);
    stored.save().await?;

    add_breadcrumb("cart", "Removed from cart", Some(&[("product_id", product_id.as_str())]));
    Ok(Redirect::to("/cart"))
}

/// Empty the cart.
#[instrument(skip(stored))]
pub async fn clear(mut stored: SessionCart) -> Result<Redirect> {
    stored.cart.clear();
    stored.save().await?;
    Ok(Redirect::to("/cart"))
}

/// Get cart count badge.
#[instrument(skip(session))]
pub async fn count(session: Session) -> CartCountTemplate {
    let count = session
        .get::<Cart>(session_keys::CART)
        .await
        .ok()
        .flatten()
        .map_or(0, |cart| cart.item_count());
    CartCountTemplate { count }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_return_to() {
        assert_eq!(safe_return_to(Some("/shop?cat=Toys")), "/shop?cat=Toys");
        assert_eq!(safe_return_to(Some("//evil.example")), "/cart");
        assert_eq!(safe_return_to(Some("https://evil.example")), "/cart");
        assert_eq!(safe_return_to(None), "/cart");
    }

    #[test]
    fn test_blank_product_id_is_bad_request() {
        assert!(matches!(
            parse_product_id("  ".to_string()),
            Err(AppError::BadRequest(_))
        ));
        assert!(parse_product_id("3".to_string()).is_ok());
    }

    #[test]
    fn test_summary_view_shows_free_shipping() {
        let summary = OrderSummary {
            subtotal: paws_claws_core::Money::from_dollars(100),
            shipping: paws_claws_core::Money::ZERO,
            tax: paws_claws_core::Money::from_dollars(8),
            total: paws_claws_core::Money::from_dollars(108),
        };
        let view = SummaryView::from(&summary);
        assert_eq!(view.shipping, "Free");
        assert_eq!(view.total, "$108.00");
    }
}
