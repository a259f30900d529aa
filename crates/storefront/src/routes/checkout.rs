//! Checkout route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{LOGIN_PATH, OptionalAuth, SessionCart};
use crate::routes::cart::{CartLineView, SummaryView};
use crate::routes::{NavView, with_error};
use crate::services::{CheckoutError, CheckoutFlow, CheckoutReceipt};
use crate::state::AppState;

/// Order confirmation display data.
#[derive(Clone, Debug)]
pub struct ReceiptView {
    pub order_id: String,
    pub placed_at: String,
    pub lines: Vec<CartLineView>,
    pub summary: SummaryView,
    pub payment_method: String,
    pub persisted: bool,
}

impl From<&CheckoutReceipt> for ReceiptView {
    fn from(receipt: &CheckoutReceipt) -> Self {
        Self {
            order_id: receipt.order.id.to_string(),
            placed_at: receipt.order.created_at.format("%B %-d, %Y %H:%M UTC").to_string(),
            lines: receipt.order.items.iter().map(CartLineView::from).collect(),
            summary: SummaryView::from(&receipt.summary),
            payment_method: receipt.payment.method.to_string(),
            persisted: receipt.persisted,
        }
    }
}

/// Checkout confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/confirmation.html")]
pub struct ConfirmationTemplate {
    pub nav: NavView,
    pub receipt: ReceiptView,
}

/// Run checkout for the visitor's cart.
///
/// Signed-out visitors are sent to the sign-in page without anything being
/// charged or written. Failures return to the cart with the message shown.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    OptionalAuth(user_session): OptionalAuth,
    mut stored: SessionCart,
) -> Result<Response> {
    let mut flow = CheckoutFlow::new(state.payments(), state.orders());

    match flow.submit(user_session.as_ref(), &mut stored.cart).await {
        Ok(receipt) => {
            stored.save().await?;
            add_breadcrumb(
                "checkout",
                "Order placed",
                Some(&[("order_id", receipt.order.id.as_str())]),
            );
            Ok(ConfirmationTemplate {
                nav: NavView::load(stored.session()).await,
                receipt: ReceiptView::from(&receipt),
            }
            .into_response())
        }
        Err(CheckoutError::NotAuthenticated) => Ok(Redirect::to(LOGIN_PATH).into_response()),
        Err(e) => Ok(Redirect::to(&with_error("/cart", &e.to_string())).into_response()),
    }
}
