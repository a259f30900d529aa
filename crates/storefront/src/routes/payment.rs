//! Standalone card payment page.
//!
//! The amount is handed over from the cart as navigation state: `POST
//! /payment/start` stores the cart total in the session and the payment page
//! reads it back. The cart itself is not touched here.

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

use paws_claws_core::{Money, OrderSummary};

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::SessionCart;
use crate::models::session_keys;
use crate::payments::{CardDetails, PaymentRequest};
use crate::routes::{NavView, with_error};
use crate::state::AppState;

/// Card form data.
#[derive(Deserialize)]
pub struct PaymentForm {
    pub card_number: String,
    pub expiry: String,
    pub cvc: String,
}

impl std::fmt::Debug for PaymentForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PaymentForm([REDACTED])")
    }
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

/// Payment page template.
#[derive(Template, WebTemplate)]
#[template(path = "payment/show.html")]
pub struct PaymentTemplate {
    pub nav: NavView,
    /// `None` renders the "nothing to pay" view.
    pub amount: Option<String>,
    pub test_mode: bool,
    pub error: Option<String>,
}

async fn pending_amount(session: &Session) -> Result<Option<Money>> {
    let amount = session.get::<Money>(session_keys::PAYMENT_TOTAL).await?;
    Ok(amount.filter(|amount| !amount.is_zero() && !amount.is_negative()))
}

/// Store the cart total and go to the payment page.
#[instrument(skip_all)]
pub async fn start(stored: SessionCart) -> Result<Redirect> {
    if stored.cart.is_empty() {
        return Ok(Redirect::to("/cart"));
    }
    let total = OrderSummary::from_cart(&stored.cart).total;
    stored
        .session()
        .insert(session_keys::PAYMENT_TOTAL, total)
        .await?;
    Ok(Redirect::to("/payment"))
}

/// Display the payment page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<MessageQuery>,
) -> Result<PaymentTemplate> {
    Ok(PaymentTemplate {
        amount: pending_amount(&session).await?.map(|m| m.display()),
        nav: NavView::load(&session).await,
        test_mode: state.config().payments.is_test_mode(),
        error: query.error,
    })
}

/// Tokenize the card and confirm the pending amount.
#[instrument(skip(state, session, form))]
pub async fn pay(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PaymentForm>,
) -> Result<Redirect> {
    let Some(amount) = pending_amount(&session).await? else {
        return Ok(Redirect::to("/payment"));
    };

    let request = PaymentRequest {
        amount,
        card: Some(CardDetails {
            number: form.card_number,
            expiry: form.expiry,
            cvc: form.cvc,
        }),
    };

    match state.payments().confirm(request).await {
        Ok(confirmation) => {
            session.remove::<Money>(session_keys::PAYMENT_TOTAL).await?;
            session
                .insert(
                    session_keys::FLASH,
                    format!("Payment of {} successful!", confirmation.amount),
                )
                .await?;
            add_breadcrumb(
                "payment",
                "Payment confirmed",
                Some(&[("method", confirmation.method.as_str())]),
            );
            Ok(Redirect::to("/"))
        }
        Err(e) => {
            tracing::info!(error = %e, "Card rejected");
            Ok(Redirect::to(&with_error("/payment", &e.to_string())))
        }
    }
}
