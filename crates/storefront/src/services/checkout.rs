//! Checkout: confirm payment, then record the order.
//!
//! ```text
//! Idle ──submit──▶ Submitting ──▶ Succeeded(receipt)
//!                            └──▶ Failed(message)
//! ```
//!
//! A submit without a signed-in user never leaves `Idle`, and neither the
//! payment gateway nor the order store is called.

use thiserror::Error;
use tracing::instrument;

use paws_claws_core::{Cart, NewOrder, Order, OrderId, OrderSummary};

use crate::models::UserSession;
use crate::orders::{OrderStore, StoreError};
use crate::payments::{PaymentConfirmation, PaymentError, PaymentGateway, PaymentRequest};

/// Errors that end a checkout attempt.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nobody is signed in.
    #[error("please sign in to check out")]
    NotAuthenticated,

    /// Nothing to buy.
    #[error("your cart is empty")]
    EmptyCart,

    /// Payment confirmation failed.
    #[error("{0}")]
    Payment(#[from] PaymentError),

    /// The order could not be recorded.
    #[error("{0}")]
    Store(#[from] StoreError),
}

/// Outcome of a successful checkout.
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    pub order: Order,
    pub summary: OrderSummary,
    pub payment: PaymentConfirmation,
    /// `false` when the order store has no order table and the order only
    /// exists in this receipt.
    pub persisted: bool,
}

/// Where a checkout attempt stands.
#[derive(Debug, Clone, Default)]
pub enum CheckoutState {
    #[default]
    Idle,
    Submitting,
    Succeeded(Box<CheckoutReceipt>),
    Failed(String),
}

/// One checkout attempt.
pub struct CheckoutFlow<'a> {
    payments: &'a dyn PaymentGateway,
    orders: &'a dyn OrderStore,
    state: CheckoutState,
}

impl<'a> CheckoutFlow<'a> {
    /// Create a new checkout flow.
    #[must_use]
    pub fn new(payments: &'a dyn PaymentGateway, orders: &'a dyn OrderStore) -> Self {
        Self {
            payments,
            orders,
            state: CheckoutState::Idle,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Run checkout for `cart` on behalf of `session`.
    ///
    /// On success the cart is cleared; on any failure it is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NotAuthenticated` or `CheckoutError::EmptyCart`
    /// without leaving `Idle`, and the payment or store error otherwise. A
    /// missing order table is not an error; see [`CheckoutReceipt::persisted`].
    #[instrument(skip_all, fields(user_id, items = cart.item_count()))]
    pub async fn submit(
        &mut self,
        session: Option<&UserSession>,
        cart: &mut Cart,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let Some(session) = session else {
            return Err(CheckoutError::NotAuthenticated);
        };
        tracing::Span::current().record("user_id", tracing::field::display(&session.user.id));
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        self.state = CheckoutState::Submitting;
        match self.run(session, cart).await {
            Ok(receipt) => {
                cart.clear();
                self.state = CheckoutState::Succeeded(Box::new(receipt.clone()));
                Ok(receipt)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Checkout failed");
                self.state = CheckoutState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    async fn run(&self, session: &UserSession, cart: &Cart) -> Result<CheckoutReceipt, CheckoutError> {
        let summary = OrderSummary::from_cart(cart);

        let payment = self
            .payments
            .confirm(PaymentRequest {
                amount: summary.total,
                card: None,
            })
            .await?;

        let new_order = NewOrder::completed(
            session.user.id.clone(),
            summary.total,
            cart.lines().to_vec(),
        );

        let (order, persisted) = match self.orders.insert(session, new_order.clone()).await {
            Ok(order) => (order, true),
            Err(StoreError::RelationMissing(message)) => {
                tracing::warn!(
                    %message,
                    "Order table missing; checkout completed without saving the order"
                );
                (Order::from_new(OrderId::generate(), new_order), false)
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(order_id = %order.id, total = %order.total, persisted, "Order placed");
        Ok(CheckoutReceipt {
            order,
            summary,
            payment,
            persisted,
        })
    }
}
