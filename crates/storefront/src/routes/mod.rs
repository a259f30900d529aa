//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /shop?cat=              - Catalog browser (Food | Toys | Grooming | All)
//!
//! # Cart
//! GET  /cart                   - Cart page with order summary
//! POST /cart/add               - Add one unit (redirects to `return_to`)
//! POST /cart/update            - Shift quantity by `delta`
//! POST /cart/remove            - Remove a line
//! POST /cart/clear             - Empty the cart
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! POST /checkout               - Confirm payment and record the order
//! POST /payment/start          - Hand the cart total to the payment page
//! GET  /payment                - Card payment page
//! POST /payment                - Tokenize card
//!
//! # Auth (POSTs rate limited)
//! GET  /auth                   - Sign-in form, or account panel when signed in
//! POST /auth/login             - Sign in
//! POST /auth/register          - Create an account
//! POST /auth/logout            - Sign out
//!
//! # Account (requires auth)
//! GET  /orders                 - Order history
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod orders;
pub mod payment;
pub mod shop;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;

use paws_claws_core::Cart;

use crate::middleware::auth_rate_limiter;
use crate::models::{UserSession, session_keys};
use crate::state::AppState;

/// Navigation bar data shared by every page.
#[derive(Clone, Debug, Default)]
pub struct NavView {
    pub cart_count: u32,
    pub user_email: Option<String>,
}

impl NavView {
    /// Read the badge count and signed-in email from the session.
    pub async fn load(session: &Session) -> Self {
        let cart_count = session
            .get::<Cart>(session_keys::CART)
            .await
            .ok()
            .flatten()
            .map_or(0, |cart| cart.item_count());
        let user_email = session
            .get::<UserSession>(session_keys::USER_SESSION)
            .await
            .ok()
            .flatten()
            .map(|s| s.user.email.to_string());
        Self {
            cart_count,
            user_email,
        }
    }

    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.user_email.is_some()
    }
}

/// Take the one-shot banner left by a previous request, if any.
pub async fn take_flash(session: &Session) -> Option<String> {
    session
        .remove::<String>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}

/// Build a redirect target carrying an error message in the query string.
#[must_use]
pub fn with_error(path: &str, message: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}error={}", urlencoding::encode(message))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the auth action routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(payment::show).post(payment::pay))
        .route("/start", post(payment::start))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/shop", get(shop::index))
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::submit))
        .nest("/payment", payment_routes())
        .route("/auth", get(auth::page))
        .nest("/auth", auth_routes())
        .route("/orders", get(orders::index))
}
