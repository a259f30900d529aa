//! Order history route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use paws_claws_core::Order;

use crate::filters;
use crate::middleware::RequireAuth;
use crate::orders::StoreError;
use crate::routes::NavView;
use crate::routes::cart::CartLineView;
use crate::state::AppState;

/// Shown when the order table has not been created yet.
pub const MISSING_TABLE_MESSAGE: &str = "Order table not found, please contact the administrator.";

/// Order display data for templates.
#[derive(Clone, Debug)]
pub struct OrderView {
    pub id: String,
    /// First eight characters of the id, for the card header.
    pub short_id: String,
    pub placed_at: String,
    pub status_label: &'static str,
    pub badge_class: &'static str,
    pub item_count: u32,
    pub lines: Vec<CartLineView>,
    pub total: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        let id = order.id.to_string();
        Self {
            short_id: id.chars().take(8).collect(),
            id,
            placed_at: order.created_at.format("%B %-d, %Y").to_string(),
            status_label: order.status.label(),
            badge_class: order.status.badge_class(),
            item_count: order.item_count(),
            lines: order.items.iter().map(CartLineView::from).collect(),
            total: order.total.display(),
        }
    }
}

/// A failure loading the history.
#[derive(Clone, Debug)]
pub struct LoadFailure {
    pub message: String,
    /// Retrying cannot help when the table is missing.
    pub can_retry: bool,
}

impl From<&StoreError> for LoadFailure {
    fn from(err: &StoreError) -> Self {
        if err.is_relation_missing() {
            Self {
                message: MISSING_TABLE_MESSAGE.to_string(),
                can_retry: false,
            }
        } else {
            Self {
                message: err.to_string(),
                can_retry: true,
            }
        }
    }
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersTemplate {
    pub nav: NavView,
    pub email: String,
    pub orders: Vec<OrderView>,
    pub failure: Option<LoadFailure>,
}

/// Display the signed-in user's orders, newest first.
#[instrument(skip_all, fields(user_id = %user_session.user.id))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user_session): RequireAuth,
) -> OrdersTemplate {
    let (orders, failure) = match state.orders().list_for_user(&user_session).await {
        Ok(orders) => (orders.iter().map(OrderView::from).collect(), None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load order history");
            (Vec::new(), Some(LoadFailure::from(&e)))
        }
    };

    OrdersTemplate {
        nav: NavView::load(&session).await,
        email: user_session.user.email.to_string(),
        orders,
        failure,
    }
}
