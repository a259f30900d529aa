//! End-to-end tests for the Paws & Claws storefront.
//!
//! [`TestApp`] drives the real router in-process with `tower::ServiceExt`,
//! carrying the session cookie between requests like a browser would. The
//! identity provider and order store are in-memory fakes; payments go through
//! the real simulated gateway with no delay.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p paws-claws-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use secrecy::ExposeSecret;
use tower::ServiceExt;

use paws_claws_core::{NewOrder, Order, OrderId, UserId, order::sort_newest_first};
use paws_claws_storefront::config::StorefrontConfig;
use paws_claws_storefront::identity::{
    Credentials, IdentityError, IdentityProvider, SignUpOutcome, SignUpProfile,
};
use paws_claws_storefront::models::{AccessToken, SessionUser, UserSession};
use paws_claws_storefront::orders::{OrderStore, StoreError};
use paws_claws_storefront::payments::SimulatedGateway;
use paws_claws_storefront::session::SessionFeed;
use paws_claws_storefront::state::{AppState, Services};

/// Password every seeded account uses.
pub const PASSWORD: &str = "correct-horse";

/// Client address sent on every request, for the auth rate limiter.
const CLIENT_IP: &str = "203.0.113.7";

// =============================================================================
// Fake identity provider
// =============================================================================

#[derive(Default)]
struct Accounts {
    users: HashMap<String, SessionUser>,
    live_tokens: HashSet<String>,
}

/// In-memory identity provider.
#[derive(Default)]
pub struct FakeIdentity {
    accounts: Mutex<Accounts>,
    /// Sign-ups return `ConfirmationRequired` instead of a session.
    pub require_confirmation: bool,
}

impl FakeIdentity {
    /// A provider that answers every sign-up with a confirmation email.
    pub fn requiring_confirmation() -> Self {
        Self {
            require_confirmation: true,
            ..Self::default()
        }
    }

    /// Create an account that can sign in with [`PASSWORD`].
    pub fn seed(&self, email: &str) -> SessionUser {
        let user = SessionUser {
            id: UserId::new(format!("user-{email}")),
            email: email.parse().expect("valid email"),
        };
        self.accounts
            .lock()
            .unwrap()
            .users
            .insert(email.to_string(), user.clone());
        user
    }

    /// Invalidate every issued token, as if all sessions expired.
    pub fn expire_all(&self) {
        self.accounts.lock().unwrap().live_tokens.clear();
    }

    fn issue(&self, user: SessionUser) -> UserSession {
        let token = format!("token-{}", user.id);
        self.accounts
            .lock()
            .unwrap()
            .live_tokens
            .insert(token.clone());
        UserSession {
            user,
            access_token: AccessToken::new(token),
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_in(&self, credentials: &Credentials) -> Result<UserSession, IdentityError> {
        let user = self
            .accounts
            .lock()
            .unwrap()
            .users
            .get(credentials.email.as_str())
            .cloned();
        match user {
            Some(user) if credentials.password.expose_secret() == PASSWORD => Ok(self.issue(user)),
            _ => Err(IdentityError::Rejected(
                "Invalid login credentials".to_string(),
            )),
        }
    }

    async fn sign_up(
        &self,
        credentials: &Credentials,
        _profile: &SignUpProfile,
    ) -> Result<SignUpOutcome, IdentityError> {
        if self
            .accounts
            .lock()
            .unwrap()
            .users
            .contains_key(credentials.email.as_str())
        {
            return Err(IdentityError::Rejected(
                "User already registered".to_string(),
            ));
        }
        let user = self.seed(credentials.email.as_str());
        if self.require_confirmation {
            Ok(SignUpOutcome::ConfirmationRequired { email: user.email })
        } else {
            Ok(SignUpOutcome::SignedIn(self.issue(user)))
        }
    }

    async fn sign_out(&self, session: &UserSession) -> Result<(), IdentityError> {
        self.accounts
            .lock()
            .unwrap()
            .live_tokens
            .remove(session.access_token.expose());
        Ok(())
    }

    async fn fetch_user(&self, token: &AccessToken) -> Result<Option<SessionUser>, IdentityError> {
        let accounts = self.accounts.lock().unwrap();
        if !accounts.live_tokens.contains(token.expose()) {
            return Ok(None);
        }
        Ok(accounts
            .users
            .values()
            .find(|user| token.expose() == format!("token-{}", user.id))
            .cloned())
    }
}

// =============================================================================
// Fake order store
// =============================================================================

/// In-memory order store.
#[derive(Default)]
pub struct FakeOrderStore {
    orders: Mutex<Vec<Order>>,
    fail_next: Mutex<Option<StoreError>>,
    missing_table: Mutex<bool>,
}

impl FakeOrderStore {
    /// Every order written so far.
    pub fn orders(&self) -> Vec<Order> {
        self.orders.lock().unwrap().clone()
    }

    /// Store an order directly, bypassing checkout.
    pub fn seed(&self, order: Order) {
        self.orders.lock().unwrap().push(order);
    }

    /// Fail the next call with `err`.
    pub fn fail_next(&self, err: StoreError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    /// Behave as if the order table had never been created.
    pub fn drop_table(&self) {
        *self.missing_table.lock().unwrap() = true;
    }

    fn check(&self) -> Result<(), StoreError> {
        if *self.missing_table.lock().unwrap() {
            return Err(StoreError::from_code(
                Some("42P01".to_string()),
                "relation \"public.orders\" does not exist".to_string(),
            ));
        }
        self.fail_next.lock().unwrap().take().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl OrderStore for FakeOrderStore {
    async fn insert(&self, _session: &UserSession, order: NewOrder) -> Result<Order, StoreError> {
        self.check()?;
        let order = Order::from_new(OrderId::generate(), order);
        self.orders.lock().unwrap().push(order.clone());
        Ok(order)
    }

    async fn list_for_user(&self, session: &UserSession) -> Result<Vec<Order>, StoreError> {
        self.check()?;
        let mut orders: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|order| order.user_id == session.user.id)
            .cloned()
            .collect();
        sort_newest_first(&mut orders);
        Ok(orders)
    }
}

// =============================================================================
// Test application
// =============================================================================

/// A response, buffered.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl TestResponse {
    /// Assert a redirect and return its target.
    pub fn redirect_target(&self) -> &str {
        assert!(
            self.status.is_redirection(),
            "expected redirect, got {}: {}",
            self.status,
            self.body
        );
        self.location.as_deref().expect("redirect without location")
    }
}

/// The storefront router plus the fakes behind it.
pub struct TestApp {
    router: Router,
    cookie: Mutex<Option<String>>,
    pub state: AppState,
    pub identity: Arc<FakeIdentity>,
    pub orders: Arc<FakeOrderStore>,
}

/// Configuration for a deployment with a backend.
pub fn test_config() -> StorefrontConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("SUPABASE_URL", "https://pawsclaws-test.supabase.co"),
        ("SUPABASE_ANON_KEY", "anon-test-key"),
        ("PAYMENT_CONFIRMATION_DELAY_MS", "0"),
    ]);
    StorefrontConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_string()))
        .expect("test config is valid")
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_identity(FakeIdentity::default())
    }

    pub fn with_identity(identity: FakeIdentity) -> Self {
        let identity = Arc::new(identity);
        let orders = Arc::new(FakeOrderStore::default());
        let services = Services {
            identity: identity.clone(),
            orders: orders.clone(),
            payments: Arc::new(SimulatedGateway::new(Duration::ZERO)),
        };
        let catalog = paws_claws_storefront::catalog::load().expect("catalog loads");
        let state = AppState::with_services(test_config(), catalog, services);

        Self {
            router: paws_claws_storefront::app(state.clone()),
            cookie: Mutex::new(None),
            state,
            identity,
            orders,
        }
    }

    pub fn session_feed(&self) -> &SessionFeed {
        self.state.session_feed()
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri), Body::empty()).await
    }

    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = form_body(fields);
        self.send(
            Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded"),
            Body::from(body),
        )
        .await
    }

    /// Add one unit of `product_id` to the cart.
    pub async fn add_to_cart(&self, product_id: &str) {
        let response = self
            .post_form("/cart/add", &[("product_id", product_id)])
            .await;
        assert_eq!(response.redirect_target(), "/cart");
    }

    /// Sign in as a freshly seeded account.
    pub async fn sign_in_as(&self, email: &str) -> SessionUser {
        let user = self.identity.seed(email);
        let response = self
            .post_form("/auth/login", &[("email", email), ("password", PASSWORD)])
            .await;
        assert_eq!(response.redirect_target(), "/shop");
        user
    }

    async fn send(&self, builder: axum::http::request::Builder, body: Body) -> TestResponse {
        let mut builder = builder.header("x-forwarded-for", CLIENT_IP);
        if let Some(cookie) = self.cookie.lock().unwrap().clone() {
            builder = builder.header(header::COOKIE, cookie);
        }
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie
                .to_str()
                .unwrap()
                .split(';')
                .next()
                .unwrap_or_default()
                .to_string();
            *self.cookie.lock().unwrap() = Some(pair);
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            location,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
