//! Application state shared across handlers.

use std::sync::Arc;

use paws_claws_core::Catalog;

use crate::config::{BackendConfig, StorefrontConfig};
use crate::identity::{IdentityProvider, NotConfiguredIdentity, SupabaseIdentity};
use crate::orders::{NotConfiguredStore, OrderStore, PostgrestOrderStore};
use crate::payments::{PaymentGateway, SimulatedGateway};
use crate::session::SessionFeed;

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid order store URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// The external services the storefront talks to.
#[derive(Clone)]
pub struct Services {
    pub identity: Arc<dyn IdentityProvider>,
    pub orders: Arc<dyn OrderStore>,
    pub payments: Arc<dyn PaymentGateway>,
}

impl Services {
    /// Build the real service clients described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or the order store URL is invalid.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, StateError> {
        let payments: Arc<dyn PaymentGateway> =
            Arc::new(SimulatedGateway::new(config.payments.confirmation_delay));

        match &config.backend {
            BackendConfig::Configured(supabase) => {
                let client = reqwest::Client::builder()
                    .user_agent(concat!("PawsClaws/", env!("CARGO_PKG_VERSION")))
                    .build()?;
                Ok(Self {
                    identity: Arc::new(SupabaseIdentity::new(client.clone(), supabase)),
                    orders: Arc::new(PostgrestOrderStore::new(client, supabase)?),
                    payments,
                })
            }
            BackendConfig::Unconfigured { .. } => Ok(Self {
                identity: Arc::new(NotConfiguredIdentity),
                orders: Arc::new(NotConfiguredStore),
                payments,
            }),
        }
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// catalog, configuration and external services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    services: Services,
    session_feed: SessionFeed,
}

impl AppState {
    /// Create application state with the service clients `config` describes.
    ///
    /// # Errors
    ///
    /// Returns an error if a service client cannot be built.
    pub fn new(config: StorefrontConfig, catalog: Catalog) -> Result<Self, StateError> {
        let services = Services::from_config(&config)?;
        Ok(Self::with_services(config, catalog, services))
    }

    /// Create application state around already-built services.
    #[must_use]
    pub fn with_services(config: StorefrontConfig, catalog: Catalog, services: Services) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                services,
                session_feed: SessionFeed::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.services.identity.as_ref()
    }

    #[must_use]
    pub fn orders(&self) -> &dyn OrderStore {
        self.inner.services.orders.as_ref()
    }

    #[must_use]
    pub fn payments(&self) -> &dyn PaymentGateway {
        self.inner.services.payments.as_ref()
    }

    /// Get the session-change feed.
    #[must_use]
    pub fn session_feed(&self) -> &SessionFeed {
        &self.inner.session_feed
    }
}
