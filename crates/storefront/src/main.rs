//! Paws & Claws storefront binary.
//!
//! Serves the public pet-supplies shop: catalog, session cart, checkout, card
//! payment page, sign-in and order history.
//!
//! # Architecture
//!
//! - Axum web framework with Askama server-side templates
//! - Cart and mirrored identity kept in the visitor's session
//! - Identity and orders delegated to a hosted auth + REST backend
//! - Card confirmation through a simulated payment gateway

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;

use paws_claws_storefront::config::{BackendConfig, SentryConfig, StorefrontConfig};
use paws_claws_storefront::error::add_breadcrumb;
use paws_claws_storefront::session::SessionFeed;
use paws_claws_storefront::state::AppState;
use paws_claws_storefront::{app, catalog};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &SentryConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config.environment.clone().map(std::borrow::Cow::Owned),
            sample_rate: config.sample_rate,
            traces_sample_rate: config.traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Log every session change for the lifetime of the process.
fn spawn_session_logger(feed: &SessionFeed) {
    let mut subscription = feed.subscribe();
    tokio::spawn(async move {
        while let Some(event) = subscription.next().await {
            let user = event.user();
            tracing::info!(event = event.kind(), user_id = %user.id, "Session changed");
            add_breadcrumb("auth", event.kind(), Some(&[("user_id", user.id.as_str())]));
        }
    });
}

#[tokio::main]
async fn main() {
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config.sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "paws_claws_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let BackendConfig::Unconfigured { reason } = &config.backend {
        tracing::warn!(%reason, "Backend not configured; sign-in and order history are disabled");
    }

    let catalog = catalog::load().expect("Failed to load product catalog");
    tracing::info!(products = catalog.len(), "Catalog loaded");

    let state =
        AppState::new(config.clone(), catalog).expect("Failed to initialize application state");
    spawn_session_logger(state.session_feed());

    let app = app(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    // Connect info feeds the rate limiter's fallback key
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
