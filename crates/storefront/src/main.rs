//! Canvas Gallery API server.
//!
//! JSON API for browsing oil paintings, keeping a cart and wishlist, and
//! placing cash-on-delivery orders.
//!
//! # Architecture
//!
//! - Axum web framework, JSON in and out
//! - `PostgreSQL` via sqlx for gallery data and sessions
//! - Argon2id password accounts in tower-sessions cookies
//! - Order confirmations over SMTP (or logged when SMTP is not configured)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;
use tower_sessions_sqlx_store::PostgresStore;

use canvas_gallery_storefront::config::StorefrontConfig;
use canvas_gallery_storefront::db::{self, PgStore, Store};
use canvas_gallery_storefront::middleware::create_session_layer;
use canvas_gallery_storefront::routes;
use canvas_gallery_storefront::services::notify::{EmailNotifier, LogNotifier, Notifier};
use canvas_gallery_storefront::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            traces_sample_rate: config.sentry_traces_sample_rate,
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

/// CORS for the configured browser origin, if any.
fn cors_layer(config: &StorefrontConfig) -> Option<CorsLayer> {
    let origin = config.cors_origin.as_deref()?;
    let origin = match origin.parse::<HeaderValue>() {
        Ok(origin) => origin,
        Err(error) => {
            tracing::warn!(origin, error = %error, "Ignoring invalid GALLERY_CORS_ORIGIN");
            return None;
        }
    };
    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE]),
    )
}

fn build_notifier(config: &StorefrontConfig) -> Arc<dyn Notifier> {
    match &config.email {
        Some(email) => {
            let notifier = EmailNotifier::new(email).expect("Failed to configure SMTP transport");
            tracing::info!(smtp_host = %email.smtp_host, "Order confirmations sent by email");
            Arc::new(notifier)
        }
        None => {
            tracing::info!("SMTP not configured, order confirmations will be logged");
            Arc::new(LogNotifier)
        }
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "canvas_gallery_storefront=info,tower_http=debug".into());

    let json_layer = config
        .log_json
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!config.log_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    // Initialize database connection pool
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // NOTE: Gallery migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p canvas-gallery-cli -- migrate
    let session_store = PostgresStore::new(pool.clone());
    session_store
        .migrate()
        .await
        .expect("Failed to prepare session store");

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
    let notifier = build_notifier(&config);
    let state = AppState::new(config.clone(), store, notifier);

    let session_layer = create_session_layer(session_store, &config);

    let mut app = routes::app(state, session_layer);
    if let Some(cors) = cors_layer(&config) {
        app = app.layer(cors);
    }
    // Sentry layers (outermost for full request coverage)
    let app = app
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    // Start server
    let addr = config.socket_addr();
    tracing::info!("Canvas Gallery API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
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
