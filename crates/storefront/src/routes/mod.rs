//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Store reachable
//!
//! # Auth
//! POST /api/auth/register               - Create account and sign in
//! POST /api/auth/login                  - Sign in
//! POST /api/auth/logout                 - Sign out
//! GET  /api/auth/me                     - Signed-in user
//!
//! # Account (requires auth)
//! GET    /api/users/profile             - User with saved addresses
//! PUT    /api/users/profile             - Change name and phone
//! POST   /api/users/password            - Change password
//! GET    /api/users/addresses           - Saved addresses
//! POST   /api/users/addresses           - Save an address
//! PUT    /api/users/addresses/{id}      - Edit a saved address
//! DELETE /api/users/addresses/{id}      - Delete a saved address
//! PUT    /api/users/addresses/{id}/default - Make it the default
//!
//! # Catalogue
//! GET  /api/paintings                   - Filtered, sorted, paged listing
//! GET  /api/paintings/{id}              - Painting detail (counts a view)
//!
//! # Cart (requires auth)
//! GET    /api/cart                      - Cart with totals
//! DELETE /api/cart                      - Empty the cart
//! POST   /api/cart/add                  - Add a painting
//! PUT    /api/cart/items/{id}           - Change quantity
//! DELETE /api/cart/items/{id}           - Remove a line
//!
//! # Wishlist (requires auth)
//! GET    /api/wishlist                  - Saved paintings
//! DELETE /api/wishlist                  - Remove everything
//! POST   /api/wishlist/add              - Save a painting
//! DELETE /api/wishlist/items/{id}       - Remove one
//! GET    /api/wishlist/check/{painting} - Whether a painting is saved
//! GET    /api/wishlist/count            - Number of saved paintings
//!
//! # Orders (requires auth)
//! POST /api/orders                      - Checkout
//! GET  /api/orders                      - Own orders, newest first
//! GET  /api/orders/{id}                 - Own order
//! POST /api/orders/{id}/cancel          - Cancel own order
//!
//! # Admin (requires ADMIN role)
//! GET    /api/admin/dashboard/stats
//! GET    /api/admin/orders
//! PUT    /api/admin/orders/{id}/status
//! GET    /api/admin/paintings
//! POST   /api/admin/paintings
//! PUT    /api/admin/paintings/{id}
//! DELETE /api/admin/paintings/{id}
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod paintings;
pub mod users;
pub mod wishlist;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the account routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(users::profile).put(users::update_profile))
        .route("/password", post(users::change_password))
        .route("/addresses", get(users::addresses).post(users::add_address))
        .route(
            "/addresses/{id}",
            put(users::update_address).delete(users::delete_address),
        )
        .route("/addresses/{id}/default", put(users::set_default_address))
}

/// Create the catalogue routes router.
pub fn painting_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(paintings::index))
        .route("/{id}", get(paintings::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/add", post(cart::add))
        .route("/items/{id}", put(cart::update).delete(cart::remove))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show).delete(wishlist::clear))
        .route("/add", post(wishlist::add))
        .route("/items/{id}", delete(wishlist::remove))
        .route("/check/{painting_id}", get(wishlist::check))
        .route("/count", get(wishlist::count))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create).get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", post(orders::cancel))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(admin::dashboard_stats))
        .route("/orders", get(admin::orders))
        .route("/orders/{id}/status", put(admin::update_order_status))
        .route(
            "/paintings",
            get(admin::paintings).post(admin::create_painting),
        )
        .route(
            "/paintings/{id}",
            put(admin::update_painting).delete(admin::delete_painting),
        )
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/auth", auth_routes())
        .nest("/api/users", user_routes())
        .nest("/api/paintings", painting_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/wishlist", wishlist_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/admin", admin_routes())
}

/// The full application: routes, sessions, request ids and tracing.
///
/// Sentry and CORS layers are added by the binary.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    routes()
        .layer(session_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
