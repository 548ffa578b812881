//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (`x-request-id` in span, Sentry scope and response)
//! 4. CORS (only when `GALLERY_CORS_ORIGIN` is set)
//! 5. Session layer (tower-sessions)
//!
//! Authentication is enforced per handler by the [`RequireAuth`] and
//! [`RequireAdmin`] extractors.

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{AuthRejection, RequireAdmin, RequireAuth, clear_current_user, set_current_user};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
