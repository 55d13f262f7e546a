//! HTTP middleware and extractors for admin.
//!
//! # Layers (outermost first)
//!
//! 1. Sentry (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Security headers
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Route handlers opt into authentication with the extractors in [`auth`].

pub mod auth;
pub mod headers;
pub mod session;

pub use auth::{
    AccessRejection, OptionalAdmin, RequireAdmin, RequirePage, clear_current_admin,
    set_current_admin,
};
pub use headers::security_headers;
pub use session::create_session_layer;
