//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness
//! GET  /health/ready                - Readiness (database ping)
//!
//! # Auth
//! GET  /auth/login                  - Sign-in form
//! POST /auth/login                  - Password sign-in, resolves the admin profile
//! POST /auth/logout                 - Sign out and clear the session
//!
//! # Admin shell (role-gated by path)
//! GET  /admin                       - Dashboard
//! GET  /admin/{*path}               - Blog, SEO, Media, Transcripts, Settings, Help
//!
//! # Admin users
//! GET  /admin/users                 - List admin users
//! POST /admin/users/{id}/role       - Change a lower-ranked admin's role
//! POST /admin/users/{id}/active     - Activate or deactivate a lower-ranked admin
//! ```

pub mod auth;
pub mod screens;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(screens::router())
}
