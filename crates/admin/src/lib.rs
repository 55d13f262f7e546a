//! Agency Admin library.
//!
//! Role-based access to the agency admin panel:
//!
//! - [`gate`] - the session gate: identity session → admin profile →
//!   [`gate::AuthState`], re-resolved on every auth change
//! - [`navigation`] - sidebar entries filtered by role
//! - [`identity`] - identity provider and profile directory collaborators
//! - [`routes`] / [`middleware`] - the server-rendered admin shell
//!
//! Page permissions themselves live in `agency_core::permissions`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod gate;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod navigation;
pub mod routes;
pub mod state;
pub mod views;

use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::state::AppState;

/// Health endpoints, mounted outside the session layer.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
