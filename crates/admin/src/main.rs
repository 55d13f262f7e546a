//! Agency Admin - role-gated administration panel.
//!
//! This binary serves the admin shell on port 3001.
//!
//! # Architecture
//!
//! - Axum web framework
//! - Askama templates for server-side rendering
//! - Hosted identity service for email/password sign-in
//! - `PostgreSQL` for admin profiles and sessions

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::time::Duration;

use axum::{Router, ServiceExt, extract::Request};
use sqlx::PgPool;
use sentry::integrations::tracing as sentry_tracing;
use tower::Layer as _;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agency_admin::config::AdminConfig;
use agency_admin::middleware::{create_session_layer, security_headers};
use agency_admin::state::AppState;
use agency_admin::{db, health_routes, routes};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &AdminConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            send_default_pii: true,
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

/// Structured logs: JSON when deployed on Fly, text locally. Warnings and
/// errors also become Sentry events.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "agency_admin=info,tower_http=debug".into());

    let deployed = std::env::var("FLY_APP_NAME").is_ok();
    let json_layer =
        deployed.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!deployed).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

/// Session-backed admin routes, health checks and static assets, with the
/// outer trace and Sentry layers applied.
fn build_app(state: AppState, pool: &PgPool) -> Router {
    let session_layer = create_session_layer(pool, state.config());

    let app = Router::new()
        .merge(routes::routes())
        .layer(session_layer)
        .merge(health_routes())
        .nest_service("/static", ServeDir::new("crates/admin/static"));

    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request| {
            tracing::info_span!(
                "admin_request",
                method = %request.method(),
                path = %request.uri().path(),
                status = tracing::field::Empty,
                latency_ms = tracing::field::Empty,
            )
        })
        .on_response(
            |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                span.record("status", response.status().as_u16());
                #[allow(clippy::cast_possible_truncation)]
                span.record("latency_ms", latency.as_millis() as u64);
                DefaultOnResponse::default().on_response(response, latency, span);
            },
        );

    security_headers(app)
        .layer(trace)
        .with_state(state)
        // Outermost, so every request is covered
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[tokio::main]
async fn main() {
    // Sentry must be up before the tracing layer that feeds it
    let config = AdminConfig::from_env().expect("Failed to load configuration");
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // Schema changes go through `agency-cli migrate`, never on start-up.

    let addr = config.socket_addr();
    let state = AppState::new(config, pool.clone()).expect("Failed to create application state");

    // `/admin/blog/` and `/admin/blog` reach the same handler
    let app = NormalizePathLayer::trim_trailing_slash().layer(build_app(state, &pool));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "admin listening");

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
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
