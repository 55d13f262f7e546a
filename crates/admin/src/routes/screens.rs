//! Role-gated admin screens.

use axum::{Router, extract::OriginalUri, response::Html, routing::get};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequirePage;
use crate::state::AppState;
use crate::views;

/// Build the screen router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(screen))
        .route("/admin/{*path}", get(screen))
}

/// Render the screen a permitted path belongs to.
///
/// Paths under `/admin` that map to no page are 404s.
#[instrument(skip_all, fields(path = %uri.path(), admin = %guard.admin.email))]
async fn screen(guard: RequirePage, OriginalUri(uri): OriginalUri) -> Result<Html<String>, AppError> {
    let page = guard
        .page
        .ok_or_else(|| AppError::NotFound(uri.path().to_string()))?;
    Ok(views::screen(&guard.admin, page, uri.path()))
}
