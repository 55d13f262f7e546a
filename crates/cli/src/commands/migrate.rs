//! Database migration command.
//!
//! ```bash
//! agency-cli migrate
//! ```
//!
//! Migrations live in `crates/admin/migrations/` and are embedded in the
//! admin crate.

use thiserror::Error;

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run admin database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration fails.
pub async fn admin() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running admin migrations...");
    agency_admin::db::MIGRATOR.run(&pool).await?;

    tracing::info!("Admin migrations complete!");
    Ok(())
}
