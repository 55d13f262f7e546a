//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::identity::{GoTrueClient, IdentityError, ProfileDirectory};
use crate::db::PgProfileDirectory;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    identity: GoTrueClient,
    directory: Arc<dyn ProfileDirectory>,
}

impl AppState {
    /// Build state backed by `PostgreSQL` and the configured identity service.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError` if the identity HTTP client cannot be built.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, IdentityError> {
        let identity = GoTrueClient::new(&config.identity)?;
        let directory = Arc::new(PgProfileDirectory::new(pool.clone()));
        Ok(Self::with_directory(config, pool, identity, directory))
    }

    /// Build state with an explicit profile directory.
    #[must_use]
    pub fn with_directory(
        config: AdminConfig,
        pool: PgPool,
        identity: GoTrueClient,
        directory: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                identity,
                directory,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Identity service client used by the sign-in form.
    #[must_use]
    pub fn identity(&self) -> &GoTrueClient {
        &self.inner.identity
    }

    /// Admin profile lookups.
    #[must_use]
    pub fn directory(&self) -> &dyn ProfileDirectory {
        self.inner.directory.as_ref()
    }
}
