//! Admin profile repository.
//!
//! Roles are read back as text and parsed leniently, so a row holding a
//! role this build does not know still loads (with `role: None`) instead of
//! failing the whole query.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use agency_core::{AdminRole, AdminUserId, Email};

use super::RepositoryError;
use crate::identity::{DirectoryError, ProfileDirectory};
use crate::models::AdminUserProfile;

const PROFILE_COLUMNS: &str =
    "id, email, name, role::text AS role, is_active, last_login, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct AdminUserRow {
    id: AdminUserId,
    email: String,
    name: String,
    role: Option<String>,
    is_active: bool,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AdminUserRow> for AdminUserProfile {
    type Error = RepositoryError;

    fn try_from(row: AdminUserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        let role = row.role.as_deref().and_then(AdminRole::parse_lenient);
        if role.is_none() {
            tracing::warn!(%email, raw_role = ?row.role, "admin user has an unrecognised role");
        }

        Ok(Self {
            id: row.id,
            email,
            name: row.name,
            role,
            is_active: row.is_active,
            last_login: row.last_login,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn map_unique_violation(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for admin user database operations.
pub struct AdminUserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminUserRepository<'a> {
    /// Create a new admin user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all admin users, highest role first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_all(&self) -> Result<Vec<AdminUserProfile>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminUserRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM admin.admin_user ORDER BY role ASC, email ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get an admin user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(
        &self,
        id: AdminUserId,
    ) -> Result<Option<AdminUserProfile>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM admin.admin_user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an admin user by email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<AdminUserProfile>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM admin.admin_user WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a new, active admin user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        name: &str,
        role: AdminRole,
    ) -> Result<AdminUserProfile, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "INSERT INTO admin.admin_user (id, email, name, role) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(AdminUserId::random())
        .bind(email.as_str())
        .bind(name)
        .bind(role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "email already exists"))?;

        row.try_into()
    }

    /// Change an admin user's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_role(
        &self,
        id: AdminUserId,
        role: AdminRole,
    ) -> Result<AdminUserProfile, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "UPDATE admin.admin_user SET role = $1, updated_at = NOW() \
             WHERE id = $2 \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(role)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Activate or deactivate an admin user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_active(
        &self,
        id: AdminUserId,
        is_active: bool,
    ) -> Result<AdminUserProfile, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "UPDATE admin.admin_user SET is_active = $1, updated_at = NOW() \
             WHERE id = $2 \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(is_active)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Record a successful sign-in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn stamp_last_login(&self, email: &Email) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE admin.admin_user SET last_login = NOW(), updated_at = NOW() WHERE email = $1",
        )
        .bind(email.as_str())
        .execute(self.pool)
        .await?;
        Ok(())
    }
}

/// [`ProfileDirectory`] over the `admin.admin_user` table.
#[derive(Clone)]
pub struct PgProfileDirectory {
    pool: PgPool,
}

impl PgProfileDirectory {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileDirectory for PgProfileDirectory {
    async fn profile_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<AdminUserProfile>, DirectoryError> {
        Ok(AdminUserRepository::new(&self.pool).get_by_email(email).await?)
    }

    async fn stamp_last_login(&self, email: &Email) -> Result<(), DirectoryError> {
        Ok(AdminUserRepository::new(&self.pool)
            .stamp_last_login(email)
            .await?)
    }
}
