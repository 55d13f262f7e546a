//! Admin user management commands.
//!
//! These bypass the role-assignment rules of the admin shell; they are the
//! bootstrap path for the first super admin and for recovery.
//!
//! ```bash
//! agency-cli admin create -e owner@agency.studio -n "Owner" -r super_admin
//! agency-cli admin set-role -e writer@agency.studio -r editor
//! agency-cli admin deactivate -e writer@agency.studio
//! agency-cli admin list
//! ```

use agency_admin::db::{AdminUserRepository, RepositoryError};
use agency_core::{AdminRole, Email, EmailError};
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid role: {0}. Valid roles: super_admin, admin, editor, viewer")]
    InvalidRole(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Admin user already exists with email: {0}")]
    UserExists(String),

    #[error("No admin user with email: {0}")]
    UserNotFound(String),
}

fn parse_role(role: &str) -> Result<AdminRole, AdminError> {
    role.parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))
}

/// Create a new admin user.
///
/// # Errors
///
/// Returns `AdminError` for an invalid email or role, an existing user, or a
/// database failure.
pub async fn create_user(email: &str, name: &str, role: &str) -> Result<(), AdminError> {
    let role = parse_role(role)?;
    let email = Email::parse(email)?;

    let pool = connect().await?;
    tracing::info!("Creating admin user: {} ({})", email, role);

    let user = AdminUserRepository::new(&pool)
        .create(&email, name, role)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        role
    );
    tracing::info!("They sign in with their identity-service password at /auth/login.");
    Ok(())
}

/// Change an admin user's role.
///
/// # Errors
///
/// Returns `AdminError` for an invalid email or role, a missing user, or a
/// database failure.
pub async fn set_role(email: &str, role: &str) -> Result<(), AdminError> {
    let role = parse_role(role)?;
    let email = Email::parse(email)?;

    let pool = connect().await?;
    let repo = AdminUserRepository::new(&pool);
    let user = repo
        .get_by_email(&email)
        .await?
        .ok_or_else(|| AdminError::UserNotFound(email.to_string()))?;

    let updated = repo.update_role(user.id, role).await?;
    tracing::info!(
        "Role for {} changed from {} to {}",
        updated.email,
        user.role_label(),
        role
    );
    Ok(())
}

/// Deactivate an admin user. Their next resolution fails with "deactivated".
///
/// # Errors
///
/// Returns `AdminError` for an invalid email, a missing user, or a database
/// failure.
pub async fn deactivate(email: &str) -> Result<(), AdminError> {
    let email = Email::parse(email)?;

    let pool = connect().await?;
    let repo = AdminUserRepository::new(&pool);
    let user = repo
        .get_by_email(&email)
        .await?
        .ok_or_else(|| AdminError::UserNotFound(email.to_string()))?;

    if !user.is_active {
        tracing::info!("{} is already deactivated", user.email);
        return Ok(());
    }

    repo.set_active(user.id, false).await?;
    tracing::info!("Deactivated {}", user.email);
    Ok(())
}

/// List admin users, highest role first.
///
/// # Errors
///
/// Returns `AdminError` if the database is unreachable.
#[allow(clippy::print_stdout)]
pub async fn list() -> Result<(), AdminError> {
    let pool = connect().await?;
    let users = AdminUserRepository::new(&pool).list_all().await?;

    for user in &users {
        println!(
            "{:<36}  {:<32}  {:<12}  {}",
            user.id,
            user.email,
            user.role_label(),
            if user.is_active { "active" } else { "deactivated" }
        );
    }
    tracing::info!("{} admin user(s)", users.len());
    Ok(())
}
