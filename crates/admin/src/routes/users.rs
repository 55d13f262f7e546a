//! Admin user management.
//!
//! Any change is re-authorized against the actor's *stored* profile, not the
//! session copy, so a demotion or deactivation takes effect immediately.
//! An actor may only touch admins ranked strictly below them, and may only
//! hand out roles from `assignable_roles`.

use std::str::FromStr;

use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use agency_core::{AdminRole, AdminUserId, can_assign, can_manage};

use crate::db::AdminUserRepository;
use crate::error::AppError;
use crate::middleware::RequirePage;
use crate::models::AdminUserProfile;
use crate::state::AppState;
use crate::views::{self, AdminView, UserRow, UsersTemplate};

/// Build the admin users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(index))
        .route("/admin/users/{id}/role", post(update_role))
        .route("/admin/users/{id}/active", post(update_active))
}

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    notice: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoleForm {
    role: String,
}

#[derive(Debug, Deserialize)]
pub struct ActiveForm {
    active: bool,
}

/// Known notice codes. Anything else shows nothing.
fn notice_text(code: &str) -> Option<&'static str> {
    match code {
        "role_updated" => Some("Role updated."),
        "status_updated" => Some("Account status updated."),
        _ => None,
    }
}

/// A requested change to another admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Role(AdminRole),
    Active(bool),
}

/// Check that `actor` may apply `change` to `target`.
///
/// # Errors
///
/// Returns `AppError::Forbidden` if the actor is inactive, is the target,
/// does not outrank the target, or is granting a role they may not assign.
pub fn authorize_change(
    actor: &AdminUserProfile,
    target: &AdminUserProfile,
    change: Change,
) -> Result<(), AppError> {
    if !actor.is_active {
        return Err(AppError::Forbidden("your account is deactivated".to_string()));
    }
    if actor.id == target.id {
        return Err(AppError::Forbidden(
            "you cannot change your own account".to_string(),
        ));
    }
    if !can_manage(actor.role, target.role) {
        return Err(AppError::Forbidden(format!(
            "you cannot change a {} account",
            target.role_label()
        )));
    }
    if let Change::Role(role) = change
        && !can_assign(actor.role, target.role, role)
    {
        return Err(AppError::Forbidden(format!("you cannot grant the {role} role")));
    }
    Ok(())
}

/// Load the acting admin and the target, then authorize `change`.
async fn load_and_authorize(
    repo: &AdminUserRepository<'_>,
    actor_id: AdminUserId,
    target_id: AdminUserId,
    change: Change,
) -> Result<(AdminUserProfile, AdminUserProfile), AppError> {
    let actor = repo
        .get_by_id(actor_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("admin profile no longer exists".to_string()))?;
    let target = repo
        .get_by_id(target_id)
        .await?
        .ok_or_else(|| AppError::NotFound("admin user".to_string()))?;

    if let Err(e) = authorize_change(&actor, &target, change) {
        tracing::warn!(
            actor = %actor.email,
            target = %target.email,
            ?change,
            "admin user change denied"
        );
        return Err(e);
    }
    Ok((actor, target))
}

/// Admin users list.
///
/// GET /admin/users
#[instrument(skip_all, fields(admin = %guard.admin.email))]
pub async fn index(
    guard: RequirePage,
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> Result<Html<String>, AppError> {
    let profiles = AdminUserRepository::new(state.pool()).list_all().await?;
    let users = profiles
        .iter()
        .map(|profile| UserRow::new(profile, guard.admin.role))
        .collect();

    Ok(views::render(&UsersTemplate {
        admin: AdminView::from(&guard.admin),
        nav: views::nav_links(guard.admin.role, "/admin/users"),
        users,
        notice: query
            .notice
            .as_deref()
            .and_then(notice_text)
            .map(str::to_string),
    }))
}

/// Change a lower-ranked admin's role.
///
/// POST /admin/users/{id}/role
#[instrument(skip_all, fields(admin = %guard.admin.email, target = %id))]
pub async fn update_role(
    guard: RequirePage,
    State(state): State<AppState>,
    Path(id): Path<AdminUserId>,
    Form(form): Form<RoleForm>,
) -> Result<Redirect, AppError> {
    let role = AdminRole::from_str(&form.role).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let repo = AdminUserRepository::new(state.pool());
    let (actor, target) = load_and_authorize(&repo, guard.admin.id, id, Change::Role(role)).await?;

    let updated = repo.update_role(target.id, role).await?;
    tracing::info!(
        actor = %actor.email,
        target = %updated.email,
        from = target.role_label(),
        to = role.as_str(),
        "admin role changed"
    );
    Ok(Redirect::to("/admin/users?notice=role_updated"))
}

/// Activate or deactivate a lower-ranked admin.
///
/// POST /admin/users/{id}/active
#[instrument(skip_all, fields(admin = %guard.admin.email, target = %id))]
pub async fn update_active(
    guard: RequirePage,
    State(state): State<AppState>,
    Path(id): Path<AdminUserId>,
    Form(form): Form<ActiveForm>,
) -> Result<Redirect, AppError> {
    let repo = AdminUserRepository::new(state.pool());
    let (actor, target) =
        load_and_authorize(&repo, guard.admin.id, id, Change::Active(form.active)).await?;

    let updated = repo.set_active(target.id, form.active).await?;
    tracing::info!(
        actor = %actor.email,
        target = %updated.email,
        active = updated.is_active,
        "admin status changed"
    );
    Ok(Redirect::to("/admin/users?notice=status_updated"))
}
