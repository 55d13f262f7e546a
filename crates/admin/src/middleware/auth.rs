//! Authentication extractors for admin.
//!
//! The sign-in handler stores a [`CurrentAdmin`] in the session after the
//! profile resolved. [`RequireAdmin`] and [`RequirePage`] read it back and
//! re-check the stored profile on every request, so a deactivation or role
//! change applies on the next page load. [`RequirePage`] then applies the
//! page permission table.

use axum::{
    extract::{FromRef, FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use agency_core::AdminPage;

use crate::gate::{AuthFailure, PageAccess, lookup_admin, page_access};
use crate::identity::ProfileDirectory;
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;
use crate::views::{self, LoginTemplate};

/// Extractor that requires a signed-in, still-active admin.
///
/// ```rust,ignore
/// async fn handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Extractor that optionally gets the admin stored in the session.
///
/// Does not consult the profile directory.
pub struct OptionalAdmin(pub Option<CurrentAdmin>);

/// Extractor that requires a signed-in admin allowed to view the request path.
///
/// `page` is `None` for paths that belong to no gated page.
pub struct RequirePage {
    pub admin: CurrentAdmin,
    pub page: Option<AdminPage>,
}

/// Why an admin extractor rejected the request.
#[derive(Debug)]
pub enum AccessRejection {
    /// No admin in the session.
    RedirectToLogin,
    /// The session layer is missing.
    Unauthorized,
    /// The stored profile no longer allows access, or could not be read.
    Revoked { email: String, failure: AuthFailure },
    /// Signed in, but the role may not view `page`.
    Restricted { admin: CurrentAdmin, page: AdminPage },
}

impl IntoResponse for AccessRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Revoked { email, failure } => {
                let status = match failure {
                    AuthFailure::Backend(_) | AuthFailure::TimedOut => {
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                    AuthFailure::NotRegistered | AuthFailure::Deactivated => {
                        StatusCode::UNAUTHORIZED
                    }
                };
                let page = views::render(&LoginTemplate {
                    email,
                    error: Some(failure.to_string()),
                });
                (status, page).into_response()
            }
            Self::Restricted { admin, page } => {
                tracing::info!(
                    admin = %admin.email,
                    page = page.as_str(),
                    "restricted page requested"
                );
                (StatusCode::FORBIDDEN, views::restricted(&admin, page)).into_response()
            }
        }
    }
}

/// Path as the client sent it, before any router nesting stripped a prefix.
fn request_path(parts: &Parts) -> &str {
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or_else(|| parts.uri.path(), |original| original.0.path())
}

fn request_session(parts: &Parts) -> Result<Session, AccessRejection> {
    parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or(AccessRejection::Unauthorized)
}

async fn session_admin(session: &Session) -> Result<CurrentAdmin, AccessRejection> {
    session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
        .ok_or(AccessRejection::RedirectToLogin)
}

/// Re-read the stored profile behind a session admin.
///
/// Returns the admin as currently stored, so role and name changes apply.
///
/// # Errors
///
/// Returns the [`AuthFailure`] when the profile is gone, disabled or
/// unreadable.
pub async fn recheck_admin(
    cached: &CurrentAdmin,
    directory: &dyn ProfileDirectory,
) -> Result<CurrentAdmin, AuthFailure> {
    let profile = lookup_admin(&cached.email, directory).await?;
    Ok(CurrentAdmin::from(&profile))
}

/// Session admin, re-checked against the directory.
///
/// A profile that is gone or disabled ends the session. A changed profile
/// replaces the session copy.
async fn verified_admin(
    session: &Session,
    directory: &dyn ProfileDirectory,
) -> Result<CurrentAdmin, AccessRejection> {
    let cached = session_admin(session).await?;

    let admin = match recheck_admin(&cached, directory).await {
        Ok(admin) => admin,
        Err(failure) => {
            if matches!(failure, AuthFailure::NotRegistered | AuthFailure::Deactivated) {
                tracing::warn!(admin = %cached.email, %failure, "ending session for revoked admin");
                if let Err(e) = clear_current_admin(session).await {
                    tracing::error!(error = %e, "failed to clear revoked admin session");
                }
            }
            return Err(AccessRejection::Revoked {
                email: cached.email.to_string(),
                failure,
            });
        }
    };

    if admin != cached {
        tracing::info!(admin = %admin.email, "stored admin profile changed, updating session");
        if let Err(e) = session.insert(session_keys::CURRENT_ADMIN, &admin).await {
            tracing::warn!(error = %e, "failed to update session admin");
        }
    }
    Ok(admin)
}

/// Apply the permission table for `admin` on `path`.
///
/// # Errors
///
/// Returns `AccessRejection::Restricted` if the role may not view the page.
pub fn check_page(admin: CurrentAdmin, path: &str) -> Result<RequirePage, AccessRejection> {
    match page_access(admin.role, path) {
        PageAccess::Allowed(page) => Ok(RequirePage { admin, page }),
        PageAccess::Restricted(page) => Err(AccessRejection::Restricted { admin, page }),
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AccessRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = request_session(parts)?;
        let state = AppState::from_ref(state);
        verified_admin(&session, state.directory()).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for OptionalAdmin
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Ok(session) = request_session(parts) else {
            return Ok(Self(None));
        };
        Ok(Self(session_admin(&session).await.ok()))
    }
}

impl<S> FromRequestParts<S> for RequirePage
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AccessRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = request_session(parts)?;
        let state = AppState::from_ref(state);
        let admin = verified_admin(&session, state.directory()).await?;
        check_page(admin, request_path(parts))
    }
}

/// Store the resolved admin in the session.
///
/// The session ID is cycled first so a pre-login ID cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Clear the whole admin session (logout).
///
/// # Errors
///
/// Returns an error if the session store cannot be updated.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use agency_core::{AdminRole, AdminUserId, Email};
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::identity::memory::MemoryDirectory;
    use crate::models::AdminUserProfile;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    async fn signed_in(directory: &MemoryDirectory, role: AdminRole) -> (Session, AdminUserProfile) {
        let profile =
            AdminUserProfile::new(Email::parse("sam@agency.studio").unwrap(), "Sam", role);
        directory.upsert(profile.clone()).await;
        let session = session();
        set_current_admin(&session, &CurrentAdmin::from(&profile))
            .await
            .unwrap();
        (session, profile)
    }

    fn admin(role: Option<AdminRole>) -> CurrentAdmin {
        CurrentAdmin {
            id: AdminUserId::random(),
            email: Email::parse("robin@agency.studio").unwrap(),
            name: "Robin".to_string(),
            role,
        }
    }

    #[test]
    fn test_check_page_allows_permitted_page() {
        let guard = check_page(admin(Some(AdminRole::Editor)), "/admin/blog/drafts").unwrap();
        assert_eq!(guard.page, Some(AdminPage::Blog));
    }

    #[test]
    fn test_check_page_restricts_forbidden_page() {
        let err = check_page(admin(Some(AdminRole::Editor)), "/admin/settings").err().unwrap();
        assert!(matches!(
            err,
            AccessRejection::Restricted { page: AdminPage::Settings, .. }
        ));
    }

    #[test]
    fn test_check_page_unknown_role_fails_closed() {
        assert!(check_page(admin(None), "/admin").is_err());
        assert!(check_page(admin(None), "/admin/help").is_err());
    }

    #[test]
    fn test_restricted_rejection_is_forbidden() {
        let response = AccessRejection::Restricted {
            admin: admin(Some(AdminRole::Viewer)),
            page: AdminPage::Users,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = AccessRejection::RedirectToLogin.into_response();
        assert!(response.status().is_redirection());
    }

    #[tokio::test]
    async fn test_active_admin_passes_recheck() {
        let directory = MemoryDirectory::new();
        let (session, profile) = signed_in(&directory, AdminRole::Editor).await;

        let admin = verified_admin(&session, &directory).await.unwrap();
        assert_eq!(admin, CurrentAdmin::from(&profile));
    }

    #[tokio::test]
    async fn test_deactivated_admin_is_rejected_on_next_request() {
        let directory = MemoryDirectory::new();
        let (session, mut profile) = signed_in(&directory, AdminRole::Admin).await;

        profile.is_active = false;
        directory.upsert(profile).await;

        let err = verified_admin(&session, &directory).await.unwrap_err();
        assert!(matches!(
            err,
            AccessRejection::Revoked { failure: AuthFailure::Deactivated, .. }
        ));
        assert!(session_admin(&session).await.is_err(), "session should be flushed");
    }

    #[tokio::test]
    async fn test_removed_profile_is_not_registered() {
        let directory = MemoryDirectory::new();
        let (session, _) = signed_in(&directory, AdminRole::Admin).await;
        let other = MemoryDirectory::new();

        let err = verified_admin(&session, &other).await.unwrap_err();
        assert!(matches!(
            err,
            AccessRejection::Revoked { failure: AuthFailure::NotRegistered, .. }
        ));
    }

    #[tokio::test]
    async fn test_demoted_admin_uses_stored_role() {
        let directory = MemoryDirectory::new();
        let (session, mut profile) = signed_in(&directory, AdminRole::SuperAdmin).await;

        profile.role = Some(AdminRole::Viewer);
        directory.upsert(profile).await;

        let admin = verified_admin(&session, &directory).await.unwrap();
        assert_eq!(admin.role, Some(AdminRole::Viewer));
        assert!(matches!(
            check_page(admin, "/admin/users"),
            Err(AccessRejection::Restricted { page: AdminPage::Users, .. })
        ));

        let stored = session_admin(&session).await.unwrap();
        assert_eq!(stored.role, Some(AdminRole::Viewer));
    }

    #[tokio::test]
    async fn test_directory_outage_keeps_session() {
        let directory = MemoryDirectory::new();
        let (session, _) = signed_in(&directory, AdminRole::Admin).await;
        directory.set_fail_lookups(true);

        let err = verified_admin(&session, &directory).await.unwrap_err();
        assert!(matches!(
            err,
            AccessRejection::Revoked { failure: AuthFailure::Backend(_), .. }
        ));
        assert!(session_admin(&session).await.is_ok());
    }

    #[test]
    fn test_revoked_rejection_status() {
        let revoked = |failure| AccessRejection::Revoked {
            email: "sam@agency.studio".to_string(),
            failure,
        };
        assert_eq!(
            revoked(AuthFailure::Deactivated).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            revoked(AuthFailure::Backend("down".to_string())).into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
