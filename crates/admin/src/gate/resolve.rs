//! One resolution pass: session → profile → auth state.

use std::time::Duration;

use agency_core::Email;

use crate::identity::ProfileDirectory;
use crate::models::{AdminUserProfile, IdentitySession};

use super::state::{AuthFailure, AuthState};

/// Upper bound on the last-login stamp when it is awaited inline.
pub const STAMP_TIMEOUT: Duration = Duration::from_secs(2);

/// Look up the stored profile for `email` and check it may use the panel.
///
/// # Errors
///
/// Returns `NotRegistered` for a missing profile, `Deactivated` for a
/// disabled one and `Backend` when the directory fails.
pub async fn lookup_admin(
    email: &Email,
    directory: &dyn ProfileDirectory,
) -> Result<AdminUserProfile, AuthFailure> {
    let profile = match directory.profile_by_email(email).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            tracing::warn!(%email, "signed-in identity has no admin profile");
            return Err(AuthFailure::NotRegistered);
        }
        Err(e) => {
            tracing::error!(%email, error = %e, "admin profile lookup failed");
            return Err(AuthFailure::Backend(e.to_string()));
        }
    };

    if !profile.is_active {
        tracing::warn!(email = %profile.email, "deactivated admin attempted access");
        return Err(AuthFailure::Deactivated);
    }
    Ok(profile)
}

/// Resolve an identity session into an [`AuthState`] without stamping.
///
/// - no session: `Unauthenticated`, without touching the directory
/// - no profile for the session email: `Error(NotRegistered)`
/// - inactive profile: `Error(Deactivated)`
/// - directory failure: `Error(Backend)`
/// - otherwise `Authenticated`
pub async fn resolve_profile(
    session: Option<&IdentitySession>,
    directory: &dyn ProfileDirectory,
) -> AuthState {
    let Some(session) = session else {
        tracing::debug!("no identity session");
        return AuthState::Unauthenticated;
    };

    match lookup_admin(&session.email, directory).await {
        Ok(profile) => {
            tracing::info!(
                email = %profile.email,
                role = profile.role_label(),
                "admin session resolved"
            );
            AuthState::Authenticated(profile)
        }
        Err(failure) => AuthState::Error(failure),
    }
}

/// Record a sign-in. Failures and slow stores are logged, never returned.
pub async fn stamp_login(directory: &dyn ProfileDirectory, email: &Email) {
    match tokio::time::timeout(STAMP_TIMEOUT, directory.stamp_last_login(email)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(%email, error = %e, "failed to stamp last login"),
        Err(_) => tracing::warn!(%email, timeout = ?STAMP_TIMEOUT, "last login stamp timed out"),
    }
}

/// [`resolve_profile`], then a bounded best-effort `last_login` stamp.
pub async fn resolve(
    session: Option<&IdentitySession>,
    directory: &dyn ProfileDirectory,
) -> AuthState {
    let state = resolve_profile(session, directory).await;
    if let AuthState::Authenticated(profile) = &state {
        stamp_login(directory, &profile.email).await;
    }
    state
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use secrecy::SecretString;

    use agency_core::{AdminRole, Email, IdentityUserId};

    use super::*;
    use crate::identity::memory::MemoryDirectory;
    use crate::models::AdminUserProfile;

    fn email() -> Email {
        Email::parse("writer@agency.studio").unwrap()
    }

    fn session() -> IdentitySession {
        IdentitySession {
            user_id: IdentityUserId::random(),
            email: email(),
            access_token: SecretString::from("at"),
            refresh_token: None,
            expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
        }
    }

    #[tokio::test]
    async fn test_no_session_skips_lookup() {
        let directory = MemoryDirectory::new();
        let state = resolve(None, &directory).await;
        assert_eq!(state, AuthState::Unauthenticated);
        assert_eq!(directory.lookups(), 0);
    }

    #[tokio::test]
    async fn test_missing_profile() {
        let directory = MemoryDirectory::new();
        let state = resolve(Some(&session()), &directory).await;
        assert_eq!(state, AuthState::Error(AuthFailure::NotRegistered));
    }

    #[tokio::test]
    async fn test_inactive_profile_is_not_stamped() {
        let directory = MemoryDirectory::new();
        let mut profile = AdminUserProfile::new(email(), "Wren", AdminRole::Editor);
        profile.is_active = false;
        directory.upsert(profile).await;

        let state = resolve(Some(&session()), &directory).await;
        assert_eq!(state, AuthState::Error(AuthFailure::Deactivated));
        assert!(directory.get(&email()).await.unwrap().last_login.is_none());
    }

    #[tokio::test]
    async fn test_active_profile_is_authenticated_and_stamped() {
        let directory = MemoryDirectory::new();
        directory
            .upsert(AdminUserProfile::new(email(), "Wren", AdminRole::Editor))
            .await;

        let state = resolve(Some(&session()), &directory).await;
        assert_eq!(state.profile().unwrap().role, Some(AdminRole::Editor));
        assert!(directory.get(&email()).await.unwrap().last_login.is_some());
    }

    #[tokio::test]
    async fn test_stamp_failure_still_authenticates() {
        let directory = MemoryDirectory::new();
        directory
            .upsert(AdminUserProfile::new(email(), "Wren", AdminRole::Viewer))
            .await;
        directory.set_fail_stamps(true);

        let state = resolve(Some(&session()), &directory).await;
        assert!(matches!(state, AuthState::Authenticated(_)));
    }

    #[tokio::test]
    async fn test_directory_failure_is_backend_error() {
        let directory = MemoryDirectory::new();
        directory.set_fail_lookups(true);

        let state = resolve(Some(&session()), &directory).await;
        assert!(matches!(state, AuthState::Error(AuthFailure::Backend(_))));
    }

    #[tokio::test]
    async fn test_resolve_profile_never_stamps() {
        let directory = MemoryDirectory::new();
        directory
            .upsert(AdminUserProfile::new(email(), "Wren", AdminRole::Editor))
            .await;

        let state = resolve_profile(Some(&session()), &directory).await;
        assert!(matches!(state, AuthState::Authenticated(_)));
        assert!(directory.get(&email()).await.unwrap().last_login.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_stamp_is_cut_off() {
        let directory = MemoryDirectory::new();
        directory
            .upsert(AdminUserProfile::new(email(), "Wren", AdminRole::Editor))
            .await;
        directory.set_stamp_delay(Duration::from_secs(3600)).await;

        let started = tokio::time::Instant::now();
        let state = resolve(Some(&session()), &directory).await;
        assert!(matches!(state, AuthState::Authenticated(_)));
        assert!(started.elapsed() <= STAMP_TIMEOUT + Duration::from_millis(10));
    }
}
