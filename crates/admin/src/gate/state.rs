//! Gate states and decisions.

use thiserror::Error;

use agency_core::{AdminPage, AdminRole, can_access, required_permission};

use crate::models::AdminUserProfile;
use crate::navigation::{NavItem, navigation_for};

/// Why a signed-in user could not be resolved to an admin.
///
/// The `Display` text is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    /// Valid identity session, but no admin profile for its email.
    #[error("This account is not registered as an admin user. Ask a super admin for access.")]
    NotRegistered,

    /// Profile exists but has been disabled.
    #[error("This admin account has been deactivated.")]
    Deactivated,

    /// The identity service or profile directory failed.
    #[error("Could not verify admin access: {0}")]
    Backend(String),

    /// Resolution did not finish within the configured timeout.
    #[error("Timed out while verifying admin access. Sign out and try again.")]
    TimedOut,
}

/// Resolved, renderable outcome of session + profile + permissions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// No resolution has completed yet.
    #[default]
    Loading,
    /// The identity provider reports no session.
    Unauthenticated,
    /// Signed in with an active admin profile.
    Authenticated(AdminUserProfile),
    /// Signed in, but not usable as an admin.
    Error(AuthFailure),
}

impl AuthState {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub const fn profile(&self) -> Option<&AdminUserProfile> {
        match self {
            Self::Authenticated(profile) => Some(profile),
            _ => None,
        }
    }

    /// Short machine-friendly name, used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated(_) => "authenticated",
            Self::Error(_) => "error",
        }
    }

    /// Navigation entries visible in this state.
    #[must_use]
    pub fn navigation(&self) -> Vec<NavItem> {
        self.profile()
            .map(|profile| navigation_for(profile.role))
            .unwrap_or_default()
    }

    /// What to render for a request to `path`.
    ///
    /// Restricted pages do not change the auth state.
    #[must_use]
    pub fn page_decision(&self, path: &str) -> PageDecision {
        match self {
            Self::Loading => PageDecision::Loading,
            Self::Unauthenticated => PageDecision::SignInRequired,
            Self::Error(failure) => PageDecision::Unavailable(failure.clone()),
            Self::Authenticated(profile) => match page_access(profile.role, path) {
                PageAccess::Allowed(page) => PageDecision::Render(page),
                PageAccess::Restricted(page) => PageDecision::Restricted(page),
            },
        }
    }
}

/// Outcome of checking one path for an authenticated role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAccess {
    /// Render. `None` when the path belongs to no gated page.
    Allowed(Option<AdminPage>),
    /// The role may not view this page.
    Restricted(AdminPage),
}

/// Check `path` against the permission table for `role`.
#[must_use]
pub fn page_access(role: Option<AdminRole>, path: &str) -> PageAccess {
    match required_permission(path) {
        None => PageAccess::Allowed(None),
        Some(page) if can_access(role, page) => PageAccess::Allowed(Some(page)),
        Some(page) => PageAccess::Restricted(page),
    }
}

/// Per-request rendering decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageDecision {
    /// Still resolving; show a spinner.
    Loading,
    /// Show the sign-in screen.
    SignInRequired,
    /// Show the failure message with a sign-out action.
    Unavailable(AuthFailure),
    /// Render the screen.
    Render(Option<AdminPage>),
    /// Render the restricted-access view instead of the screen.
    Restricted(AdminPage),
}

/// One published view of the gate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GateSnapshot {
    /// Latest resolution started. Results of older resolutions are dropped.
    pub generation: u64,
    /// True while the latest resolution has not reported back.
    pub resolving: bool,
    pub state: AuthState,
    /// Navigation for `state`, in declaration order.
    pub navigation: Vec<NavItem>,
}

impl GateSnapshot {
    pub(crate) const fn initial() -> Self {
        Self {
            generation: 0,
            resolving: true,
            state: AuthState::Loading,
            navigation: Vec::new(),
        }
    }
}
