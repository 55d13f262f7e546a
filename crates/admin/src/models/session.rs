//! Session types.
//!
//! [`IdentitySession`] is what the identity service hands back on sign-in.
//! [`CurrentAdmin`] is the minimal resolved identity the admin shell keeps in
//! its server-side session.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use agency_core::{AdminRole, AdminUserId, Email, IdentityUserId};

use super::admin_user::AdminUserProfile;

/// Proof from the identity service that a user is signed in.
#[derive(Debug, Clone)]
pub struct IdentitySession {
    /// Identity-service user ID (distinct from the admin profile ID).
    pub user_id: IdentityUserId,
    /// Email the identity service authenticated.
    pub email: Email,
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    /// When the access token stops being accepted, if known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl IdentitySession {
    /// Whether the access token expires within `margin` of `now`.
    #[must_use]
    pub fn expires_within(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        self.expires_at.is_some_and(|at| at - margin <= now)
    }
}

/// Session-stored admin identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: AdminUserId,
    pub email: Email,
    pub name: String,
    /// `None` when the profile role was not recognised.
    pub role: Option<AdminRole>,
}

impl From<&AdminUserProfile> for CurrentAdmin {
    fn from(profile: &AdminUserProfile) -> Self {
        Self {
            id: profile.id,
            email: profile.email.clone(),
            name: profile.name.clone(),
            role: profile.role,
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// The resolved admin for this browser session.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Identity-service access token, used to revoke the session on logout.
    pub const ACCESS_TOKEN: &str = "identity_access_token";
}
