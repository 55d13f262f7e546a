//! Admin user profile.
//!
//! The identity service only proves *who* is signed in. Whether that person
//! may use the admin panel, and with which role, lives in this profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agency_core::{AdminRole, AdminUserId, Email};

/// Application-level record of an admin user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUserProfile {
    /// Unique admin user ID.
    pub id: AdminUserId,
    /// Email the identity service signs this admin in with.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Role, or `None` when the stored value is not a known role.
    ///
    /// An unknown role keeps the profile usable (the admin can still sign
    /// out) while every permission check fails closed.
    #[serde(with = "lenient_role")]
    pub role: Option<AdminRole>,
    /// Disabled admins resolve to an error state instead of a session.
    pub is_active: bool,
    /// Stamped on every successful resolution.
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminUserProfile {
    /// A fresh, active profile. Used by seeding code and tests.
    #[must_use]
    pub fn new(email: Email, name: impl Into<String>, role: AdminRole) -> Self {
        let now = Utc::now();
        Self {
            id: AdminUserId::random(),
            email,
            name: name.into(),
            role: Some(role),
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Role label for display, `"unknown"` when the role did not parse.
    #[must_use]
    pub fn role_label(&self) -> &'static str {
        self.role.map_or("unknown", AdminRole::as_str)
    }
}

/// Serialises the role as its snake_case name and reads it back leniently.
mod lenient_role {
    use serde::{Deserialize, Deserializer, Serializer};

    use agency_core::AdminRole;

    #[allow(clippy::ref_option)] // signature required by serde(with)
    pub fn serialize<S: Serializer>(role: &Option<AdminRole>, s: S) -> Result<S::Ok, S::Error> {
        match role {
            Some(role) => s.serialize_str(role.as_str()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<AdminRole>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.as_deref().and_then(AdminRole::parse_lenient))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::parse("writer@agency.studio").unwrap()
    }

    #[test]
    fn test_new_profile_is_active() {
        let profile = AdminUserProfile::new(email(), "Writer", AdminRole::Editor);
        assert!(profile.is_active);
        assert_eq!(profile.role, Some(AdminRole::Editor));
        assert!(profile.last_login.is_none());
    }

    #[test]
    fn test_unknown_role_deserialises_to_none() {
        let mut value =
            serde_json::to_value(AdminUserProfile::new(email(), "Writer", AdminRole::Editor))
                .unwrap();
        value["role"] = serde_json::Value::String("owner".to_string());

        let profile: AdminUserProfile = serde_json::from_value(value).unwrap();
        assert_eq!(profile.role, None);
        assert_eq!(profile.role_label(), "unknown");
    }
}
