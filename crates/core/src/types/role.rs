//! Admin roles and their rank ordering.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a known [`AdminRole`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid admin role: {0} (expected super_admin, admin, editor or viewer)")]
pub struct UnknownRole(pub String);

/// Permission tier assigned to an admin user.
///
/// Roles are totally ordered by [`AdminRole::rank`]. The derived `Ord` follows
/// declaration order, which is *descending* rank, so always compare through
/// `rank()` rather than `<`/`>` on the enum itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin.admin_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Everything, including admin user management.
    SuperAdmin,
    /// Every content and configuration screen except user management.
    Admin,
    /// Blog and media content.
    Editor,
    /// Dashboard and help only.
    Viewer,
}

impl AdminRole {
    /// All roles, highest rank first.
    pub const ALL: [Self; 4] = [Self::SuperAdmin, Self::Admin, Self::Editor, Self::Viewer];

    /// Integer rank of the role. Higher means more privileged.
    ///
    /// Unrecognised roles are represented as `None` by callers and rank `0`
    /// (see [`AdminRole::rank_of`]).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::SuperAdmin => 4,
            Self::Admin => 3,
            Self::Editor => 2,
            Self::Viewer => 1,
        }
    }

    /// Rank of an optional role, `0` when the role is absent or unknown.
    #[must_use]
    pub const fn rank_of(role: Option<Self>) -> u8 {
        match role {
            Some(role) => role.rank(),
            None => 0,
        }
    }

    /// Canonical snake_case name, as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SuperAdmin => "Super admin",
            Self::Admin => "Admin",
            Self::Editor => "Editor",
            Self::Viewer => "Viewer",
        }
    }

    /// Parse a role string coming from an untrusted source.
    ///
    /// Surrounding whitespace and ASCII case are ignored. Anything else that
    /// is not an exact role name yields `None`, which every resolver treats
    /// as the bottom element.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdminRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_lenient(s).ok_or_else(|| UnknownRole(s.to_owned()))
    }
}
