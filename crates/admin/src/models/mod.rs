//! Domain models for the admin panel.

pub mod admin_user;
pub mod session;

pub use admin_user::AdminUserProfile;
pub use session::{CurrentAdmin, IdentitySession, keys as session_keys};
