//! Integration tests for the agency admin access control.
//!
//! Everything here runs against the in-memory identity provider and profile
//! directory, so no database or identity service is needed:
//!
//! ```bash
//! cargo test -p agency-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `access_control` - permission table, path resolution and role management
//! - `session_gate` - gate state machine driven by auth-change notifications

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;
use std::time::Duration;

use agency_admin::gate::{GateOptions, GateSnapshot, SessionGate};
use agency_admin::identity::memory::{MemoryDirectory, MemoryIdentity};
use agency_admin::models::AdminUserProfile;
use agency_core::{AdminRole, Email};
use secrecy::SecretString;

/// Password every seeded account signs in with.
pub const PASSWORD: &str = "correct horse battery staple";

/// In-memory collaborators shared between a test and its gate.
pub struct TestBackend {
    pub identity: Arc<MemoryIdentity>,
    pub directory: Arc<MemoryDirectory>,
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            identity: Arc::new(MemoryIdentity::new()),
            directory: Arc::new(MemoryDirectory::new()),
        }
    }

    /// Register an identity account with an active admin profile.
    ///
    /// # Panics
    ///
    /// Panics if `address` is not a valid email.
    pub async fn admin(&self, address: &str, role: AdminRole) -> AdminUserProfile {
        let profile = AdminUserProfile::new(email(address), address, role);
        self.directory.upsert(profile.clone()).await;
        self.identity.add_account(&profile.email, PASSWORD).await;
        profile
    }

    /// Register an identity account that has no admin profile.
    ///
    /// # Panics
    ///
    /// Panics if `address` is not a valid email.
    pub async fn stranger(&self, address: &str) -> Email {
        let email = email(address);
        self.identity.add_account(&email, PASSWORD).await;
        email
    }

    /// Mount a gate with the given resolution timeout.
    #[must_use]
    pub fn mount(&self, resolve_timeout: Duration) -> SessionGate {
        SessionGate::mount(
            self.identity.clone(),
            self.directory.clone(),
            GateOptions { resolve_timeout },
        )
    }
}

/// Parse a test email address.
///
/// # Panics
///
/// Panics if `address` is not a valid email.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn email(address: &str) -> Email {
    Email::parse(address).unwrap()
}

#[must_use]
pub fn password() -> SecretString {
    SecretString::from(PASSWORD)
}

/// Wait until the gate has settled on a generation after `after`.
///
/// # Panics
///
/// Panics if the gate stops first.
#[allow(clippy::unwrap_used)]
pub async fn settled_after(gate: &SessionGate, after: u64) -> GateSnapshot {
    gate.wait_for(|snapshot| snapshot.generation > after && !snapshot.resolving)
        .await
        .unwrap()
}
