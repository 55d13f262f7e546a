//! Identity and profile collaborators.
//!
//! The session gate never talks to a backend directly. It is handed two
//! collaborators:
//!
//! - [`IdentityProvider`] - who is signed in, plus sign-in/out and change
//!   notifications
//! - [`ProfileDirectory`] - the admin profile for a signed-in email
//!
//! # Implementations
//!
//! - [`HostedIdentity`] - hosted identity service over HTTP ([`GoTrueClient`])
//! - [`crate::db::PgProfileDirectory`] - `admin.admin_user` table
//! - [`memory`] - in-process collaborators for tests and local development

mod error;
pub mod gotrue;
pub mod hosted;
pub mod memory;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::broadcast;

use agency_core::Email;

use crate::models::{AdminUserProfile, IdentitySession};

pub use error::{DirectoryError, IdentityError};
pub use gotrue::GoTrueClient;
pub use hosted::HostedIdentity;

/// Capacity of the auth-change broadcast channel per provider.
pub const AUTH_EVENT_CAPACITY: usize = 16;

/// A change in the identity service's session.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(IdentitySession),
    TokenRefreshed(IdentitySession),
    SignedOut,
}

impl AuthEvent {
    /// The session after this change, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&IdentitySession> {
        match self {
            Self::SignedIn(session) | Self::TokenRefreshed(session) => Some(session),
            Self::SignedOut => None,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "signed_in",
            Self::TokenRefreshed(_) => "token_refreshed",
            Self::SignedOut => "signed_out",
        }
    }
}

/// What a subscriber sees next.
#[derive(Debug, Clone)]
pub enum AuthNotification {
    /// A change, in order.
    Changed(AuthEvent),
    /// The subscriber fell behind and `n` changes were dropped; re-read the
    /// current session instead of replaying them.
    Missed(u64),
}

/// Registration for auth-change notifications.
///
/// Dropping the subscription (or calling [`AuthSubscription::unsubscribe`])
/// deregisters it.
#[derive(Debug)]
pub struct AuthSubscription {
    receiver: broadcast::Receiver<AuthEvent>,
}

impl AuthSubscription {
    /// Subscribe to a provider's event channel.
    #[must_use]
    pub fn new(sender: &broadcast::Sender<AuthEvent>) -> Self {
        Self {
            receiver: sender.subscribe(),
        }
    }

    /// Wait for the next notification. `None` once the provider is gone.
    pub async fn recv(&mut self) -> Option<AuthNotification> {
        match self.receiver.recv().await {
            Ok(event) => Some(AuthNotification::Changed(event)),
            Err(broadcast::error::RecvError::Lagged(n)) => Some(AuthNotification::Missed(n)),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    /// Explicitly deregister.
    pub fn unsubscribe(self) {}
}

/// The identity service: sessions, sign-in/out and change notifications.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The currently active session, if any.
    async fn current_session(&self) -> Result<Option<IdentitySession>, IdentityError>;

    /// Register for change notifications (sign-in, sign-out, token refresh).
    fn subscribe(&self) -> AuthSubscription;

    /// Password sign-in. Emits [`AuthEvent::SignedIn`] on success.
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<IdentitySession, IdentityError>;

    /// Terminate the current session. Emits [`AuthEvent::SignedOut`].
    async fn sign_out(&self) -> Result<(), IdentityError>;
}

/// Where admin profiles live.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Look up the admin profile for a signed-in email.
    async fn profile_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<AdminUserProfile>, DirectoryError>;

    /// Record a successful sign-in. Best effort from the gate's point of view.
    async fn stamp_last_login(&self, email: &Email) -> Result<(), DirectoryError>;
}
