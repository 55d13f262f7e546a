//! In-process identity provider and profile directory.
//!
//! Used by tests and by local development without a hosted backend. Both
//! collaborators support artificial latency and failure injection so gate
//! behaviour under slow or failing backends can be exercised.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{RwLock, broadcast};

use agency_core::{Email, IdentityUserId};

use super::{
    AUTH_EVENT_CAPACITY, AuthEvent, AuthSubscription, DirectoryError, IdentityError,
    IdentityProvider, ProfileDirectory,
};
use crate::models::{AdminUserProfile, IdentitySession};

/// In-memory [`IdentityProvider`].
pub struct MemoryIdentity {
    accounts: RwLock<HashMap<Email, SecretString>>,
    session: RwLock<Option<IdentitySession>>,
    events: broadcast::Sender<AuthEvent>,
    session_lookups: AtomicUsize,
    unavailable: AtomicBool,
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentity {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            accounts: RwLock::new(HashMap::new()),
            session: RwLock::new(None),
            events,
            session_lookups: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Register an account that can sign in with `password`.
    pub async fn add_account(&self, email: &Email, password: &str) {
        self.accounts
            .write()
            .await
            .insert(email.clone(), SecretString::from(password.to_owned()));
    }

    /// Start with `email` already signed in, without emitting an event
    /// (like a session restored from storage on page load).
    pub async fn restore_session(&self, email: &Email) -> IdentitySession {
        let session = new_session(email);
        *self.session.write().await = Some(session.clone());
        session
    }

    /// Simulate a token refresh for the current session.
    ///
    /// Returns `false` if nobody is signed in.
    pub async fn refresh_token(&self) -> bool {
        let mut guard = self.session.write().await;
        let Some(current) = guard.as_ref() else {
            return false;
        };
        let refreshed = new_session(&current.email);
        *guard = Some(refreshed.clone());
        drop(guard);
        self.emit(AuthEvent::TokenRefreshed(refreshed));
        true
    }

    /// Emit an arbitrary event without touching the stored session.
    pub fn emit(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }

    /// Make every call fail as if the service were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Number of `current_session` calls so far.
    #[must_use]
    pub fn session_lookups(&self) -> usize {
        self.session_lookups.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), IdentityError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(IdentityError::Unavailable("identity service is down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn current_session(&self) -> Result<Option<IdentitySession>, IdentityError> {
        self.session_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.session.read().await.clone())
    }

    fn subscribe(&self) -> AuthSubscription {
        AuthSubscription::new(&self.events)
    }

    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<IdentitySession, IdentityError> {
        self.check_available()?;

        let accounts = self.accounts.read().await;
        let matches = accounts
            .get(email)
            .is_some_and(|stored| stored.expose_secret() == password.expose_secret());
        drop(accounts);
        if !matches {
            return Err(IdentityError::InvalidCredentials);
        }

        let session = new_session(email);
        *self.session.write().await = Some(session.clone());
        self.emit(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.check_available()?;
        if self.session.write().await.take().is_some() {
            self.emit(AuthEvent::SignedOut);
        }
        Ok(())
    }
}

fn new_session(email: &Email) -> IdentitySession {
    IdentitySession {
        user_id: IdentityUserId::random(),
        email: email.clone(),
        access_token: SecretString::from(uuid::Uuid::new_v4().to_string()),
        refresh_token: Some(SecretString::from(uuid::Uuid::new_v4().to_string())),
        expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
    }
}

/// In-memory [`ProfileDirectory`].
#[derive(Default)]
pub struct MemoryDirectory {
    profiles: RwLock<HashMap<Email, AdminUserProfile>>,
    delays: RwLock<HashMap<Email, Duration>>,
    stamp_delay: RwLock<Option<Duration>>,
    lookups: AtomicUsize,
    fail_lookups: AtomicBool,
    fail_stamps: AtomicBool,
}

impl MemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile.
    pub async fn upsert(&self, profile: AdminUserProfile) {
        self.profiles
            .write()
            .await
            .insert(profile.email.clone(), profile);
    }

    /// Current copy of a profile.
    pub async fn get(&self, email: &Email) -> Option<AdminUserProfile> {
        self.profiles.read().await.get(email).cloned()
    }

    /// Make lookups for `email` take `delay` before answering.
    pub async fn set_lookup_delay(&self, email: &Email, delay: Duration) {
        self.delays.write().await.insert(email.clone(), delay);
    }

    /// Make every `stamp_last_login` take `delay` before answering.
    pub async fn set_stamp_delay(&self, delay: Duration) {
        *self.stamp_delay.write().await = Some(delay);
    }

    pub fn set_fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_stamps(&self, fail: bool) {
        self.fail_stamps.store(fail, Ordering::SeqCst);
    }

    /// Number of `profile_by_email` calls so far.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileDirectory for MemoryDirectory {
    async fn profile_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<AdminUserProfile>, DirectoryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let delay = self.delays.read().await.get(email).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable("connection refused".to_string()));
        }
        Ok(self.profiles.read().await.get(email).cloned())
    }

    async fn stamp_last_login(&self, email: &Email) -> Result<(), DirectoryError> {
        let delay = *self.stamp_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_stamps.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable("read-only replica".to_string()));
        }
        if let Some(profile) = self.profiles.write().await.get_mut(email) {
            let now = Utc::now();
            profile.last_login = Some(now);
            profile.updated_at = now;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agency_core::AdminRole;

    use super::*;
    use crate::identity::AuthNotification;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_sign_in_checks_password_and_notifies() {
        let identity = MemoryIdentity::new();
        let user = email("editor@agency.studio");
        identity.add_account(&user, "correct horse").await;
        let mut subscription = identity.subscribe();

        let wrong = identity
            .sign_in(&user, &SecretString::from("wrong"))
            .await;
        assert!(matches!(wrong, Err(IdentityError::InvalidCredentials)));

        let session = identity
            .sign_in(&user, &SecretString::from("correct horse"))
            .await
            .unwrap();
        assert_eq!(session.email, user);

        match subscription.recv().await {
            Some(AuthNotification::Changed(AuthEvent::SignedIn(s))) => assert_eq!(s.email, user),
            other => panic!("unexpected notification: {other:?}"),
        }
        assert_eq!(identity.current_session().await.unwrap().unwrap().email, user);
    }

    #[tokio::test]
    async fn test_sign_out_is_idempotent() {
        let identity = MemoryIdentity::new();
        identity.restore_session(&email("a@agency.studio")).await;
        let mut subscription = identity.subscribe();

        identity.sign_out().await.unwrap();
        identity.sign_out().await.unwrap();

        assert!(matches!(
            subscription.recv().await,
            Some(AuthNotification::Changed(AuthEvent::SignedOut))
        ));
        assert!(identity.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dropping_subscription_deregisters() {
        let identity = MemoryIdentity::new();
        let first = identity.subscribe();
        let second = identity.subscribe();
        assert_eq!(identity.subscriber_count(), 2);

        drop(first);
        second.unsubscribe();
        assert_eq!(identity.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_directory_stamps_last_login() {
        let directory = MemoryDirectory::new();
        let user = email("seo@agency.studio");
        directory
            .upsert(AdminUserProfile::new(user.clone(), "Sam", AdminRole::Admin))
            .await;

        directory.stamp_last_login(&user).await.unwrap();
        assert!(directory.get(&user).await.unwrap().last_login.is_some());

        directory.set_fail_stamps(true);
        assert!(directory.stamp_last_login(&user).await.is_err());
    }

    #[tokio::test]
    async fn test_directory_counts_lookups_and_fails_on_demand() {
        let directory = MemoryDirectory::new();
        let user = email("nobody@agency.studio");

        assert!(directory.profile_by_email(&user).await.unwrap().is_none());
        directory.set_fail_lookups(true);
        assert!(directory.profile_by_email(&user).await.is_err());
        assert_eq!(directory.lookups(), 2);
    }
}
