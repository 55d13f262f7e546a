//! Long-lived session gate.
//!
//! A driver task owns the published [`GateSnapshot`]. Every trigger (mount,
//! auth-change notification, missed notifications) bumps the generation,
//! aborts any resolution still in flight and starts a new one. A finished
//! resolution is published only if its generation is still the latest, so
//! a slow answer for an old session can never overwrite a newer state.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle, JoinSet};

use agency_core::Email;

use super::resolve::{resolve_profile, stamp_login};
use super::state::{AuthFailure, AuthState, GateSnapshot, PageDecision};
use crate::identity::{
    AuthEvent, AuthNotification, AuthSubscription, IdentityError, IdentityProvider,
    ProfileDirectory,
};
use crate::models::IdentitySession;
use crate::navigation::NavItem;

/// Default upper bound for one resolution pass.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Tuning for a [`SessionGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateOptions {
    /// A pass that takes longer resolves to `Error(TimedOut)`.
    pub resolve_timeout: Duration,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            resolve_timeout: DEFAULT_RESOLVE_TIMEOUT,
        }
    }
}

/// Keeps an [`AuthState`] in sync with an identity provider.
///
/// Must be mounted inside a Tokio runtime. Dropping the gate (or calling
/// [`SessionGate::unmount`]) stops the driver, aborts in-flight resolutions
/// and releases the auth-change subscription; nothing is published after.
pub struct SessionGate {
    identity: Arc<dyn IdentityProvider>,
    snapshots: watch::Receiver<GateSnapshot>,
    driver: JoinHandle<()>,
}

impl SessionGate {
    /// Mount the gate and start the initial resolution.
    pub fn mount(
        identity: Arc<dyn IdentityProvider>,
        directory: Arc<dyn ProfileDirectory>,
        options: GateOptions,
    ) -> Self {
        let (sender, snapshots) = watch::channel(GateSnapshot::initial());

        // Subscribe before the first session check so a change landing in
        // between is not lost.
        let subscription = identity.subscribe();

        let driver = Driver {
            identity: Arc::clone(&identity),
            directory,
            timeout: options.resolve_timeout,
            sender,
            generation: 0,
            in_flight: JoinSet::new(),
        };
        let driver = tokio::spawn(driver.run(subscription));

        Self {
            identity,
            snapshots,
            driver,
        }
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> GateSnapshot {
        self.snapshots.borrow().clone()
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.snapshots.borrow().state.clone()
    }

    /// Navigation filtered for the resolved role.
    #[must_use]
    pub fn navigation(&self) -> Vec<NavItem> {
        self.snapshots.borrow().navigation.clone()
    }

    /// What to render for `path` right now.
    #[must_use]
    pub fn page_decision(&self, path: &str) -> PageDecision {
        self.snapshots.borrow().state.page_decision(path)
    }

    /// A receiver that observes every published snapshot.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<GateSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until a published snapshot satisfies `predicate`.
    ///
    /// Returns `None` if the gate stopped first.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&GateSnapshot) -> bool,
    ) -> Option<GateSnapshot> {
        let mut receiver = self.snapshots.clone();
        receiver
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .ok()
            .map(|snapshot| GateSnapshot::clone(&snapshot))
    }

    /// Wait until the latest resolution has reported back.
    pub async fn settled(&self) -> Option<GateSnapshot> {
        self.wait_for(|snapshot| !snapshot.resolving).await
    }

    /// Sign in through the identity provider. The state follows via the
    /// provider's notification.
    ///
    /// # Errors
    ///
    /// Propagates the provider's error; the auth state is left untouched.
    pub async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<IdentitySession, IdentityError> {
        self.identity.sign_in(email, password).await
    }

    /// Sign out through the identity provider. The state returns to
    /// `Unauthenticated` via the provider's notification.
    ///
    /// # Errors
    ///
    /// Propagates the provider's error.
    pub async fn sign_out(&self) -> Result<(), IdentityError> {
        self.identity.sign_out().await
    }

    /// Stop the gate.
    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for SessionGate {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

/// What started a resolution pass.
enum Trigger {
    /// Ask the provider for the current session.
    Reload,
    /// Use the session carried by a notification.
    Changed(AuthEvent),
}

struct Driver {
    identity: Arc<dyn IdentityProvider>,
    directory: Arc<dyn ProfileDirectory>,
    timeout: Duration,
    sender: watch::Sender<GateSnapshot>,
    generation: u64,
    in_flight: JoinSet<(u64, AuthState)>,
}

impl Driver {
    async fn run(mut self, mut subscription: AuthSubscription) {
        self.start(Trigger::Reload);
        let mut listening = true;

        loop {
            tokio::select! {
                notification = subscription.recv(), if listening => match notification {
                    Some(AuthNotification::Changed(event)) => {
                        tracing::debug!(event = event.name(), "auth change notification");
                        self.start(Trigger::Changed(event));
                    }
                    Some(AuthNotification::Missed(skipped)) => {
                        tracing::warn!(skipped, "missed auth notifications, reloading session");
                        self.start(Trigger::Reload);
                    }
                    None => {
                        tracing::debug!("identity provider closed its notification channel");
                        listening = false;
                    }
                },
                Some(joined) = self.in_flight.join_next() => self.finish(joined),
                else => break,
            }
        }
    }

    fn start(&mut self, trigger: Trigger) {
        self.in_flight.abort_all();
        self.generation += 1;
        let generation = self.generation;

        let identity = Arc::clone(&self.identity);
        let directory = Arc::clone(&self.directory);
        let timeout = self.timeout;
        self.in_flight.spawn(async move {
            let pass = run_pass(trigger, identity.as_ref(), directory.as_ref());
            let state = if let Ok(state) = tokio::time::timeout(timeout, pass).await {
                state
            } else {
                tracing::warn!(generation, ?timeout, "auth resolution timed out");
                AuthState::Error(AuthFailure::TimedOut)
            };

            // The stamp runs detached, outside the timeout and the abort.
            if let AuthState::Authenticated(profile) = &state {
                let email = profile.email.clone();
                tokio::spawn(async move { stamp_login(directory.as_ref(), &email).await });
            }
            (generation, state)
        });

        self.sender.send_modify(|snapshot| {
            snapshot.generation = generation;
            snapshot.resolving = true;
        });
    }

    fn finish(&mut self, joined: Result<(u64, AuthState), JoinError>) {
        let (generation, state) = match joined {
            Ok(done) => done,
            Err(e) if e.is_cancelled() => return,
            Err(e) => {
                // Stale passes are aborted on every trigger, so a panic
                // belongs to the latest one.
                tracing::error!(error = %e, "auth resolution task failed");
                (
                    self.generation,
                    AuthState::Error(AuthFailure::Backend("internal error".to_string())),
                )
            }
        };

        if generation != self.generation {
            tracing::debug!(generation, latest = self.generation, "discarding stale resolution");
            return;
        }

        tracing::info!(generation, state = state.name(), "auth state resolved");
        let navigation = state.navigation();
        self.sender.send_replace(GateSnapshot {
            generation,
            resolving: false,
            state,
            navigation,
        });
    }
}

async fn run_pass(
    trigger: Trigger,
    identity: &dyn IdentityProvider,
    directory: &dyn ProfileDirectory,
) -> AuthState {
    match trigger {
        Trigger::Changed(event) => resolve_profile(event.session(), directory).await,
        Trigger::Reload => match identity.current_session().await {
            Ok(session) => resolve_profile(session.as_ref(), directory).await,
            Err(e) => {
                tracing::error!(error = %e, "failed to read identity session");
                AuthState::Error(AuthFailure::Backend(e.to_string()))
            }
        },
    }
}
