//! Live session gate check.
//!
//! Mounts a [`SessionGate`] against the hosted identity service and the
//! admin database, signs in, and prints what the admin shell would show.
//!
//! ```bash
//! AGENCY_ADMIN_PASSWORD=... agency-cli session status -e editor@agency.studio
//! ```

use std::sync::Arc;
use std::time::Duration;

use agency_admin::config::{ConfigError, GateConfig, IdentityConfig};
use agency_admin::db::PgProfileDirectory;
use agency_admin::gate::{AuthState, GateOptions, GateSnapshot, SessionGate};
use agency_admin::identity::{GoTrueClient, HostedIdentity, IdentityError};
use agency_core::{Email, EmailError};
use secrecy::SecretString;
use thiserror::Error;

use super::{ConnectError, connect};

/// Upper bound on waiting for the gate after sign-in.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Session gate stopped before settling")]
    GateStopped,

    #[error("Session gate did not settle within {0:?}")]
    NotSettled(Duration),
}

/// Sign in as `email`, wait for the gate to resolve, print the result and
/// sign out again.
///
/// # Errors
///
/// Returns `SessionError` for bad configuration, a rejected sign-in, or a
/// gate that does not settle.
pub async fn status(email: &str, password: String) -> Result<(), SessionError> {
    let email = Email::parse(email)?;
    let password = SecretString::from(password);

    let pool = connect().await?;
    let identity = Arc::new(HostedIdentity::new(GoTrueClient::new(
        &IdentityConfig::from_env()?,
    )?));
    let directory = Arc::new(PgProfileDirectory::new(pool));
    let options = GateOptions {
        resolve_timeout: GateConfig::from_env()?.resolve_timeout,
    };

    let gate = SessionGate::mount(identity, directory, options);
    let initial = gate
        .settled()
        .await
        .ok_or(SessionError::GateStopped)?;
    tracing::info!(state = initial.state.name(), "gate mounted");

    gate.sign_in(&email, &password).await?;
    tracing::info!(email = %email, "signed in, waiting for resolution");

    let resolved = tokio::time::timeout(
        SETTLE_TIMEOUT,
        gate.wait_for(|snapshot| snapshot.generation > initial.generation && !snapshot.resolving),
    )
    .await
    .map_err(|_| SessionError::NotSettled(SETTLE_TIMEOUT))?
    .ok_or(SessionError::GateStopped)?;

    print_snapshot(&resolved);

    if let Err(e) = gate.sign_out().await {
        tracing::warn!(error = %e, "sign-out failed");
    }
    gate.unmount();
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_snapshot(snapshot: &GateSnapshot) {
    match &snapshot.state {
        AuthState::Authenticated(profile) => {
            println!("authenticated: {} ({})", profile.email, profile.role_label());
        }
        AuthState::Error(failure) => println!("error: {failure}"),
        other => println!("{}", other.name()),
    }
    for item in &snapshot.navigation {
        println!("  {:<12} {}", item.label, item.path);
    }
}
