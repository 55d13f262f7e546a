//! Stateful identity provider backed by the hosted identity service.
//!
//! Holds the current session in memory, refreshes it shortly before the
//! access token expires, and broadcasts every change to subscribers.

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use tokio::sync::{RwLock, broadcast};

use agency_core::Email;

use super::{
    AUTH_EVENT_CAPACITY, AuthEvent, AuthSubscription, GoTrueClient, IdentityError, IdentityProvider,
};
use crate::models::IdentitySession;

/// Refresh the access token when it expires within this window.
const REFRESH_MARGIN_SECONDS: i64 = 60;

/// [`IdentityProvider`] over the hosted identity REST API.
pub struct HostedIdentity {
    client: GoTrueClient,
    session: RwLock<Option<IdentitySession>>,
    events: broadcast::Sender<AuthEvent>,
}

impl HostedIdentity {
    #[must_use]
    pub fn new(client: GoTrueClient) -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            client,
            session: RwLock::new(None),
            events,
        }
    }

    fn emit(&self, event: AuthEvent) {
        tracing::debug!(event = event.name(), "auth state changed");
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

/// The service turned the refresh token down, as opposed to being unreachable
/// or failing on its side.
const fn refresh_was_refused(error: &IdentityError) -> bool {
    match error {
        IdentityError::InvalidCredentials => true,
        IdentityError::Rejected { status, .. } => *status >= 400 && *status < 500,
        _ => false,
    }
}

#[async_trait]
impl IdentityProvider for HostedIdentity {
    async fn current_session(&self) -> Result<Option<IdentitySession>, IdentityError> {
        let margin = chrono::Duration::seconds(REFRESH_MARGIN_SECONDS);

        {
            let guard = self.session.read().await;
            match guard.as_ref() {
                None => return Ok(None),
                Some(session) if !session.expires_within(Utc::now(), margin) => {
                    return Ok(Some(session.clone()));
                }
                Some(_) => {}
            }
        }

        // Refresh tokens rotate, so only one caller may spend it. Later
        // callers wait here and see the refreshed session.
        let mut guard = self.session.write().await;
        let Some(session) = guard.clone() else {
            return Ok(None);
        };
        if !session.expires_within(Utc::now(), margin) {
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token.as_ref() else {
            tracing::info!(email = %session.email, "access token expired without refresh token");
            *guard = None;
            self.emit(AuthEvent::SignedOut);
            return Ok(None);
        };

        match self.client.refresh(refresh_token).await {
            Ok(refreshed) => {
                *guard = Some(refreshed.clone());
                self.emit(AuthEvent::TokenRefreshed(refreshed.clone()));
                Ok(Some(refreshed))
            }
            Err(e) if refresh_was_refused(&e) => {
                tracing::warn!(email = %session.email, error = %e, "refresh token refused, signing out");
                *guard = None;
                self.emit(AuthEvent::SignedOut);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn subscribe(&self) -> AuthSubscription {
        AuthSubscription::new(&self.events)
    }

    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<IdentitySession, IdentityError> {
        let session = self.client.password_grant(email, password).await?;
        *self.session.write().await = Some(session.clone());
        tracing::info!(email = %session.email, "signed in");
        self.emit(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let Some(session) = self.session.write().await.take() else {
            return Ok(());
        };

        // The local session is gone either way; a failed revoke only means the
        // token lives until it expires.
        if let Err(e) = self.client.logout(&session.access_token).await {
            tracing::warn!(email = %session.email, error = %e, "failed to revoke session");
        }

        tracing::info!(email = %session.email, "signed out");
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::IdentityConfig;
    use crate::identity::AuthNotification;

    const USER_ID: &str = "9b2f3c4e-1a2b-4c3d-8e9f-0a1b2c3d4e5f";

    fn token_body(access: &str, refresh: Option<&str>, expires_in: i64) -> serde_json::Value {
        json!({
            "access_token": access,
            "refresh_token": refresh,
            "expires_in": expires_in,
            "user": { "id": USER_ID, "email": "editor@agency.studio" }
        })
    }

    async fn identity(server: &MockServer) -> HostedIdentity {
        let config = IdentityConfig {
            url: Url::parse(&server.uri()).unwrap(),
            anon_key: SecretString::from("test-anon-key"),
        };
        HostedIdentity::new(GoTrueClient::new(&config).unwrap())
    }

    /// Mount a password grant that hands out a session expiring in
    /// `expires_in` seconds.
    async fn mount_sign_in(server: &MockServer, refresh: Option<&str>, expires_in: i64) {
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(token_body("at-1", refresh, expires_in)),
            )
            .mount(server)
            .await;
    }

    async fn sign_in(identity: &HostedIdentity) {
        let email = Email::parse("editor@agency.studio").unwrap();
        identity
            .sign_in(&email, &SecretString::from("pw"))
            .await
            .unwrap();
    }

    async fn next_event(subscription: &mut AuthSubscription) -> AuthEvent {
        match subscription.recv().await.unwrap() {
            AuthNotification::Changed(event) => event,
            AuthNotification::Missed(n) => panic!("missed {n} notifications"),
        }
    }

    #[tokio::test]
    async fn test_fresh_session_is_not_refreshed() {
        let server = MockServer::start().await;
        mount_sign_in(&server, Some("rt-1"), 3600).await;
        Mock::given(query_param("grant_type", "refresh_token"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let identity = identity(&server).await;
        sign_in(&identity).await;

        let session = identity.current_session().await.unwrap().unwrap();
        assert_eq!(session.email.as_str(), "editor@agency.studio");
    }

    #[tokio::test]
    async fn test_session_inside_margin_is_refreshed() {
        let server = MockServer::start().await;
        mount_sign_in(&server, Some("rt-1"), 30).await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .and(body_json(json!({ "refresh_token": "rt-1" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(token_body("at-2", Some("rt-2"), 3600)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let identity = identity(&server).await;
        sign_in(&identity).await;
        let mut subscription = identity.subscribe();

        let session = identity.current_session().await.unwrap().unwrap();
        assert!(!session.expires_within(Utc::now(), chrono::Duration::seconds(60)));
        assert!(matches!(
            next_event(&mut subscription).await,
            AuthEvent::TokenRefreshed(_)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_reads_spend_the_refresh_token_once() {
        let server = MockServer::start().await;
        mount_sign_in(&server, Some("rt-1"), 30).await;
        Mock::given(query_param("grant_type", "refresh_token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(token_body("at-2", Some("rt-2"), 3600))
                    .set_delay(std::time::Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let identity = Arc::new(identity(&server).await);
        sign_in(&identity).await;

        let (a, b) = tokio::join!(identity.current_session(), identity.current_session());
        assert!(a.unwrap().is_some());
        assert!(b.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_refused_refresh_signs_out() {
        let server = MockServer::start().await;
        mount_sign_in(&server, Some("rt-stale"), 30).await;
        Mock::given(query_param("grant_type", "refresh_token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid Refresh Token: Refresh Token Not Found"
            })))
            .mount(&server)
            .await;

        let identity = identity(&server).await;
        sign_in(&identity).await;
        let mut subscription = identity.subscribe();

        assert!(identity.current_session().await.unwrap().is_none());
        assert!(matches!(next_event(&mut subscription).await, AuthEvent::SignedOut));
        assert!(identity.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_outage_keeps_session() {
        let server = MockServer::start().await;
        mount_sign_in(&server, Some("rt-1"), 30).await;
        Mock::given(query_param("grant_type", "refresh_token"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let identity = identity(&server).await;
        sign_in(&identity).await;

        assert!(matches!(
            identity.current_session().await,
            Err(IdentityError::Rejected { status: 503, .. })
        ));
        // Still signed in; the next read tries again.
        assert!(identity.current_session().await.is_err());
    }

    #[tokio::test]
    async fn test_expiring_session_without_refresh_token_signs_out() {
        let server = MockServer::start().await;
        mount_sign_in(&server, None, 30).await;

        let identity = identity(&server).await;
        sign_in(&identity).await;
        let mut subscription = identity.subscribe();

        assert!(identity.current_session().await.unwrap().is_none());
        assert!(matches!(next_event(&mut subscription).await, AuthEvent::SignedOut));
    }

    #[tokio::test]
    async fn test_sign_out_survives_failed_revoke() {
        let server = MockServer::start().await;
        mount_sign_in(&server, Some("rt-1"), 3600).await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let identity = identity(&server).await;
        sign_in(&identity).await;
        let mut subscription = identity.subscribe();

        identity.sign_out().await.unwrap();
        assert!(matches!(next_event(&mut subscription).await, AuthEvent::SignedOut));
        assert!(identity.current_session().await.unwrap().is_none());

        // Nothing left to revoke.
        identity.sign_out().await.unwrap();
    }
}
