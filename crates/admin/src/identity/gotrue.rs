//! HTTP client for the hosted identity service.
//!
//! Speaks the GoTrue REST dialect used by the hosted backend:
//!
//! ```text
//! POST /auth/v1/token?grant_type=password       - email/password sign-in
//! POST /auth/v1/token?grant_type=refresh_token  - refresh an access token
//! POST /auth/v1/logout                          - revoke the session
//! ```
//!
//! Every request carries the project's anon key in the `apikey` header.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use agency_core::{Email, IdentityUserId};

use super::IdentityError;
use crate::config::IdentityConfig;
use crate::models::IdentitySession;

/// Request timeout for identity calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Stateless client for the identity REST API.
#[derive(Clone)]
pub struct GoTrueClient {
    http: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
}

impl std::fmt::Debug for GoTrueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoTrueClient")
            .field("base_url", &self.base_url.as_str())
            .field("anon_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Token grant response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: IdentityUser,
}

/// User record embedded in a token response.
#[derive(Debug, Deserialize)]
struct IdentityUser {
    id: IdentityUserId,
    email: Option<String>,
}

/// Any of the error shapes the service is known to return.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_code: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

impl GoTrueClient {
    /// Create a client for the configured identity service.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Http` if the HTTP client cannot be built.
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let mut base_url = config.url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url,
            anon_key: config.anon_key.clone(),
        })
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidCredentials` for a rejected pair, or a
    /// transport/protocol error.
    pub async fn password_grant(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<IdentitySession, IdentityError> {
        let url = self.token_endpoint("password")?;
        let body = serde_json::json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
        });

        let response = self
            .http
            .post(url)
            .header("apikey", self.anon_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        read_session(response).await
    }

    /// Exchange a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Rejected` if the refresh token is no longer valid.
    pub async fn refresh(&self, refresh_token: &SecretString) -> Result<IdentitySession, IdentityError> {
        let url = self.token_endpoint("refresh_token")?;
        let body = serde_json::json!({ "refresh_token": refresh_token.expose_secret() });

        let response = self
            .http
            .post(url)
            .header("apikey", self.anon_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        read_session(response).await
    }

    /// Revoke the session that owns `access_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot be reached or rejects the call.
    pub async fn logout(&self, access_token: &SecretString) -> Result<(), IdentityError> {
        let url = self.endpoint("auth/v1/logout")?;
        let response = self
            .http
            .post(url)
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(access_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(error_from_body(status, &body))
    }

    fn token_endpoint(&self, grant_type: &str) -> Result<Url, IdentityError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityError> {
        self.base_url
            .join(path)
            .map_err(|e| IdentityError::Malformed(format!("invalid identity endpoint {path}: {e}")))
    }
}

async fn read_session(response: reqwest::Response) -> Result<IdentitySession, IdentityError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(error_from_body(status, &body));
    }

    let token: TokenResponse =
        serde_json::from_str(&body).map_err(|e| IdentityError::Malformed(e.to_string()))?;
    session_from_token(token, Utc::now())
}

fn session_from_token(token: TokenResponse, now: DateTime<Utc>) -> Result<IdentitySession, IdentityError> {
    let email = token
        .user
        .email
        .as_deref()
        .ok_or_else(|| IdentityError::Malformed("identity user has no email".to_string()))?;
    let email = Email::parse(email).map_err(|e| IdentityError::Malformed(e.to_string()))?;

    let expires_at = match (token.expires_at, token.expires_in) {
        (Some(at), _) => Utc.timestamp_opt(at, 0).single(),
        (None, Some(seconds)) => Some(now + chrono::Duration::seconds(seconds)),
        (None, None) => None,
    };

    Ok(IdentitySession {
        user_id: token.user.id,
        email,
        access_token: SecretString::from(token.access_token),
        refresh_token: token.refresh_token.map(SecretString::from),
        expires_at,
    })
}

fn error_from_body(status: StatusCode, body: &str) -> IdentityError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let code = parsed.error_code.as_deref().or(parsed.error.as_deref());
    if status == StatusCode::BAD_REQUEST
        && matches!(code, Some("invalid_grant" | "invalid_credentials"))
    {
        return IdentityError::InvalidCredentials;
    }

    let message = parsed
        .error_description
        .or(parsed.msg)
        .or(parsed.message)
        .or(parsed.error)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

    IdentityError::Rejected {
        status: status.as_u16(),
        message,
    }
}
