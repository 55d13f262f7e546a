//! Sign-in and sign-out.
//!
//! Sign-in runs one resolution pass (identity session → admin profile) and
//! only stores the admin in the session when it resolved to
//! `Authenticated`. Every other outcome re-renders the form with the
//! failure message.

use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use agency_core::Email;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::gate::{self, AuthState};
use crate::identity::IdentityError;
use crate::middleware::{OptionalAdmin, clear_current_admin, set_current_admin};
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;
use crate::views::{self, LoginTemplate};

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", axum::routing::post(logout))
}

/// Sign-in form fields.
#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

fn login_form(status: StatusCode, email: &str, error: Option<String>) -> Response {
    let page = views::render(&LoginTemplate {
        email: email.to_string(),
        error,
    });
    (status, page).into_response()
}

/// Render the sign-in form.
///
/// GET /auth/login
async fn login_page(OptionalAdmin(admin): OptionalAdmin) -> Response {
    if admin.is_some() {
        return Redirect::to("/admin").into_response();
    }
    login_form(StatusCode::OK, "", None)
}

/// Sign in with email and password.
///
/// POST /auth/login
#[instrument(skip_all, fields(email = %form.email))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let Ok(email) = Email::parse(&form.email) else {
        return Ok(login_form(
            StatusCode::BAD_REQUEST,
            &form.email,
            Some("Enter a valid email address.".to_string()),
        ));
    };
    let password = SecretString::from(form.password);

    let identity_session = match state.identity().password_grant(&email, &password).await {
        Ok(identity_session) => identity_session,
        Err(IdentityError::InvalidCredentials) => {
            tracing::info!("sign-in rejected by identity service");
            return Ok(login_form(
                StatusCode::UNAUTHORIZED,
                email.as_str(),
                Some(IdentityError::InvalidCredentials.to_string()),
            ));
        }
        Err(e) => {
            tracing::error!(error = %e, "identity service sign-in failed");
            return Ok(login_form(
                StatusCode::BAD_GATEWAY,
                email.as_str(),
                Some("The sign-in service is unavailable. Try again shortly.".to_string()),
            ));
        }
    };

    match gate::resolve(Some(&identity_session), state.directory()).await {
        AuthState::Authenticated(profile) => {
            let admin = CurrentAdmin::from(&profile);
            set_current_admin(&session, &admin).await?;
            session
                .insert(
                    session_keys::ACCESS_TOKEN,
                    identity_session.access_token.expose_secret(),
                )
                .await?;
            set_sentry_user(admin.id, Some(admin.email.as_str()));
            Ok(Redirect::to("/admin").into_response())
        }
        AuthState::Error(failure) => {
            // The identity session is useless without a usable profile.
            if let Err(e) = state.identity().logout(&identity_session.access_token).await {
                tracing::warn!(error = %e, "failed to revoke identity session");
            }
            Ok(login_form(
                StatusCode::FORBIDDEN,
                email.as_str(),
                Some(failure.to_string()),
            ))
        }
        other => Err(AppError::Internal(format!(
            "unexpected auth state after sign-in: {}",
            other.name()
        ))),
    }
}

/// Sign out and clear the session.
///
/// POST /auth/logout
#[instrument(skip_all)]
async fn logout(State(state): State<AppState>, session: Session) -> Result<Redirect, AppError> {
    let token = session
        .get::<String>(session_keys::ACCESS_TOKEN)
        .await
        .ok()
        .flatten();

    if let Some(token) = token
        && let Err(e) = state.identity().logout(&SecretString::from(token)).await
    {
        tracing::warn!(error = %e, "failed to revoke identity session");
    }

    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/auth/login"))
}
