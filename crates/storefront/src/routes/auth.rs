//! Authentication route handlers.
//!
//! Sign-in, sign-up and sign-out are delegated to the configured
//! [`IdentityProvider`](crate::identity::IdentityProvider). Provider error
//! messages are shown to the visitor verbatim.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::Redirect,
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use paws_claws_core::Email;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::identity::{Credentials, SignUpOutcome, SignUpProfile};
use crate::middleware::{LOGIN_PATH, OptionalAuth, clear_user_session, set_user_session};
use crate::models::UserSession;
use crate::routes::{NavView, with_error};
use crate::session::SessionEvent;
use crate::state::AppState;

/// Shown after a sign-up that still needs email confirmation.
pub const CONFIRMATION_SENT: &str = "Check your email for the confirmation link!";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterForm")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Query parameters for the auth page.
#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    /// `register` shows the sign-up form.
    pub mode: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Which form the auth page shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

impl AuthMode {
    fn from_query(mode: Option<&str>) -> Self {
        match mode {
            Some("register") => Self::Register,
            _ => Self::Login,
        }
    }

    #[must_use]
    pub const fn is_register(&self) -> bool {
        matches!(self, Self::Register)
    }
}

/// Auth page template: the form, or the account panel when signed in.
#[derive(Template, WebTemplate)]
#[template(path = "auth/index.html")]
pub struct AuthTemplate {
    pub nav: NavView,
    pub mode: AuthMode,
    /// Set when a signed-in visitor's session is still valid.
    pub account_email: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

fn credentials(email: &str, password: String) -> std::result::Result<Credentials, String> {
    let email = Email::parse(email).map_err(|e| e.to_string())?;
    Ok(Credentials {
        email,
        password: SecretString::from(password),
    })
}

/// Mirror the provider session and announce the sign-in.
async fn establish(state: &AppState, session: &Session, user_session: &UserSession) -> Result<()> {
    set_user_session(session, user_session).await?;
    set_sentry_user(&user_session.user.id, Some(user_session.user.email.as_str()));
    state
        .session_feed()
        .publish(SessionEvent::SignedIn(user_session.user.clone()));
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the auth page.
///
/// A mirrored session is re-validated with the provider first; if the provider
/// no longer recognizes it, the mirror is dropped and the form is shown.
#[instrument(skip(state, session, current))]
pub async fn page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(current): OptionalAuth,
    Query(query): Query<AuthQuery>,
) -> Result<AuthTemplate> {
    let account_email = match current {
        Some(user_session) => match state.identity().fetch_user(&user_session.access_token).await {
            Ok(Some(user)) => Some(user.email.to_string()),
            Ok(None) => {
                tracing::info!(user_id = %user_session.user.id, "Mirrored session expired");
                clear_user_session(&session).await?;
                clear_sentry_user();
                state
                    .session_feed()
                    .publish(SessionEvent::Expired(user_session.user));
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not re-validate session");
                Some(user_session.user.email.to_string())
            }
        },
        None => None,
    };

    Ok(AuthTemplate {
        nav: NavView::load(&session).await,
        mode: AuthMode::from_query(query.mode.as_deref()),
        account_email,
        error: query.error,
        success: query.success,
    })
}

/// Handle login form submission.
#[instrument(skip(state, session))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let credentials = match credentials(&form.email, form.password) {
        Ok(credentials) => credentials,
        Err(message) => return Ok(Redirect::to(&with_error(LOGIN_PATH, &message))),
    };

    match state.identity().sign_in(&credentials).await {
        Ok(user_session) => {
            establish(&state, &session, &user_session).await?;
            tracing::info!(user_id = %user_session.user.id, "Signed in");
            Ok(Redirect::to("/shop"))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            Ok(Redirect::to(&with_error(LOGIN_PATH, &e.to_string())))
        }
    }
}

/// Handle registration form submission.
#[instrument(skip(state, session))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect> {
    let register_page = format!("{LOGIN_PATH}?mode=register");
    let credentials = match credentials(&form.email, form.password) {
        Ok(credentials) => credentials,
        Err(message) => return Ok(Redirect::to(&with_error(&register_page, &message))),
    };
    let profile = SignUpProfile::from_optional(form.full_name.as_deref());

    match state.identity().sign_up(&credentials, &profile).await {
        Ok(SignUpOutcome::ConfirmationRequired { email }) => {
            tracing::info!(%email, "Sign-up awaiting confirmation");
            Ok(Redirect::to(&format!(
                "{LOGIN_PATH}?success={}",
                urlencoding::encode(CONFIRMATION_SENT)
            )))
        }
        Ok(SignUpOutcome::SignedIn(user_session)) => {
            establish(&state, &session, &user_session).await?;
            tracing::info!(user_id = %user_session.user.id, "Signed up and signed in");
            Ok(Redirect::to("/shop"))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            Ok(Redirect::to(&with_error(&register_page, &e.to_string())))
        }
    }
}

/// Handle logout.
///
/// Provider errors are logged; the local session is cleared regardless.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    if let Some(user_session) = clear_user_session(&session).await? {
        if let Err(e) = state.identity().sign_out(&user_session).await {
            tracing::warn!(error = %e, "Provider sign-out failed");
        }
        clear_sentry_user();
        state
            .session_feed()
            .publish(SessionEvent::SignedOut(user_session.user));
    }
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_query() {
        assert_eq!(AuthMode::from_query(Some("register")), AuthMode::Register);
        assert_eq!(AuthMode::from_query(Some("login")), AuthMode::Login);
        assert_eq!(AuthMode::from_query(None), AuthMode::Login);
    }

    #[test]
    fn test_credentials_rejects_bad_email() {
        assert!(credentials("not-an-email", "hunter22".to_string()).is_err());
        let ok = credentials("rex@dogs.io", "hunter22".to_string()).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(ok.email.as_str(), "rex@dogs.io");
    }
}
