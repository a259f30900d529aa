//! Authentication extractors.
//!
//! The identity provider's session is mirrored into the visitor's
//! tower-session under [`session_keys::USER_SESSION`]. These extractors read
//! that mirror; they never call the provider.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{UserSession, session_keys};

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/auth";

/// Extractor that requires a signed-in user.
///
/// If nobody is signed in, returns a redirect to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(session): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", session.user.email)
/// }
/// ```
pub struct RequireAuth(pub UserSession);

/// Error returned when authentication is required but nobody is signed in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// The session layer is missing.
    SessionUnavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::SessionUnavailable => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::SessionUnavailable)?;

        let user_session: UserSession = session
            .get(session_keys::USER_SESSION)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection::RedirectToLogin)?;

        Ok(Self(user_session))
    }
}

/// Extractor that optionally gets the signed-in user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is signed in.
pub struct OptionalAuth(pub Option<UserSession>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_session = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<UserSession>(session_keys::USER_SESSION)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user_session))
    }
}

/// Mirror a provider session into the visitor's session.
///
/// Cycles the session id first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_user_session(
    session: &Session,
    user_session: &UserSession,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::USER_SESSION, user_session)
        .await
}

/// Drop the mirrored identity (sign-out or expiry), returning what was there.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_user_session(
    session: &Session,
) -> Result<Option<UserSession>, tower_sessions::session::Error> {
    session
        .remove::<UserSession>(session_keys::USER_SESSION)
        .await
}
