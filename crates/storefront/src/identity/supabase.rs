//! Supabase Auth (GoTrue) client.
//!
//! Endpoints used:
//!
//! | Operation | Request |
//! |---|---|
//! | sign in | `POST /auth/v1/token?grant_type=password` |
//! | sign up | `POST /auth/v1/signup` |
//! | sign out | `POST /auth/v1/logout` |
//! | fetch user | `GET /auth/v1/user` |
//!
//! Every request carries the project's anon key in the `apikey` header;
//! user-scoped calls add the access token as a bearer token.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize, de::IgnoredAny};
use tracing::instrument;
use url::Url;

use paws_claws_core::{Email, UserId};

use super::{
    Credentials, IdentityError, IdentityProvider, SignUpOutcome, SignUpProfile,
};
use crate::config::{SupabaseConfig, anon_key};
use crate::models::{AccessToken, SessionUser, UserSession};

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpData<'a>,
}

#[derive(Serialize)]
struct SignUpData<'a> {
    full_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    access_token: String,
    user: UserResponse,
}

/// Sign-up answers with a session when email confirmation is off, and with
/// the bare user when it is on.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(SessionResponse),
    User(IgnoredAny),
}

/// GoTrue has used several error shapes over the years.
#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl UserResponse {
    fn into_session_user(self) -> Result<SessionUser, IdentityError> {
        let email = self.email.ok_or_else(|| {
            IdentityError::UnexpectedResponse("user has no email address".to_string())
        })?;
        Ok(SessionUser {
            id: UserId::new(self.id),
            email: Email::parse(&email)?,
        })
    }
}

impl SessionResponse {
    fn into_user_session(self) -> Result<UserSession, IdentityError> {
        Ok(UserSession {
            user: self.user.into_session_user()?,
            access_token: AccessToken::new(self.access_token),
        })
    }
}

/// Pull the human-readable message out of an error body.
fn error_message(status: StatusCode, body: &str) -> String {
    let parsed: ErrorResponse = serde_json::from_str(body).unwrap_or_default();
    parsed
        .msg
        .or(parsed.error_description)
        .or(parsed.message)
        .or(parsed.error)
        .unwrap_or_else(|| format!("account service returned {status}"))
}

fn parse_sign_up(body: &str, email: &Email) -> Result<SignUpOutcome, IdentityError> {
    match serde_json::from_str::<SignUpResponse>(body)? {
        SignUpResponse::Session(session) => {
            Ok(SignUpOutcome::SignedIn(session.into_user_session()?))
        }
        SignUpResponse::User(_) => Ok(SignUpOutcome::ConfirmationRequired {
            email: email.clone(),
        }),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// [`IdentityProvider`] backed by Supabase Auth.
#[derive(Clone)]
pub struct SupabaseIdentity {
    inner: Arc<SupabaseIdentityInner>,
}

struct SupabaseIdentityInner {
    client: reqwest::Client,
    base_url: Url,
    anon_key: String,
}

impl SupabaseIdentity {
    /// Create a new client.
    #[must_use]
    pub fn new(client: reqwest::Client, config: &SupabaseConfig) -> Self {
        Self {
            inner: Arc::new(SupabaseIdentityInner {
                client,
                base_url: config.url.clone(),
                anon_key: anon_key(config).to_string(),
            }),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| IdentityError::UnexpectedResponse(format!("bad endpoint {path}: {e}")))
    }

    fn post(&self, url: Url) -> reqwest::RequestBuilder {
        self.inner
            .client
            .post(url)
            .header("apikey", &self.inner.anon_key)
    }

    /// Read the body, turning non-2xx answers into [`IdentityError::Rejected`].
    async fn read_success(response: reqwest::Response) -> Result<String, IdentityError> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(IdentityError::Rejected(error_message(status, &body)))
        }
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn sign_in(&self, credentials: &Credentials) -> Result<UserSession, IdentityError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .post(url)
            .json(&PasswordGrant {
                email: credentials.email.as_str(),
                password: credentials.password.expose_secret(),
            })
            .send()
            .await?;

        let body = Self::read_success(response).await?;
        serde_json::from_str::<SessionResponse>(&body)?.into_user_session()
    }

    #[instrument(skip(self, credentials, profile), fields(email = %credentials.email))]
    async fn sign_up(
        &self,
        credentials: &Credentials,
        profile: &SignUpProfile,
    ) -> Result<SignUpOutcome, IdentityError> {
        let response = self
            .post(self.endpoint("auth/v1/signup")?)
            .json(&SignUpRequest {
                email: credentials.email.as_str(),
                password: credentials.password.expose_secret(),
                data: SignUpData {
                    full_name: &profile.full_name,
                },
            })
            .send()
            .await?;

        let body = Self::read_success(response).await?;
        parse_sign_up(&body, &credentials.email)
    }

    #[instrument(skip(self, session), fields(user_id = %session.user.id))]
    async fn sign_out(&self, session: &UserSession) -> Result<(), IdentityError> {
        let response = self
            .post(self.endpoint("auth/v1/logout")?)
            .bearer_auth(session.access_token.expose())
            .send()
            .await?;

        // An already-revoked token is as signed out as it gets.
        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        Self::read_success(response).await.map(|_| ())
    }

    #[instrument(skip(self, token))]
    async fn fetch_user(&self, token: &AccessToken) -> Result<Option<SessionUser>, IdentityError> {
        let response = self
            .inner
            .client
            .get(self.endpoint("auth/v1/user")?)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(token.expose())
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }

        let body = Self::read_success(response).await?;
        serde_json::from_str::<UserResponse>(&body)?
            .into_session_user()
            .map(Some)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::parse("luna@cats.io").unwrap()
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(
                StatusCode::BAD_REQUEST,
                r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#
            ),
            "Invalid login credentials"
        );
        assert_eq!(
            error_message(
                StatusCode::BAD_REQUEST,
                r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#
            ),
            "Email not confirmed"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "<html>oops</html>"),
            "account service returned 502 Bad Gateway"
        );
    }

    #[test]
    fn test_sign_up_requiring_confirmation() {
        let body = r#"{"id":"u-1","email":"luna@cats.io","confirmation_sent_at":"2026-01-01T00:00:00Z"}"#;
        match parse_sign_up(body, &email()).unwrap() {
            SignUpOutcome::ConfirmationRequired { email } => {
                assert_eq!(email.as_str(), "luna@cats.io");
            }
            SignUpOutcome::SignedIn(_) => panic!("expected confirmation"),
        }
    }

    #[test]
    fn test_sign_up_user_shape_is_not_inspected() {
        let body = r#"{"id":"u-2","phone":"","identities":[]}"#;
        assert!(matches!(
            parse_sign_up(body, &email()).unwrap(),
            SignUpOutcome::ConfirmationRequired { .. }
        ));
    }

    #[test]
    fn test_sign_up_with_autoconfirm() {
        let body = r#"{"access_token":"jwt","token_type":"bearer","expires_in":3600,
            "refresh_token":"r","user":{"id":"u-1","email":"luna@cats.io"}}"#;
        match parse_sign_up(body, &email()).unwrap() {
            SignUpOutcome::SignedIn(session) => {
                assert_eq!(session.user.id.as_str(), "u-1");
                assert_eq!(session.access_token.expose(), "jwt");
            }
            SignUpOutcome::ConfirmationRequired { .. } => panic!("expected session"),
        }
    }

    #[test]
    fn test_user_without_email_is_unexpected() {
        let user = UserResponse {
            id: "u-1".to_string(),
            email: None,
        };
        assert!(matches!(
            user.into_session_user(),
            Err(IdentityError::UnexpectedResponse(_))
        ));
    }
}
