//! Identity provider seam.
//!
//! The storefront never stores passwords or issues tokens itself. Sign-in,
//! sign-up and session validation are delegated to an [`IdentityProvider`];
//! the result is mirrored into the visitor's session as a
//! [`UserSession`](crate::models::UserSession).

mod supabase;

pub use supabase::SupabaseIdentity;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use paws_claws_core::{Email, EmailError};

use crate::models::{AccessToken, SessionUser, UserSession};

/// Display name sent with sign-ups that did not supply one.
pub const DEFAULT_FULL_NAME: &str = "Pet Lover";

/// Errors that can occur talking to the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// No backend is configured for this deployment.
    #[error("sign-in is unavailable: the account service is not configured")]
    NotConfigured,

    /// The provider refused the request; the message is shown to the user as-is.
    #[error("{0}")]
    Rejected(String),

    /// The provider answered with something other than a user.
    #[error("unexpected response from account service: {0}")]
    UnexpectedResponse(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The provider returned an email we cannot parse.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// Email and password as typed into the auth form.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: Email,
    pub password: SecretString,
}

/// Profile metadata attached to a new account.
#[derive(Debug, Clone)]
pub struct SignUpProfile {
    pub full_name: String,
}

impl SignUpProfile {
    /// Use `name` if it has any content, otherwise the default display name.
    #[must_use]
    pub fn from_optional(name: Option<&str>) -> Self {
        let full_name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FULL_NAME);
        Self {
            full_name: full_name.to_string(),
        }
    }
}

impl Default for SignUpProfile {
    fn default() -> Self {
        Self::from_optional(None)
    }
}

/// What happened after a sign-up.
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    /// The account exists but must be confirmed via email before sign-in.
    ConfirmationRequired { email: Email },
    /// The provider signed the user in straight away.
    SignedIn(UserSession),
}

/// An external authentication service.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Exchange email and password for a session.
    async fn sign_in(&self, credentials: &Credentials) -> Result<UserSession, IdentityError>;

    /// Create an account.
    async fn sign_up(
        &self,
        credentials: &Credentials,
        profile: &SignUpProfile,
    ) -> Result<SignUpOutcome, IdentityError>;

    /// Revoke the session's token with the provider.
    async fn sign_out(&self, session: &UserSession) -> Result<(), IdentityError>;

    /// Look up the user behind a token; `None` if the token is no longer valid.
    async fn fetch_user(&self, token: &AccessToken) -> Result<Option<SessionUser>, IdentityError>;
}

/// Stand-in used when no backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotConfiguredIdentity;

#[async_trait]
impl IdentityProvider for NotConfiguredIdentity {
    async fn sign_in(&self, _credentials: &Credentials) -> Result<UserSession, IdentityError> {
        Err(IdentityError::NotConfigured)
    }

    async fn sign_up(
        &self,
        _credentials: &Credentials,
        _profile: &SignUpProfile,
    ) -> Result<SignUpOutcome, IdentityError> {
        Err(IdentityError::NotConfigured)
    }

    async fn sign_out(&self, _session: &UserSession) -> Result<(), IdentityError> {
        Ok(())
    }

    async fn fetch_user(&self, _token: &AccessToken) -> Result<Option<SessionUser>, IdentityError> {
        Err(IdentityError::NotConfigured)
    }
}
