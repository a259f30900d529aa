//! Session-related types.
//!
//! Types stored in the visitor's session: the mirrored identity, the cart
//! and the payment page's navigation state.

use serde::{Deserialize, Serialize};

use paws_claws_core::{Email, UserId};

/// The signed-in user, as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Provider-assigned user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

/// Bearer token issued by the identity provider.
///
/// Serializable so it can live in the session store; `Debug` never prints it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for `Authorization` headers only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Session mirror: the user plus the token that proves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user: SessionUser,
    pub access_token: AccessToken,
}

/// Session keys.
pub mod keys {
    /// Key for the mirrored identity ([`super::UserSession`]).
    pub const USER_SESSION: &str = "user_session";

    /// Key for the visitor's cart.
    pub const CART: &str = "cart";

    /// Key for the amount handed from the cart to the payment page.
    pub const PAYMENT_TOTAL: &str = "payment_total";

    /// Key for a one-shot banner shown on the next page view.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_debug_is_redacted() {
        let session = UserSession {
            user: SessionUser {
                id: UserId::new("user-1"),
                email: Email::parse("rex@dogs.io").unwrap(),
            },
            access_token: AccessToken::new("eyJ.secret.jwt"),
        };
        let debug_output = format!("{session:?}");
        assert!(debug_output.contains("rex@dogs.io"));
        assert!(!debug_output.contains("eyJ.secret.jwt"));
    }

    #[test]
    fn test_session_round_trips_through_json() {
        let session = UserSession {
            user: SessionUser {
                id: UserId::new("user-1"),
                email: Email::parse("rex@dogs.io").unwrap(),
            },
            access_token: AccessToken::new("token"),
        };
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["access_token"], "token");
        let back: UserSession = serde_json::from_value(value).unwrap();
        assert_eq!(back, session);
    }
}
