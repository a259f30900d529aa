//! Cart extractor.
//!
//! Loads the visitor's [`Cart`] from their session. Handlers mutate the
//! loaded value and call [`SessionCart::save`] to write it back.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use paws_claws_core::Cart;

use crate::error::AppError;
use crate::models::session_keys;

/// The visitor's cart together with the session it came from.
pub struct SessionCart {
    pub cart: Cart,
    session: Session,
}

impl SessionCart {
    /// Load the cart stored in `session`, or an empty one.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn load(session: Session) -> Result<Self, AppError> {
        let cart = session
            .get::<Cart>(session_keys::CART)
            .await?
            .unwrap_or_default();
        Ok(Self { cart, session })
    }

    /// Write the cart back to the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn save(&self) -> Result<(), AppError> {
        self.session.insert(session_keys::CART, &self.cart).await?;
        Ok(())
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }
}

impl<S> FromRequestParts<S> for SessionCart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, message)| AppError::Internal(message.to_string()))?;
        Self::load(session).await
    }
}
