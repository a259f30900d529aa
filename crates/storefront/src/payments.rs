//! Payment confirmation.
//!
//! Payment is simulated: [`SimulatedGateway`] waits for a fixed delay and
//! hands back a payment-method token without contacting any processor. Card
//! details, when supplied by the payment page, are checked for shape only.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use paws_claws_core::Money;

/// Errors returned by a [`PaymentGateway`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("payment amount must be greater than zero")]
    InvalidAmount,
    #[error("your card number is invalid")]
    InvalidCardNumber,
    #[error("your card's expiration date is invalid")]
    InvalidExpiry,
    #[error("your card has expired")]
    CardExpired,
    #[error("your card's security code is invalid")]
    InvalidCvc,
}

/// Card fields from the payment form.
#[derive(Clone)]
pub struct CardDetails {
    pub number: String,
    /// `MM/YY` or `MM/YYYY`.
    pub expiry: String,
    pub cvc: String,
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("last4", &self.last4())
            .field("expiry", &self.expiry)
            .field("cvc", &"[REDACTED]")
            .finish()
    }
}

impl CardDetails {
    fn digits(&self) -> String {
        self.number
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect()
    }

    /// Last four digits, for receipts and logs.
    #[must_use]
    pub fn last4(&self) -> String {
        let digits = self.digits();
        digits
            .get(digits.len().saturating_sub(4)..)
            .unwrap_or_default()
            .to_string()
    }

    /// Check number, expiry and CVC as of `today`.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self, today: NaiveDate) -> Result<(), PaymentError> {
        let digits = self.digits();
        if !(12..=19).contains(&digits.len()) || !luhn_valid(&digits) {
            return Err(PaymentError::InvalidCardNumber);
        }

        let (month, year) = parse_expiry(&self.expiry).ok_or(PaymentError::InvalidExpiry)?;
        if (year, month) < (today.year(), today.month()) {
            return Err(PaymentError::CardExpired);
        }

        let cvc = self.cvc.trim();
        if !(3..=4).contains(&cvc.len()) || !cvc.chars().all(|c| c.is_ascii_digit()) {
            return Err(PaymentError::InvalidCvc);
        }
        Ok(())
    }
}

fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0;
    for (i, c) in digits.chars().rev().enumerate() {
        let Some(mut d) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    sum % 10 == 0
}

fn parse_expiry(expiry: &str) -> Option<(u32, i32)> {
    let (month, year) = expiry.trim().split_once('/')?;
    let month: u32 = month.trim().parse().ok()?;
    let year = year.trim();
    let year: i32 = match year.len() {
        2 => 2000 + year.parse::<i32>().ok()?,
        4 => year.parse().ok()?,
        _ => return None,
    };
    (1..=12).contains(&month).then_some((month, year))
}

/// What to charge.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub amount: Money,
    pub card: Option<CardDetails>,
}

/// Opaque token identifying a confirmed payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PaymentMethodToken(String);

impl PaymentMethodToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PaymentMethodToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A confirmed payment.
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub method: PaymentMethodToken,
    pub amount: Money,
}

/// A payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    /// Confirm payment of `request.amount`.
    async fn confirm(&self, request: PaymentRequest) -> Result<PaymentConfirmation, PaymentError>;
}

/// Gateway that confirms every well-formed request after a fixed delay.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    delay: Duration,
}

impl SimulatedGateway {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    #[instrument(skip(self, request), fields(amount = %request.amount))]
    async fn confirm(&self, request: PaymentRequest) -> Result<PaymentConfirmation, PaymentError> {
        if request.amount.is_zero() || request.amount.is_negative() {
            return Err(PaymentError::InvalidAmount);
        }
        if let Some(card) = &request.card {
            card.validate(Utc::now().date_naive())?;
        }

        tokio::time::sleep(self.delay).await;

        let method = PaymentMethodToken(format!("pm_sim_{}", uuid::Uuid::new_v4().simple()));
        tracing::info!(method = %method, "Simulated payment confirmed");
        Ok(PaymentConfirmation {
            method,
            amount: request.amount,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn card(number: &str, expiry: &str, cvc: &str) -> CardDetails {
        CardDetails {
            number: number.to_string(),
            expiry: expiry.to_string(),
            cvc: cvc.to_string(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
    }

    #[test]
    fn test_valid_test_card() {
        assert_eq!(card("4242 4242 4242 4242", "12/30", "123").validate(today()), Ok(()));
        assert_eq!(card("4242-4242-4242-4242", "06/2026", "1234").validate(today()), Ok(()));
    }

    #[test]
    fn test_luhn_failure() {
        assert_eq!(
            card("4242 4242 4242 4241", "12/30", "123").validate(today()),
            Err(PaymentError::InvalidCardNumber)
        );
        assert_eq!(
            card("4242", "12/30", "123").validate(today()),
            Err(PaymentError::InvalidCardNumber)
        );
    }

    #[test]
    fn test_expiry_rules() {
        assert_eq!(
            card("4242424242424242", "05/26", "123").validate(today()),
            Err(PaymentError::CardExpired)
        );
        assert_eq!(
            card("4242424242424242", "13/30", "123").validate(today()),
            Err(PaymentError::InvalidExpiry)
        );
        assert_eq!(
            card("4242424242424242", "1230", "123").validate(today()),
            Err(PaymentError::InvalidExpiry)
        );
    }

    #[test]
    fn test_cvc_rules() {
        assert_eq!(
            card("4242424242424242", "12/30", "12").validate(today()),
            Err(PaymentError::InvalidCvc)
        );
        assert_eq!(
            card("4242424242424242", "12/30", "12a").validate(today()),
            Err(PaymentError::InvalidCvc)
        );
    }

    #[test]
    fn test_debug_hides_card() {
        let output = format!("{:?}", card("4242424242424242", "12/30", "987"));
        assert!(output.contains("4242"));
        assert!(!output.contains("4242424242424242"));
        assert!(!output.contains("987"));
    }

    #[tokio::test]
    async fn test_simulated_gateway_confirms() {
        let gateway = SimulatedGateway::new(Duration::ZERO);
        let confirmation = gateway
            .confirm(PaymentRequest {
                amount: Money::from_cents(2580),
                card: None,
            })
            .await
            .unwrap();
        assert!(confirmation.method.as_str().starts_with("pm_sim_"));
        assert_eq!(confirmation.amount, Money::from_cents(2580));
    }

    #[tokio::test]
    async fn test_simulated_gateway_rejects_zero() {
        let gateway = SimulatedGateway::new(Duration::ZERO);
        let result = gateway
            .confirm(PaymentRequest {
                amount: Money::ZERO,
                card: None,
            })
            .await;
        assert!(matches!(result, Err(PaymentError::InvalidAmount)));
    }
}
