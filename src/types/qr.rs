//! QR token type for pre-authorized cash pickup
//!
//! A QR token represents a short-lived, single-use credential for a
//! withdrawal amount that was satisfiable at issue time. Expiry is
//! evaluated on read; expired unused tokens simply become permanently
//! invalid without any background sweep.

use super::transaction::AccountNumber;
use chrono::{DateTime, Duration, Utc};

/// How long an issued token stays redeemable
pub const TOKEN_TTL_MINUTES: i64 = 5;

/// A single-use cash pickup credential
///
/// Transitions exactly once from unused to used, or becomes permanently
/// unusable after `expires_at`. Never deleted by the engine; cleanup of
/// expired tokens is an external housekeeping concern.
#[derive(Debug, Clone, PartialEq)]
pub struct QrToken {
    /// Opaque unique token code
    pub token: String,

    /// Account the pickup settles against
    pub account_number: AccountNumber,

    /// Pre-authorized amount in whole currency units
    pub amount: u64,

    /// When the token was issued
    pub issued_at: DateTime<Utc>,

    /// `issued_at` plus the token TTL
    pub expires_at: DateTime<Utc>,

    /// Whether the token has been redeemed
    pub is_used: bool,

    /// When the token was redeemed, if it has been
    pub used_at: Option<DateTime<Utc>>,
}

impl QrToken {
    /// Create a fresh unused token issued at `now`
    pub fn new(token: String, account_number: AccountNumber, amount: u64, now: DateTime<Utc>) -> Self {
        QrToken {
            token,
            account_number,
            amount,
            issued_at: now,
            expires_at: now + Duration::minutes(TOKEN_TTL_MINUTES),
            is_used: false,
            used_at: None,
        }
    }

    /// Whether the token's expiry has passed as of `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_token_expires_after_ttl() {
        let now = Utc::now();
        let token = QrToken::new("AB12CD34".to_string(), 1001, 1000, now);

        assert_eq!(token.expires_at, now + Duration::minutes(TOKEN_TTL_MINUTES));
        assert!(!token.is_used);
        assert!(token.used_at.is_none());
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let token = QrToken::new("AB12CD34".to_string(), 1001, 1000, now);

        // Exactly at expires_at the token is still redeemable
        assert!(!token.is_expired(token.expires_at));
        assert!(token.is_expired(token.expires_at + Duration::seconds(1)));
    }
}
