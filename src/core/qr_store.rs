//! QR token registry
//!
//! This module provides the `QrTokenStore`, the short-lived token registry
//! behind the QR cash-pickup flow. Tokens are issued with a 5-minute
//! expiry, validated on read, and flipped used exactly once. Expired
//! tokens are kept (permanently invalid) rather than swept.

use crate::types::{AccountNumber, AtmError, QrToken};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Length of the customer-facing token code
pub(crate) const TOKEN_CODE_LEN: usize = 8;

/// Registry of issued QR tokens, keyed by token code
#[derive(Debug, Default)]
pub struct QrTokenStore {
    tokens: HashMap<String, QrToken>,
}

impl QrTokenStore {
    /// Create an empty token store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tokens ever issued (used or not)
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no tokens have been issued
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Generate an unused token code
    ///
    /// Short uppercase prefix of a v4 UUID; re-drawn on the (unlikely)
    /// collision with an existing code.
    fn fresh_code(&self) -> String {
        loop {
            let code: String = Uuid::new_v4()
                .simple()
                .to_string()
                .chars()
                .take(TOKEN_CODE_LEN)
                .collect::<String>()
                .to_uppercase();
            if !self.tokens.contains_key(&code) {
                return code;
            }
        }
    }

    /// Issue a new token for a pre-authorized amount
    ///
    /// The caller (the engine) is responsible for having validated that the
    /// withdrawal is currently satisfiable; the store only registers it.
    ///
    /// # Returns
    ///
    /// A copy of the newly issued token.
    pub fn issue(
        &mut self,
        account_number: AccountNumber,
        amount: u64,
        now: DateTime<Utc>,
    ) -> QrToken {
        let code = self.fresh_code();
        let token = QrToken::new(code.clone(), account_number, amount, now);
        self.tokens.insert(code, token.clone());
        token
    }

    /// Look up a token by code
    pub fn get(&self, code: &str) -> Option<&QrToken> {
        self.tokens.get(code)
    }

    /// Validate a token for redemption as of `now`
    ///
    /// # Returns
    ///
    /// * `Ok(QrToken)` - Copy of a token that is present, unused, and unexpired
    /// * `Err(TokenNotFound | TokenAlreadyUsed | TokenExpired)` otherwise
    pub fn redeemable(&self, code: &str, now: DateTime<Utc>) -> Result<QrToken, AtmError> {
        let token = self
            .tokens
            .get(code)
            .ok_or_else(|| AtmError::token_not_found(code))?;

        if token.is_used {
            return Err(AtmError::token_already_used(code));
        }
        if token.is_expired(now) {
            return Err(AtmError::token_expired(code));
        }

        Ok(token.clone())
    }

    /// Flip a token to used, recording when
    ///
    /// The transition is one-way; calling this on an already-used token is
    /// rejected so a double redemption can never look like a success.
    pub fn mark_used(&mut self, code: &str, now: DateTime<Utc>) -> Result<(), AtmError> {
        let token = self
            .tokens
            .get_mut(code)
            .ok_or_else(|| AtmError::token_not_found(code))?;

        if token.is_used {
            return Err(AtmError::token_already_used(code));
        }
        token.is_used = true;
        token.used_at = Some(now);

        Ok(())
    }
}
