//! Error types for the ATM engine
//!
//! This module defines all error types that can occur while processing ATM
//! operations. Errors are designed to be descriptive and user-friendly for
//! CLI output.
//!
//! # Error Categories
//!
//! - **File I/O Errors**: File not found, permission denied, etc.
//! - **CSV Parsing Errors**: Malformed CSV, invalid data types, etc.
//! - **Authentication Errors**: Wrong PIN, unknown or inactive account
//! - **Ledger Errors**: Insufficient balance, daily limits, overflow
//! - **Inventory Errors**: Unsatisfiable allocations, stock shortfalls
//! - **QR Token Errors**: Unknown, already-used, or expired tokens

use crate::types::account::LimitKind;
use crate::types::transaction::{AccountNumber, Denomination};
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the ATM engine
///
/// This enum represents all possible errors that can occur during operation
/// processing. Each variant includes relevant context to help diagnose and
/// resolve the issue. All variants are local, recoverable-by-caller
/// conditions; none are fatal to the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AtmError {
    /// Authentication failed (wrong PIN, unknown account, or inactive account)
    ///
    /// The cause is deliberately not distinguished so the error cannot be
    /// used as an account-probing oracle.
    #[error("Authentication failed for account {account}")]
    AuthenticationFailed {
        /// Account number that failed to authenticate
        account: AccountNumber,
    },

    /// No account exists for the given account number
    #[error("Account {account} not found")]
    AccountNotFound {
        /// The account number that was not found
        account: AccountNumber,
    },

    /// Amount is not valid for the requested operation (currently: zero)
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: u64,
    },

    /// Balance is too low to cover the requested debit
    ///
    /// This is a recoverable error - the operation is rejected and the
    /// account state remains unchanged.
    #[error("Insufficient balance for account {account}: balance {balance}, requested {requested}")]
    InsufficientBalance {
        /// Account number
        account: AccountNumber,
        /// Current balance
        balance: Decimal,
        /// Requested debit amount
        requested: Decimal,
    },

    /// Daily withdrawal or deposit limit would be exceeded
    #[error("Daily {kind} limit exceeded for account {account}: used {used}, limit {limit}, requested {requested}")]
    DailyLimitExceeded {
        /// Account number
        account: AccountNumber,
        /// Which daily counter was exceeded
        kind: LimitKind,
        /// Amount already used today
        used: Decimal,
        /// The daily cap
        limit: Decimal,
        /// Requested amount
        requested: Decimal,
    },

    /// Deposit exceeds the per-transaction cap
    #[error("Deposit of {amount} exceeds the per-transaction cap of {cap}")]
    DepositCapExceeded {
        /// Requested deposit amount
        amount: u64,
        /// Configured per-transaction cap
        cap: u64,
    },

    /// The amount cannot be composed exactly from the available notes
    ///
    /// Either total cash is short or no exact-change combination exists
    /// under the greedy dispensing rule. Nothing is mutated.
    #[error("Cannot dispense {amount}: insufficient cash or exact change unavailable")]
    Unsatisfiable {
        /// The amount that could not be composed
        amount: u64,
    },

    /// An inventory delta would drive a note count negative
    ///
    /// Reported for the first (largest) denomination that would go
    /// negative; the inventory is left untouched.
    #[error("Insufficient {denomination} notes: available {available}, requested {requested}")]
    InsufficientStock {
        /// Denomination that is short
        denomination: Denomination,
        /// Notes currently in the slot
        available: u32,
        /// Notes the delta tried to remove
        requested: u32,
    },

    /// An inventory delta would push a note count past what a slot can hold
    ///
    /// The slot counter saturates at `u32::MAX`; the inventory is left
    /// untouched.
    #[error("Denomination {denomination} slot cannot accept {requested} more notes: holding {current}")]
    SlotCapacityExceeded {
        /// Denomination whose slot would overflow
        denomination: Denomination,
        /// Notes currently in the slot
        current: u32,
        /// Notes the delta tried to add
        requested: u32,
    },

    /// A delta or exchange referenced a denomination the ATM does not track
    #[error("Denomination {denomination} is not a known inventory slot")]
    UnknownDenomination {
        /// The unrecognized denomination
        denomination: Denomination,
    },

    /// Exchange requested between identical denominations
    #[error("Cannot exchange denomination {denomination} for itself")]
    SameDenomination {
        /// The denomination given on both sides
        denomination: Denomination,
    },

    /// Exchange value is smaller than a single target note
    #[error("Exchange value {value} yields zero {to} notes")]
    ExchangeTooSmall {
        /// Total value of the notes handed in
        value: u64,
        /// Target denomination
        to: Denomination,
    },

    /// No QR token exists for the presented code
    #[error("QR token '{token}' not found")]
    TokenNotFound {
        /// The presented token code
        token: String,
    },

    /// The QR token was already redeemed
    ///
    /// This is a recoverable error - the second redemption is rejected and
    /// balances/inventory are unchanged from after the first.
    #[error("QR token '{token}' has already been used")]
    TokenAlreadyUsed {
        /// The presented token code
        token: String,
    },

    /// The QR token passed its expiry time before redemption
    #[error("QR token '{token}' has expired")]
    TokenExpired {
        /// The presented token code
        token: String,
    },

    /// A conflicting write landed between snapshot and commit
    ///
    /// Retryable: the operation was fully rolled back and can simply be
    /// attempted again.
    #[error("Concurrent modification detected on {resource}; retry the operation")]
    ConcurrentModification {
        /// The resource that moved underneath the operation
        resource: String,
    },

    /// Arithmetic overflow would occur
    ///
    /// This is a recoverable error - the operation is rejected to maintain
    /// account integrity.
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account number
        account: AccountNumber,
    },

    /// I/O error occurred while reading or writing files
    ///
    /// This is typically a fatal error (file permissions, disk full, etc.).
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    ///
    /// This is a recoverable error - the malformed record is skipped and
    /// processing continues with the next record.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },
}

// Conversion from io::Error to AtmError
impl From<std::io::Error> for AtmError {
    fn from(error: std::io::Error) -> Self {
        AtmError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to AtmError
impl From<csv::Error> for AtmError {
    fn from(error: csv::Error) -> Self {
        // Extract line number if available
        let line = error.position().map(|pos| pos.line());

        AtmError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl AtmError {
    /// Create an InsufficientBalance error
    pub fn insufficient_balance(
        account: AccountNumber,
        balance: Decimal,
        requested: Decimal,
    ) -> Self {
        AtmError::InsufficientBalance {
            account,
            balance,
            requested,
        }
    }

    /// Create a DailyLimitExceeded error
    pub fn daily_limit_exceeded(
        account: AccountNumber,
        kind: LimitKind,
        used: Decimal,
        limit: Decimal,
        requested: Decimal,
    ) -> Self {
        AtmError::DailyLimitExceeded {
            account,
            kind,
            used,
            limit,
            requested,
        }
    }

    /// Create an InsufficientStock error
    pub fn insufficient_stock(denomination: Denomination, available: u32, requested: u32) -> Self {
        AtmError::InsufficientStock {
            denomination,
            available,
            requested,
        }
    }

    /// Create a SlotCapacityExceeded error
    pub fn slot_capacity_exceeded(denomination: Denomination, current: u32, requested: u32) -> Self {
        AtmError::SlotCapacityExceeded {
            denomination,
            current,
            requested,
        }
    }

    /// Create a TokenNotFound error
    pub fn token_not_found(token: &str) -> Self {
        AtmError::TokenNotFound {
            token: token.to_string(),
        }
    }

    /// Create a TokenAlreadyUsed error
    pub fn token_already_used(token: &str) -> Self {
        AtmError::TokenAlreadyUsed {
            token: token.to_string(),
        }
    }

    /// Create a TokenExpired error
    pub fn token_expired(token: &str) -> Self {
        AtmError::TokenExpired {
            token: token.to_string(),
        }
    }

    /// Create a ConcurrentModification error
    pub fn concurrent_modification(resource: &str) -> Self {
        AtmError::ConcurrentModification {
            resource: resource.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: AccountNumber) -> Self {
        AtmError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }
}
