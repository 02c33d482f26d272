//! Core data types for the ATM engine
//!
//! This module contains all domain types:
//! - `account` - Account state and daily-limit bookkeeping
//! - `transaction` - Identifier aliases, transaction types, history records
//! - `qr` - QR cash-pickup tokens
//! - `receipt` - Success payloads returned by engine operations
//! - `error` - The error taxonomy

pub mod account;
pub mod error;
pub mod qr;
pub mod receipt;
pub mod transaction;

pub use account::{Account, LimitKind};
pub use error::AtmError;
pub use qr::{QrToken, TOKEN_TTL_MINUTES};
pub use receipt::{DepositReceipt, ExchangeReceipt, QrRedeemReceipt, WithdrawalReceipt};
pub use transaction::{AccountNumber, Denomination, TransactionRecord, TransactionType};
