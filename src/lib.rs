//! ATM Engine Library
//! # Overview
//!
//! This library provides a CSV-driven ATM transaction engine covering
//! authentication, cash withdrawal and deposit, denomination exchange, and
//! QR-token cash pickup, with both a sync and an async processing strategy
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, TransactionRecord, QrToken, etc.)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - Transaction orchestration (validate, reserve, commit, record)
//!   - [`core::ledger`] - Account state, balances, and daily usage limits
//!   - [`core::inventory`] - Versioned cash inventory with balanced deltas
//!   - [`core::allocator`] - Greedy largest-first note allocation
//!   - [`core::qr_store`] - QR pickup tokens with expiry
//!   - [`core::history`] - Append-only transaction history
//! - [`io`] - Seed loading, operation-script parsing, and report output
//! - [`strategy`] - Pluggable session pipelines (sync, async batch)
//!
//! # Operations
//!
//! The engine supports six script operations:
//!
//! - **authenticate**: Verify an account number and PIN
//! - **withdraw**: Debit funds and dispense notes from the inventory
//! - **deposit**: Credit funds (capped per transaction, limited per day)
//! - **exchange**: Swap customer notes for machine notes of another denomination
//! - **qr_issue**: Reserve a cardless pickup token for a withdrawal amount
//! - **qr_redeem**: Dispense cash for a previously issued token, exactly once
//!
//! # Cash Model
//!
//! Account money (balances, limits, daily usage) is decimal; operation
//! amounts and denominations are integral. Every inventory mutation goes
//! through a delta keyed by denomination, so a session can never dispense
//! notes the machine does not hold.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{
    AccountLedger, AsyncAccountLedger, AsyncTransactionEngine, CashInventory, QrTokenStore,
    TransactionEngine, TransactionLog,
};
pub use io::{write_report, OperationRequest};
pub use types::{
    Account, AccountNumber, AtmError, Denomination, DepositReceipt, ExchangeReceipt, QrRedeemReceipt,
    QrToken, TransactionRecord, TransactionType, WithdrawalReceipt,
};
