//! Core transaction processing logic
//!
//! This module contains the business logic of the ATM engine, split into
//! focused components:
//!
//! - **ledger**: authoritative account state and the daily-limit rules
//! - **inventory**: physical note counts with atomic, versioned deltas
//! - **allocator**: pure greedy planning of which notes to dispense
//! - **qr_store**: short-lived tokens for QR cash pickup
//! - **history**: append-only record of committed operations
//! - **engine**: orchestration of the above into atomic operations
//! - **async**: thread-safe counterparts for concurrent batch processing

pub mod allocator;
pub mod r#async;
pub mod engine;
pub mod history;
pub mod inventory;
pub mod ledger;
pub mod qr_store;

pub use engine::{TransactionEngine, DEPOSIT_CAP};
pub use history::TransactionLog;
pub use inventory::{CashInventory, InventorySnapshot};
pub use ledger::AccountLedger;
pub use qr_store::QrTokenStore;
pub use r#async::{AsyncAccountLedger, AsyncTransactionEngine};
