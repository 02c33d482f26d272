//! Concurrent implementations of the core components
//!
//! This module provides thread-safe counterparts of the ledger and engine
//! for concurrent batch processing. The semantics are identical to the
//! synchronous versions; only the synchronization differs:
//!
//! - **AsyncAccountLedger**: per-account entry locking via DashMap
//! - **AsyncTransactionEngine**: optimistic versioned commits against the
//!   shared cash inventory, token claims under entry locks, and
//!   compensating reversals when the second half of a commit fails
//!
//! Operations on different accounts and tokens proceed in parallel; the
//! single cash supply is the one shared resource, guarded by a mutex held
//! only for snapshot and commit.

pub mod engine;
pub mod ledger;

pub use engine::AsyncTransactionEngine;
pub use ledger::AsyncAccountLedger;
