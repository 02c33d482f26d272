//! Append-only transaction history
//!
//! This module provides the `TransactionLog`, the immutable record of every
//! committed operation. Records are appended once and never mutated or
//! deleted; queries return copies.

use crate::types::{AccountNumber, TransactionRecord};

/// Append-only log of committed operations
#[derive(Debug, Default)]
pub struct TransactionLog {
    records: Vec<TransactionRecord>,
}

impl TransactionLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record for a committed operation
    pub fn append(&mut self, record: TransactionRecord) {
        self.records.push(record);
    }

    /// Number of records in the log
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in append order
    pub fn all(&self) -> &[TransactionRecord] {
        &self.records
    }

    /// Recent history for one account, most recent first
    ///
    /// Account-agnostic records (exchanges) are not attributed to any
    /// account and never appear here.
    pub fn history_for(&self, account_number: AccountNumber, limit: usize) -> Vec<TransactionRecord> {
        self.records
            .iter()
            .rev()
            .filter(|record| record.account_number == Some(account_number))
            .take(limit)
            .cloned()
            .collect()
    }
}
