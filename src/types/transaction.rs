//! Transaction-related types for the ATM engine
//!
//! This module defines the identifier aliases, the transaction type
//! discriminant, and the immutable history record appended after every
//! successfully committed operation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account number identifier
///
/// Supports account numbers from 0 to 4,294,967,295
pub type AccountNumber = u32;

/// A note value the ATM can hold and dispense (e.g. 100, 500, 2000)
pub type Denomination = u32;

/// Transaction types recorded by the ATM engine
///
/// Each variant corresponds to one of the balance- or inventory-affecting
/// operations. QR withdrawals are recorded distinctly from card withdrawals
/// so the audit trail shows how the cash left the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Cash dispensed against an account balance
    Withdrawal,

    /// Cash credited to an account balance
    ///
    /// Deposited notes are not denomination-tracked, so deposits never
    /// touch the cash inventory.
    Deposit,

    /// Cash dispensed against a pre-authorized QR token
    QrWithdrawal,

    /// Physical notes swapped between two denominations
    ///
    /// Trades notes, not funds: no account balance is involved.
    Exchange,
}

/// Immutable history record for a committed operation
///
/// Created exactly once per successful operation and never mutated or
/// deleted afterwards. Exchange records are account-agnostic
/// (`account_number` is `None`) because the cash supply is shared; the
/// caller decides attribution.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    /// Account the operation settled against, if any
    pub account_number: Option<AccountNumber>,

    /// The kind of operation that was committed
    pub tx_type: TransactionType,

    /// Operation amount (total note value for exchanges)
    pub amount: Decimal,

    /// Account balance after the commit; `None` for exchanges
    pub balance_after: Option<Decimal>,

    /// Free-form note, e.g. "QR Cash Withdrawal - Token: AB12CD34"
    pub description: Option<String>,

    /// When the operation committed
    pub timestamp: DateTime<Utc>,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Deposit => "deposit",
            TransactionType::QrWithdrawal => "qr_withdrawal",
            TransactionType::Exchange => "exchange",
        };
        write!(f, "{}", name)
    }
}
