//! Account-related types for the ATM engine
//!
//! This module defines the Account structure, the daily-limit bookkeeping
//! that goes with it, and the lazy daily-reset transition.

use super::transaction::AccountNumber;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Which daily usage counter a balance change updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    /// Counts against `daily_withdrawal_used` / `daily_withdrawal_limit`
    Withdrawal,
    /// Counts against `daily_deposit_used` / `daily_deposit_limit`
    Deposit,
}

impl std::fmt::Display for LimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitKind::Withdrawal => write!(f, "withdrawal"),
            LimitKind::Deposit => write!(f, "deposit"),
        }
    }
}

/// Customer account state
///
/// Represents the current state of a customer's account: balance, PIN,
/// daily usage counters, and active status. Accounts are seeded from
/// outside the engine and only mutated through the ledger's
/// `apply_balance_change` and the daily-reset transition.
///
/// # Invariants
///
/// - `balance` never goes negative as a result of any engine operation
/// - `0 <= daily_*_used <= daily_*_limit` at all times except during the
///   reset transition itself
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Unique account number
    pub account_number: AccountNumber,

    /// PIN stored in the clear (credential encryption is out of scope)
    pub pin: String,

    /// Account holder's display name
    pub holder_name: String,

    /// Current balance (non-negative)
    pub balance: Decimal,

    /// Daily withdrawal cap
    pub daily_withdrawal_limit: Decimal,

    /// Value withdrawn so far today
    pub daily_withdrawal_used: Decimal,

    /// Daily deposit cap
    pub daily_deposit_limit: Decimal,

    /// Value deposited so far today
    pub daily_deposit_used: Decimal,

    /// Day the usage counters were last zeroed
    pub last_reset_date: NaiveDate,

    /// Inactive accounts fail authentication
    pub is_active: bool,
}

impl Account {
    /// Create a seeded account with zero daily usage
    ///
    /// # Arguments
    ///
    /// * `account_number` - Unique account number
    /// * `pin` - Authentication PIN
    /// * `holder_name` - Account holder's name
    /// * `balance` - Opening balance
    /// * `daily_withdrawal_limit` - Daily withdrawal cap
    /// * `daily_deposit_limit` - Daily deposit cap
    /// * `today` - Date the counters start from
    pub fn new(
        account_number: AccountNumber,
        pin: impl Into<String>,
        holder_name: impl Into<String>,
        balance: Decimal,
        daily_withdrawal_limit: Decimal,
        daily_deposit_limit: Decimal,
        today: NaiveDate,
    ) -> Self {
        Account {
            account_number,
            pin: pin.into(),
            holder_name: holder_name.into(),
            balance,
            daily_withdrawal_limit,
            daily_withdrawal_used: Decimal::ZERO,
            daily_deposit_limit,
            daily_deposit_used: Decimal::ZERO,
            last_reset_date: today,
            is_active: true,
        }
    }

    /// Zero the daily usage counters if a new day has started
    ///
    /// Called lazily at the top of every ledger read and write, before any
    /// limit check for the current call. Returns `true` if a reset happened.
    pub fn reset_daily_usage_if_stale(&mut self, today: NaiveDate) -> bool {
        if self.last_reset_date < today {
            self.daily_withdrawal_used = Decimal::ZERO;
            self.daily_deposit_used = Decimal::ZERO;
            self.last_reset_date = today;
            true
        } else {
            false
        }
    }
}
