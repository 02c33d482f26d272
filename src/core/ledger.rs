//! Account ledger
//!
//! This module provides the `AccountLedger` struct, the authoritative store
//! of account state. It is the single place account balances and daily
//! usage counters mutate, and every read or write first applies the lazy
//! daily reset so limit checks always see the current day's counters.

use crate::types::{Account, AccountNumber, AtmError, LimitKind};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Authoritative store of all customer accounts
///
/// The ledger maintains an in-memory map of account numbers to account
/// state. Accounts are seeded from outside the engine; the ledger never
/// creates or deletes them.
#[derive(Debug, Default)]
pub struct AccountLedger {
    /// Map of account numbers to account state
    accounts: HashMap<AccountNumber, Account>,
}

impl AccountLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger from seeded accounts
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        AccountLedger {
            accounts: accounts
                .into_iter()
                .map(|account| (account.account_number, account))
                .collect(),
        }
    }

    /// Insert a seeded account, replacing any existing entry
    pub fn insert(&mut self, account: Account) {
        self.accounts.insert(account.account_number, account);
    }

    /// Number of accounts in the ledger
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the ledger holds no accounts
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// All accounts sorted by account number, for deterministic output
    pub fn all_accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.accounts.values().cloned().collect();
        accounts.sort_by_key(|account| account.account_number);
        accounts
    }

    /// Fetch the account entry, applying the lazy daily reset first
    ///
    /// Every public read and write funnels through here so no limit check
    /// can ever observe yesterday's counters.
    fn entry_mut(
        &mut self,
        account_number: AccountNumber,
        today: NaiveDate,
    ) -> Result<&mut Account, AtmError> {
        let account = self
            .accounts
            .get_mut(&account_number)
            .ok_or(AtmError::AccountNotFound {
                account: account_number,
            })?;
        account.reset_daily_usage_if_stale(today);
        Ok(account)
    }

    /// Load a copy of an account's current state
    ///
    /// # Returns
    ///
    /// * `Ok(Account)` - Snapshot after the lazy daily reset
    /// * `Err(AccountNotFound)` - No such account
    pub fn load(
        &mut self,
        account_number: AccountNumber,
        today: NaiveDate,
    ) -> Result<Account, AtmError> {
        self.entry_mut(account_number, today).map(|a| a.clone())
    }

    /// Authenticate a customer
    ///
    /// Applies the lazy daily reset, then requires an exact PIN match and
    /// an active account. All failure causes collapse into
    /// `AuthenticationFailed` so the error cannot be used to probe which
    /// part was wrong.
    pub fn authenticate(
        &mut self,
        account_number: AccountNumber,
        pin: &str,
        today: NaiveDate,
    ) -> Result<Account, AtmError> {
        let failed = AtmError::AuthenticationFailed {
            account: account_number,
        };

        let account = match self.entry_mut(account_number, today) {
            Ok(account) => account,
            Err(_) => return Err(failed),
        };

        if account.pin != pin || !account.is_active {
            return Err(failed);
        }

        Ok(account.clone())
    }

    /// Apply a balance change together with its daily-usage bookkeeping
    ///
    /// This is the single point where account state mutates. Validates
    /// before committing:
    /// - `balance + delta >= 0`, else `InsufficientBalance`
    /// - `0 <= used + limit_delta <= limit`, else `DailyLimitExceeded`
    ///
    /// A negative `limit_delta` is the compensating direction, used to
    /// reverse a debit whose second commit phase failed.
    ///
    /// # Arguments
    ///
    /// * `account_number` - Account to mutate
    /// * `delta` - Signed balance change
    /// * `kind` - Which daily counter `limit_delta` applies to
    /// * `limit_delta` - Signed change to the daily usage counter
    /// * `today` - Current date for the lazy reset
    ///
    /// # Returns
    ///
    /// The updated account on success; on any failure the account is
    /// unchanged.
    pub fn apply_balance_change(
        &mut self,
        account_number: AccountNumber,
        delta: Decimal,
        kind: LimitKind,
        limit_delta: Decimal,
        today: NaiveDate,
    ) -> Result<Account, AtmError> {
        let account = self.entry_mut(account_number, today)?;

        let new_balance = account
            .balance
            .checked_add(delta)
            .ok_or_else(|| AtmError::arithmetic_overflow("balance change", account_number))?;
        if new_balance < Decimal::ZERO {
            return Err(AtmError::insufficient_balance(
                account_number,
                account.balance,
                -delta,
            ));
        }

        let (used, limit) = match kind {
            LimitKind::Withdrawal => (account.daily_withdrawal_used, account.daily_withdrawal_limit),
            LimitKind::Deposit => (account.daily_deposit_used, account.daily_deposit_limit),
        };
        let new_used = used
            .checked_add(limit_delta)
            .ok_or_else(|| AtmError::arithmetic_overflow("daily usage", account_number))?;
        if new_used > limit || new_used < Decimal::ZERO {
            return Err(AtmError::daily_limit_exceeded(
                account_number,
                kind,
                used,
                limit,
                limit_delta,
            ));
        }

        // Both checks passed; commit balance and counter together
        account.balance = new_balance;
        match kind {
            LimitKind::Withdrawal => account.daily_withdrawal_used = new_used,
            LimitKind::Deposit => account.daily_deposit_used = new_used,
        }

        Ok(account.clone())
    }
}
