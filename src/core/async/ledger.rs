//! Thread-safe account ledger for concurrent session processing
//!
//! This module provides the `AsyncAccountLedger` struct, the concurrent
//! counterpart of the synchronous ledger. Account state lives in a
//! `DashMap`, so sessions touching different accounts proceed in parallel
//! while operations on the same account serialize on its entry lock.
//!
//! The validation and mutation rules are identical to the synchronous
//! ledger: the lazy daily reset runs before every read or write, and a
//! balance change commits together with its daily-usage bookkeeping or not
//! at all.

use crate::types::{Account, AccountNumber, AtmError, LimitKind};
use chrono::NaiveDate;
use dashmap::DashMap;
use rust_decimal::Decimal;

/// Concurrent account store with per-account entry locking
///
/// Accounts are seeded up front; the ledger never creates or deletes them.
/// Methods take `&self`: all synchronization happens inside the `DashMap`,
/// so the ledger can sit behind an `Arc` and be shared across tasks.
#[derive(Debug, Default)]
pub struct AsyncAccountLedger {
    /// Concurrent map of account numbers to account state
    accounts: DashMap<AccountNumber, Account>,
}

impl AsyncAccountLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger from seeded accounts
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let ledger = Self::new();
        for account in accounts {
            ledger.accounts.insert(account.account_number, account);
        }
        ledger
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
    ///
    /// The result is a snapshot; entries may change as soon as their locks
    /// are released.
    pub fn all_accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by_key(|account| account.account_number);
        accounts
    }

    /// Run a closure against an account while holding its entry lock
    ///
    /// The lazy daily reset is applied before the closure runs, so every
    /// limit check inside sees the current day's counters. No other task
    /// can observe a partially-updated account while the closure executes.
    fn with_entry<T, F>(
        &self,
        account_number: AccountNumber,
        today: NaiveDate,
        f: F,
    ) -> Result<T, AtmError>
    where
        F: FnOnce(&mut Account) -> Result<T, AtmError>,
    {
        let mut entry = self
            .accounts
            .get_mut(&account_number)
            .ok_or(AtmError::AccountNotFound {
                account: account_number,
            })?;
        entry.reset_daily_usage_if_stale(today);
        f(entry.value_mut())
    }

    /// Load a copy of an account's current state
    pub fn load(
        &self,
        account_number: AccountNumber,
        today: NaiveDate,
    ) -> Result<Account, AtmError> {
        self.with_entry(account_number, today, |account| Ok(account.clone()))
    }

    /// Authenticate a customer
    ///
    /// All failure causes collapse into `AuthenticationFailed`, matching
    /// the synchronous ledger.
    pub fn authenticate(
        &self,
        account_number: AccountNumber,
        pin: &str,
        today: NaiveDate,
    ) -> Result<Account, AtmError> {
        let failed = AtmError::AuthenticationFailed {
            account: account_number,
        };

        self.with_entry(account_number, today, |account| {
            if account.pin != pin || !account.is_active {
                return Err(failed.clone());
            }
            Ok(account.clone())
        })
        .map_err(|_| failed)
    }

    /// Apply a balance change together with its daily-usage bookkeeping
    ///
    /// Validation and commit run under the account's entry lock, so two
    /// concurrent debits can never both pass the balance check against the
    /// same funds. Semantics match the synchronous ledger, including the
    /// compensating direction via a negative `limit_delta`.
    pub fn apply_balance_change(
        &self,
        account_number: AccountNumber,
        delta: Decimal,
        kind: LimitKind,
        limit_delta: Decimal,
        today: NaiveDate,
    ) -> Result<Account, AtmError> {
        self.with_entry(account_number, today, |account| {
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
                LimitKind::Withdrawal => {
                    (account.daily_withdrawal_used, account.daily_withdrawal_limit)
                }
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

            account.balance = new_balance;
            match kind {
                LimitKind::Withdrawal => account.daily_withdrawal_used = new_used,
                LimitKind::Deposit => account.daily_deposit_used = new_used,
            }

            Ok(account.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
    }

    fn seeded_ledger() -> AsyncAccountLedger {
        AsyncAccountLedger::with_accounts([Account::new(
            1001,
            "1234",
            "Alice Carter",
            Decimal::new(1000, 0),
            Decimal::new(5000, 0),
            Decimal::new(50000, 0),
            today(),
        )])
    }

    #[test]
    fn test_authenticate_success() {
        let ledger = seeded_ledger();
        let account = ledger.authenticate(1001, "1234", today()).unwrap();
        assert_eq!(account.holder_name, "Alice Carter");
    }

    #[test]
    fn test_authenticate_collapses_failures() {
        let ledger = seeded_ledger();

        let err = ledger.authenticate(1001, "9999", today()).unwrap_err();
        assert_eq!(err, AtmError::AuthenticationFailed { account: 1001 });

        let err = ledger.authenticate(4242, "1234", today()).unwrap_err();
        assert_eq!(err, AtmError::AuthenticationFailed { account: 4242 });
    }

    #[test]
    fn test_apply_balance_change_matches_sync_semantics() {
        let ledger = seeded_ledger();

        let updated = ledger
            .apply_balance_change(
                1001,
                Decimal::new(-600, 0),
                LimitKind::Withdrawal,
                Decimal::new(600, 0),
                today(),
            )
            .unwrap();
        assert_eq!(updated.balance, Decimal::new(400, 0));
        assert_eq!(updated.daily_withdrawal_used, Decimal::new(600, 0));

        let err = ledger
            .apply_balance_change(
                1001,
                Decimal::new(-500, 0),
                LimitKind::Withdrawal,
                Decimal::new(500, 0),
                today(),
            )
            .unwrap_err();
        assert!(matches!(err, AtmError::InsufficientBalance { .. }));
    }

    #[test]
    fn test_concurrent_debits_cannot_overdraw() {
        let ledger = Arc::new(seeded_ledger());
        let mut handles = vec![];

        // 20 threads each try to withdraw 100 from a balance of 1000
        for _ in 0..20 {
            let ledger = Arc::clone(&ledger);
            handles.push(thread::spawn(move || {
                ledger.apply_balance_change(
                    1001,
                    Decimal::new(-100, 0),
                    LimitKind::Withdrawal,
                    Decimal::new(100, 0),
                    today(),
                )
            }));
        }

        let mut successful = 0;
        let mut failed = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok(_) => successful += 1,
                Err(AtmError::InsufficientBalance { .. }) => failed += 1,
                Err(e) => panic!("unexpected error: {:?}", e),
            }
        }

        assert_eq!(successful, 10);
        assert_eq!(failed, 10);

        let account = ledger.load(1001, today()).unwrap();
        assert_eq!(account.balance, Decimal::ZERO);
        assert_eq!(account.daily_withdrawal_used, Decimal::new(1000, 0));
    }

    #[test]
    fn test_concurrent_updates_different_accounts() {
        let ledger = Arc::new(AsyncAccountLedger::with_accounts((0..10).map(|i| {
            Account::new(
                1000 + i,
                "0000",
                format!("Holder {}", i),
                Decimal::new(1000, 0),
                Decimal::new(5000, 0),
                Decimal::new(50000, 0),
                today(),
            )
        })));

        let mut handles = vec![];
        for i in 0..10 {
            let ledger = Arc::clone(&ledger);
            handles.push(thread::spawn(move || {
                ledger
                    .apply_balance_change(
                        1000 + i,
                        Decimal::new(500, 0),
                        LimitKind::Deposit,
                        Decimal::new(500, 0),
                        today(),
                    )
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        for account in ledger.all_accounts() {
            assert_eq!(account.balance, Decimal::new(1500, 0));
        }
    }

    #[test]
    fn test_all_accounts_sorted() {
        let ledger = AsyncAccountLedger::with_accounts([
            Account::new(
                2002,
                "0000",
                "Bob Lane",
                Decimal::ZERO,
                Decimal::ZERO,
                Decimal::ZERO,
                today(),
            ),
            Account::new(
                1001,
                "0000",
                "Alice Carter",
                Decimal::ZERO,
                Decimal::ZERO,
                Decimal::ZERO,
                today(),
            ),
        ]);

        let accounts = ledger.all_accounts();
        assert_eq!(accounts[0].account_number, 1001);
        assert_eq!(accounts[1].account_number, 2002);
    }
}
