//! Concurrent transaction engine
//!
//! This module provides the `AsyncTransactionEngine`, the concurrent
//! counterpart of the synchronous engine. It coordinates the same four
//! operation families over thread-safe stores so sessions touching
//! different resources proceed in parallel:
//!
//! ```text
//! AsyncTransactionEngine
//!     ├── Arc<AsyncAccountLedger>        (per-account entry locks)
//!     ├── Arc<Mutex<CashInventory>>      (single shared cash supply)
//!     ├── Arc<DashMap<String, QrToken>>  (per-token entry locks)
//!     └── Arc<Mutex<TransactionLog>>     (append-only history)
//! ```
//!
//! # Concurrency
//!
//! Withdrawals plan against an inventory snapshot outside the lock and
//! commit with a version check; a snapshot invalidated by a concurrent
//! commit surfaces as the retryable `ConcurrentModification`, with the
//! ledger debit reversed first. QR redemption claims the token under its
//! entry lock before touching money, so two racing redemptions of the same
//! token can never both dispense; a claim whose withdrawal fails is rolled
//! back, leaving the token redeemable until it expires.
//!
//! The engine is cloneable and shares its stores through `Arc`, matching
//! how it is handed to concurrent batch tasks.

use crate::core::allocator::allocate;
use crate::core::history::TransactionLog;
use crate::core::inventory::CashInventory;
use crate::types::{
    Account, AccountNumber, AtmError, Denomination, DepositReceipt, ExchangeReceipt, LimitKind,
    QrRedeemReceipt, QrToken, TransactionRecord, TransactionType, WithdrawalReceipt,
};
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::ledger::AsyncAccountLedger;
use crate::core::engine::DEPOSIT_CAP;
use crate::core::qr_store::TOKEN_CODE_LEN;

/// Concurrent ATM engine sharing its stores across tasks
#[derive(Debug, Clone)]
pub struct AsyncTransactionEngine {
    /// Per-account entry-locked ledger
    ledger: Arc<AsyncAccountLedger>,

    /// The single shared cash supply; held only for snapshot and commit
    inventory: Arc<Mutex<CashInventory>>,

    /// Issued QR tokens, claimed under their entry lock at redemption
    tokens: Arc<DashMap<String, QrToken>>,

    /// Append-only record of committed operations
    history: Arc<Mutex<TransactionLog>>,
}

impl AsyncTransactionEngine {
    /// Create an engine over seeded accounts and cash
    pub fn new(ledger: AsyncAccountLedger, inventory: CashInventory) -> Self {
        Self {
            ledger: Arc::new(ledger),
            inventory: Arc::new(Mutex::new(inventory)),
            tokens: Arc::new(DashMap::new()),
            history: Arc::new(Mutex::new(TransactionLog::new())),
        }
    }

    // ------------------------------------------------------------------
    // Query surface
    // ------------------------------------------------------------------

    /// Authenticate a customer (PIN + active account)
    pub fn authenticate(&self, account: AccountNumber, pin: &str) -> Result<Account, AtmError> {
        self.authenticate_at(account, pin, Utc::now())
    }

    /// [`authenticate`](Self::authenticate) with an explicit clock
    pub fn authenticate_at(
        &self,
        account: AccountNumber,
        pin: &str,
        now: DateTime<Utc>,
    ) -> Result<Account, AtmError> {
        self.ledger.authenticate(account, pin, now.date_naive())
    }

    /// Look up one account by number
    pub fn account(&self, account: AccountNumber) -> Result<Account, AtmError> {
        self.ledger.load(account, Utc::now().date_naive())
    }

    /// All accounts sorted by account number, for reporting
    pub fn accounts(&self) -> Vec<Account> {
        self.ledger.all_accounts()
    }

    /// Current note counts per denomination
    pub async fn inventory(&self) -> BTreeMap<Denomination, u32> {
        self.inventory.lock().await.snapshot().counts
    }

    /// Total cash value held by the machine
    pub async fn inventory_value(&self) -> u64 {
        self.inventory.lock().await.total_value()
    }

    /// Preview which notes a withdrawal of `amount` would dispense
    ///
    /// Pure read over a snapshot; commits nothing. The answer can be stale
    /// by the time a real withdrawal commits, which then re-plans from a
    /// fresh snapshot.
    pub async fn preview_allocation(
        &self,
        amount: u64,
    ) -> Result<BTreeMap<Denomination, u32>, AtmError> {
        allocate(amount, &self.inventory.lock().await.snapshot().counts)
    }

    /// Recent history for one account, most recent first
    pub async fn history_for(
        &self,
        account: AccountNumber,
        limit: usize,
    ) -> Vec<TransactionRecord> {
        self.history.lock().await.history_for(account, limit)
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Withdraw cash against an account balance
    pub async fn withdraw(
        &self,
        account: AccountNumber,
        amount: u64,
    ) -> Result<WithdrawalReceipt, AtmError> {
        self.withdraw_at(account, amount, Utc::now()).await
    }

    /// [`withdraw`](Self::withdraw) with an explicit clock
    pub async fn withdraw_at(
        &self,
        account: AccountNumber,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<WithdrawalReceipt, AtmError> {
        self.process_withdrawal(
            account,
            amount,
            TransactionType::Withdrawal,
            Some("ATM Withdrawal".to_string()),
            now,
        )
        .await
    }

    /// Deposit cash into an account
    pub async fn deposit(
        &self,
        account: AccountNumber,
        amount: u64,
    ) -> Result<DepositReceipt, AtmError> {
        self.deposit_at(account, amount, Utc::now()).await
    }

    /// [`deposit`](Self::deposit) with an explicit clock
    pub async fn deposit_at(
        &self,
        account: AccountNumber,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<DepositReceipt, AtmError> {
        if amount == 0 {
            return Err(AtmError::InvalidAmount { amount });
        }
        if amount > DEPOSIT_CAP {
            return Err(AtmError::DepositCapExceeded {
                amount,
                cap: DEPOSIT_CAP,
            });
        }

        let amount_dec = Decimal::from(amount);
        let updated = self.ledger.apply_balance_change(
            account,
            amount_dec,
            LimitKind::Deposit,
            amount_dec,
            now.date_naive(),
        )?;

        self.history.lock().await.append(TransactionRecord {
            account_number: Some(account),
            tx_type: TransactionType::Deposit,
            amount: amount_dec,
            balance_after: Some(updated.balance),
            description: Some("Cash Deposit".to_string()),
            timestamp: now,
        });

        Ok(DepositReceipt {
            balance_after: updated.balance,
        })
    }

    /// Swap notes of one denomination for another
    ///
    /// The inventory lock is held across validation and commit, so the
    /// exchange needs no version check.
    pub async fn exchange(
        &self,
        from: Denomination,
        to: Denomination,
        quantity: u32,
    ) -> Result<ExchangeReceipt, AtmError> {
        self.exchange_at(from, to, quantity, Utc::now()).await
    }

    /// [`exchange`](Self::exchange) with an explicit clock
    pub async fn exchange_at(
        &self,
        from: Denomination,
        to: Denomination,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<ExchangeReceipt, AtmError> {
        if quantity == 0 {
            return Err(AtmError::InvalidAmount {
                amount: u64::from(quantity),
            });
        }
        if from == to {
            return Err(AtmError::SameDenomination { denomination: from });
        }

        let total_value = u64::from(from) * u64::from(quantity);
        let resulting = total_value / u64::from(to);
        if resulting == 0 {
            return Err(AtmError::ExchangeTooSmall {
                value: total_value,
                to,
            });
        }

        let resulting_notes = {
            let mut inventory = self.inventory.lock().await;

            let resulting_notes = u32::try_from(resulting).map_err(|_| {
                AtmError::insufficient_stock(to, inventory.count(to), u32::MAX)
            })?;
            if !inventory.has_slot(from) {
                return Err(AtmError::UnknownDenomination { denomination: from });
            }
            if !inventory.has_slot(to) {
                return Err(AtmError::UnknownDenomination { denomination: to });
            }

            let delta = BTreeMap::from([
                (from, i64::from(quantity)),
                (to, -i64::from(resulting_notes)),
            ]);
            inventory.apply_delta(&delta)?;
            resulting_notes
        };

        let remainder = total_value - u64::from(resulting_notes) * u64::from(to);

        self.history.lock().await.append(TransactionRecord {
            account_number: None,
            tx_type: TransactionType::Exchange,
            amount: Decimal::from(total_value),
            balance_after: None,
            description: Some(format!(
                "Exchanged {}x{} for {}x{}",
                quantity, from, resulting_notes, to
            )),
            timestamp: now,
        });

        Ok(ExchangeReceipt {
            from,
            to,
            quantity,
            dispensed_notes: resulting_notes,
            total_value,
            remainder,
        })
    }

    /// Issue a QR token for a pre-authorized withdrawal
    pub async fn qr_issue(
        &self,
        account: AccountNumber,
        amount: u64,
    ) -> Result<QrToken, AtmError> {
        self.qr_issue_at(account, amount, Utc::now()).await
    }

    /// [`qr_issue`](Self::qr_issue) with an explicit clock
    pub async fn qr_issue_at(
        &self,
        account: AccountNumber,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<QrToken, AtmError> {
        self.validate_withdrawal(account, amount, now.date_naive())?;
        allocate(amount, &self.inventory.lock().await.snapshot().counts)?;

        // Insert through the vacant entry so a code can never be claimed
        // by two issuers
        loop {
            let code: String = Uuid::new_v4()
                .simple()
                .to_string()
                .chars()
                .take(TOKEN_CODE_LEN)
                .collect::<String>()
                .to_uppercase();
            match self.tokens.entry(code.clone()) {
                dashmap::mapref::entry::Entry::Occupied(_) => continue,
                dashmap::mapref::entry::Entry::Vacant(vacant) => {
                    let token = QrToken::new(code, account, amount, now);
                    vacant.insert(token.clone());
                    return Ok(token);
                }
            }
        }
    }

    /// Redeem a QR token for cash
    pub async fn qr_redeem(&self, code: &str) -> Result<QrRedeemReceipt, AtmError> {
        self.qr_redeem_at(code, Utc::now()).await
    }

    /// [`qr_redeem`](Self::qr_redeem) with an explicit clock
    pub async fn qr_redeem_at(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<QrRedeemReceipt, AtmError> {
        // Claim under the token's entry lock; of two racing redemptions
        // exactly one gets past this point
        let claimed = {
            let mut entry = self
                .tokens
                .get_mut(code)
                .ok_or_else(|| AtmError::token_not_found(code))?;
            if entry.is_used {
                return Err(AtmError::token_already_used(code));
            }
            if entry.is_expired(now) {
                return Err(AtmError::token_expired(code));
            }
            entry.is_used = true;
            entry.used_at = Some(now);
            entry.clone()
        };

        let settled = self
            .process_withdrawal(
                claimed.account_number,
                claimed.amount,
                TransactionType::QrWithdrawal,
                Some(format!("QR Cash Withdrawal - Token: {}", code)),
                now,
            )
            .await;

        match settled {
            Ok(receipt) => Ok(QrRedeemReceipt {
                token: code.to_string(),
                amount: claimed.amount,
                dispensed: receipt.dispensed,
                balance_after: receipt.balance_after,
            }),
            Err(err) => {
                // Roll back the claim; the token stays redeemable until
                // it expires
                if let Some(mut entry) = self.tokens.get_mut(code) {
                    entry.is_used = false;
                    entry.used_at = None;
                }
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Validate phase shared by withdraw and QR issue
    fn validate_withdrawal(
        &self,
        account: AccountNumber,
        amount: u64,
        today: NaiveDate,
    ) -> Result<Account, AtmError> {
        if amount == 0 {
            return Err(AtmError::InvalidAmount { amount });
        }

        let state = self.ledger.load(account, today)?;
        let amount_dec = Decimal::from(amount);

        if state.balance < amount_dec {
            return Err(AtmError::insufficient_balance(
                account,
                state.balance,
                amount_dec,
            ));
        }
        if state.daily_withdrawal_used + amount_dec > state.daily_withdrawal_limit {
            return Err(AtmError::daily_limit_exceeded(
                account,
                LimitKind::Withdrawal,
                state.daily_withdrawal_used,
                state.daily_withdrawal_limit,
                amount_dec,
            ));
        }

        Ok(state)
    }

    /// Full withdrawal pipeline with an optimistic inventory commit
    ///
    /// The plan is computed against a versioned snapshot taken under a
    /// brief lock; the commit re-takes the lock and applies the delta only
    /// if the version is unchanged. A conflicting commit in between
    /// surfaces as `ConcurrentModification` after the ledger debit has
    /// been reversed; callers may retry.
    async fn process_withdrawal(
        &self,
        account: AccountNumber,
        amount: u64,
        tx_type: TransactionType,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<WithdrawalReceipt, AtmError> {
        let today = now.date_naive();
        self.validate_withdrawal(account, amount, today)?;

        // Reserve against a versioned snapshot
        let snapshot = self.inventory.lock().await.snapshot();
        let plan = allocate(amount, &snapshot.counts)?;
        let amount_dec = Decimal::from(amount);

        // Debit first; the account entry lock makes this atomic
        let updated = self.ledger.apply_balance_change(
            account,
            -amount_dec,
            LimitKind::Withdrawal,
            amount_dec,
            today,
        )?;

        let delta: BTreeMap<Denomination, i64> = plan
            .iter()
            .map(|(denom, count)| (*denom, -i64::from(*count)))
            .collect();
        let commit = self
            .inventory
            .lock()
            .await
            .apply_delta_versioned(snapshot.version, &delta);
        if let Err(inventory_err) = commit {
            // Compensating reversal before surfacing the failure
            self.ledger.apply_balance_change(
                account,
                amount_dec,
                LimitKind::Withdrawal,
                -amount_dec,
                today,
            )?;
            return Err(inventory_err);
        }

        self.history.lock().await.append(TransactionRecord {
            account_number: Some(account),
            tx_type,
            amount: amount_dec,
            balance_after: Some(updated.balance),
            description,
            timestamp: now,
        });

        Ok(WithdrawalReceipt {
            dispensed: plan,
            balance_after: updated.balance,
        })
    }
}
