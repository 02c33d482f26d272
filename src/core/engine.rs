//! Transaction processing engine
//!
//! This module provides the `TransactionEngine` that orchestrates the four
//! operation families (withdraw, deposit, denomination exchange, QR
//! issue/redeem) over the account ledger, the cash inventory, the QR token
//! registry, and the append-only history.
//!
//! Every operation is a short-lived, single-pass transaction:
//! Validate -> Reserve -> Commit -> Record. Commits either fully apply or
//! fully abort; when the second half of a two-part commit fails, the first
//! half is reversed with a compensating update before the failure is
//! surfaced, so no operation can leave a balance debited without cash
//! actually dispensed.
//!
//! Time-dependent operations take their clock from `Utc::now()` in the
//! public methods; each has an `*_at` variant accepting an explicit instant
//! so behavior at day boundaries and token expiry is deterministic in
//! tests.

use crate::core::allocator::allocate;
use crate::core::history::TransactionLog;
use crate::core::inventory::CashInventory;
use crate::core::ledger::AccountLedger;
use crate::core::qr_store::QrTokenStore;
use crate::types::{
    Account, AccountNumber, AtmError, Denomination, DepositReceipt, ExchangeReceipt, LimitKind,
    QrRedeemReceipt, QrToken, TransactionRecord, TransactionType, WithdrawalReceipt,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Largest deposit accepted in a single transaction, in whole currency units
pub const DEPOSIT_CAP: u64 = 200_000;

/// Orchestrates ATM operations over the ledger, inventory, tokens, and history
///
/// The engine owns its stores; all access is mediated through explicit
/// operations, with no ambient globals. One engine models one logical ATM
/// with a single shared cash supply.
pub struct TransactionEngine {
    ledger: AccountLedger,
    inventory: CashInventory,
    tokens: QrTokenStore,
    history: TransactionLog,
}

impl TransactionEngine {
    /// Create an engine over seeded accounts and cash
    pub fn new(ledger: AccountLedger, inventory: CashInventory) -> Self {
        TransactionEngine {
            ledger,
            inventory,
            tokens: QrTokenStore::new(),
            history: TransactionLog::new(),
        }
    }

    // ------------------------------------------------------------------
    // Query surface
    // ------------------------------------------------------------------

    /// Authenticate a customer (PIN + active account)
    pub fn authenticate(&mut self, account: AccountNumber, pin: &str) -> Result<Account, AtmError> {
        self.authenticate_at(account, pin, Utc::now())
    }

    /// [`authenticate`](Self::authenticate) with an explicit clock
    pub fn authenticate_at(
        &mut self,
        account: AccountNumber,
        pin: &str,
        now: DateTime<Utc>,
    ) -> Result<Account, AtmError> {
        self.ledger.authenticate(account, pin, now.date_naive())
    }

    /// Load an account's current state
    pub fn account(&mut self, account: AccountNumber) -> Result<Account, AtmError> {
        self.ledger.load(account, Utc::now().date_naive())
    }

    /// All accounts sorted by account number, for reporting
    pub fn accounts(&self) -> Vec<Account> {
        self.ledger.all_accounts()
    }

    /// Current note counts per denomination
    pub fn inventory(&self) -> BTreeMap<Denomination, u32> {
        self.inventory.snapshot().counts
    }

    /// Total cash value held by the machine
    pub fn inventory_value(&self) -> u64 {
        self.inventory.total_value()
    }

    /// Preview which notes a withdrawal of `amount` would dispense
    ///
    /// Pure read over the current inventory; commits nothing.
    pub fn preview_allocation(
        &self,
        amount: u64,
    ) -> Result<BTreeMap<Denomination, u32>, AtmError> {
        allocate(amount, &self.inventory.snapshot().counts)
    }

    /// Recent history for one account, most recent first
    pub fn history_for(
        &self,
        account: AccountNumber,
        limit: usize,
    ) -> Vec<TransactionRecord> {
        self.history.history_for(account, limit)
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Withdraw cash against an account balance
    pub fn withdraw(
        &mut self,
        account: AccountNumber,
        amount: u64,
    ) -> Result<WithdrawalReceipt, AtmError> {
        self.withdraw_at(account, amount, Utc::now())
    }

    /// [`withdraw`](Self::withdraw) with an explicit clock
    pub fn withdraw_at(
        &mut self,
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
    }

    /// Deposit cash into an account
    ///
    /// Deposited notes are not denomination-tracked, so the inventory is
    /// untouched; only the balance and the daily deposit counter move.
    pub fn deposit(
        &mut self,
        account: AccountNumber,
        amount: u64,
    ) -> Result<DepositReceipt, AtmError> {
        self.deposit_at(account, amount, Utc::now())
    }

    /// [`deposit`](Self::deposit) with an explicit clock
    pub fn deposit_at(
        &mut self,
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

        self.history.append(TransactionRecord {
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
    /// Trades physical notes, not funds: no account balance is involved and
    /// the operation is account-agnostic. The commit is a single balanced
    /// inventory delta, applied atomically. Value smaller than one target
    /// note is lost to floor rounding and reported in the receipt's
    /// `remainder`.
    pub fn exchange(
        &mut self,
        from: Denomination,
        to: Denomination,
        quantity: u32,
    ) -> Result<ExchangeReceipt, AtmError> {
        self.exchange_at(from, to, quantity, Utc::now())
    }

    /// [`exchange`](Self::exchange) with an explicit clock
    pub fn exchange_at(
        &mut self,
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

        // (2^32 - 1)^2 fits in u64, so this cannot overflow
        let total_value = u64::from(from) * u64::from(quantity);
        let resulting = total_value / u64::from(to);
        if resulting == 0 {
            return Err(AtmError::ExchangeTooSmall {
                value: total_value,
                to,
            });
        }
        // More notes than any slot can physically hold
        let resulting_notes = u32::try_from(resulting).map_err(|_| {
            AtmError::insufficient_stock(to, self.inventory.count(to), u32::MAX)
        })?;

        // Both denominations must already be known slots
        if !self.inventory.has_slot(from) {
            return Err(AtmError::UnknownDenomination { denomination: from });
        }
        if !self.inventory.has_slot(to) {
            return Err(AtmError::UnknownDenomination { denomination: to });
        }

        // Single balanced delta: notes handed in come in, target notes go
        // out, together or not at all
        let delta = BTreeMap::from([
            (from, i64::from(quantity)),
            (to, -i64::from(resulting_notes)),
        ]);
        self.inventory.apply_delta(&delta)?;

        let remainder = total_value - u64::from(resulting_notes) * u64::from(to);

        self.history.append(TransactionRecord {
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
    ///
    /// Runs the full withdrawal validation, including whether the amount is
    /// currently dispensable, but commits nothing; balance and inventory
    /// may change before redemption, so everything is re-validated then.
    pub fn qr_issue(&mut self, account: AccountNumber, amount: u64) -> Result<QrToken, AtmError> {
        self.qr_issue_at(account, amount, Utc::now())
    }

    /// [`qr_issue`](Self::qr_issue) with an explicit clock
    pub fn qr_issue_at(
        &mut self,
        account: AccountNumber,
        amount: u64,
        now: DateTime<Utc>,
    ) -> Result<QrToken, AtmError> {
        self.validate_withdrawal(account, amount, now.date_naive())?;
        allocate(amount, &self.inventory.snapshot().counts)?;

        Ok(self.tokens.issue(account, amount, now))
    }

    /// Redeem a QR token for cash
    ///
    /// The token must be present, unused, and unexpired; the withdrawal is
    /// then re-validated and committed against the token's account and
    /// amount. The token flips to used only after the withdrawal commits:
    /// if the withdrawal fails, the token remains unused and redeemable
    /// until it expires.
    pub fn qr_redeem(&mut self, code: &str) -> Result<QrRedeemReceipt, AtmError> {
        self.qr_redeem_at(code, Utc::now())
    }

    /// [`qr_redeem`](Self::qr_redeem) with an explicit clock
    pub fn qr_redeem_at(
        &mut self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<QrRedeemReceipt, AtmError> {
        let token = self.tokens.redeemable(code, now)?;

        let receipt = self.process_withdrawal(
            token.account_number,
            token.amount,
            TransactionType::QrWithdrawal,
            Some(format!("QR Cash Withdrawal - Token: {}", code)),
            now,
        )?;
        self.tokens.mark_used(code, now)?;

        Ok(QrRedeemReceipt {
            token: code.to_string(),
            amount: token.amount,
            dispensed: receipt.dispensed,
            balance_after: receipt.balance_after,
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Validate phase shared by withdraw and QR issue
    ///
    /// Checks amount, account existence, balance, and the daily withdrawal
    /// limit, in that order. Mutates nothing beyond the lazy daily reset.
    fn validate_withdrawal(
        &mut self,
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

    /// Full withdrawal pipeline: Validate -> Reserve -> Commit -> Record
    fn process_withdrawal(
        &mut self,
        account: AccountNumber,
        amount: u64,
        tx_type: TransactionType,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<WithdrawalReceipt, AtmError> {
        let today = now.date_naive();
        self.validate_withdrawal(account, amount, today)?;

        // Reserve: plan against a snapshot; Unsatisfiable aborts with
        // nothing mutated
        let plan = allocate(amount, &self.inventory.snapshot().counts)?;

        self.settle_withdrawal(account, amount, plan, tx_type, description, now)
    }

    /// Commit + Record phase for a withdrawal with an already-reserved plan
    ///
    /// Debits the ledger, then decrements the inventory. If the inventory
    /// commit fails the ledger debit is reversed with a compensating update
    /// and the inventory failure is surfaced.
    fn settle_withdrawal(
        &mut self,
        account: AccountNumber,
        amount: u64,
        plan: BTreeMap<Denomination, u32>,
        tx_type: TransactionType,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<WithdrawalReceipt, AtmError> {
        let today = now.date_naive();
        let amount_dec = Decimal::from(amount);

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
        if let Err(stock_err) = self.inventory.apply_delta(&delta) {
            // Compensating reversal: credit the balance back and release
            // the daily usage before surfacing the inventory failure
            self.ledger.apply_balance_change(
                account,
                amount_dec,
                LimitKind::Withdrawal,
                -amount_dec,
                today,
            )?;
            return Err(stock_err);
        }

        self.history.append(TransactionRecord {
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
