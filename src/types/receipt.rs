//! Success payloads returned by engine operations
//!
//! Each mutating operation returns a receipt describing exactly what
//! changed, so the presentation layer can render results without re-reading
//! engine state.

use super::transaction::Denomination;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Result of a committed withdrawal (card or QR)
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalReceipt {
    /// Notes dispensed, by denomination
    pub dispensed: BTreeMap<Denomination, u32>,

    /// Account balance after the debit
    pub balance_after: Decimal,
}

/// Result of a committed deposit
#[derive(Debug, Clone, PartialEq)]
pub struct DepositReceipt {
    /// Account balance after the credit
    pub balance_after: Decimal,
}

/// Result of a committed denomination exchange
///
/// `remainder` is the value lost to floor rounding: an exchange of
/// `quantity` x `from` notes produces `floor(value / to)` target notes, and
/// anything smaller than one target note is not returned. The field makes
/// that loss explicit instead of silently discarding it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeReceipt {
    /// Denomination the customer handed in
    pub from: Denomination,

    /// Denomination the machine dispensed
    pub to: Denomination,

    /// Notes handed in
    pub quantity: u32,

    /// Target notes dispensed
    pub dispensed_notes: u32,

    /// Total value of the notes handed in
    pub total_value: u64,

    /// Value below one target note that the exchange did not return
    pub remainder: u64,
}

/// Result of a committed QR redemption
#[derive(Debug, Clone, PartialEq)]
pub struct QrRedeemReceipt {
    /// The token that was consumed
    pub token: String,

    /// The pre-authorized amount that was dispensed
    pub amount: u64,

    /// Notes dispensed, by denomination
    pub dispensed: BTreeMap<Denomination, u32>,

    /// Account balance after the debit
    pub balance_after: Decimal,
}
