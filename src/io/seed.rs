//! Seed file loading for accounts and cash inventory
//!
//! Sessions start from two seed CSVs: one describing the customer accounts
//! and one describing the notes loaded into the machine. Both are small
//! files read eagerly at startup, unlike the operation script which is
//! streamed.

use crate::core::inventory::CashInventory;
use crate::types::{Account, AccountNumber, Denomination};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// One row of the accounts seed file
///
/// Columns: `account_number,pin,holder_name,balance,daily_withdrawal_limit,daily_deposit_limit`
///
/// Monetary columns are kept as strings and parsed into `Decimal`
/// explicitly so a bad value reports which account it belongs to.
#[derive(Debug, Deserialize)]
struct AccountSeedRecord {
    account_number: AccountNumber,
    pin: String,
    holder_name: String,
    balance: String,
    daily_withdrawal_limit: String,
    daily_deposit_limit: String,
}

/// One row of the inventory seed file
///
/// Columns: `denomination,count`
#[derive(Debug, Deserialize)]
struct InventorySeedRecord {
    denomination: Denomination,
    count: u32,
}

fn parse_money(value: &str, column: &str, account: AccountNumber) -> Result<Decimal, String> {
    Decimal::from_str(value.trim())
        .map_err(|_| format!("Invalid {} '{}' for account {}", column, value, account))
}

/// Load the accounts seed file
///
/// # Arguments
///
/// * `path` - Path to the accounts CSV
/// * `today` - Date the daily counters start from
///
/// # Returns
///
/// * `Ok(Vec<Account>)` - All seeded accounts, with zero daily usage
/// * `Err(String)` - File or parse error
pub fn load_accounts(path: &Path, today: NaiveDate) -> Result<Vec<Account>, String> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

    let mut accounts = Vec::new();
    for (index, row) in reader.deserialize::<AccountSeedRecord>().enumerate() {
        let record = row.map_err(|e| format!("Line {}: CSV parse error: {}", index + 2, e))?;

        let balance = parse_money(&record.balance, "balance", record.account_number)?;
        let withdrawal_limit = parse_money(
            &record.daily_withdrawal_limit,
            "daily_withdrawal_limit",
            record.account_number,
        )?;
        let deposit_limit = parse_money(
            &record.daily_deposit_limit,
            "daily_deposit_limit",
            record.account_number,
        )?;

        accounts.push(Account::new(
            record.account_number,
            record.pin,
            record.holder_name,
            balance,
            withdrawal_limit,
            deposit_limit,
            today,
        ));
    }

    Ok(accounts)
}

/// Load the inventory seed file
///
/// # Returns
///
/// * `Ok(CashInventory)` - Inventory with one slot per listed denomination
/// * `Err(String)` - File or parse error
pub fn load_inventory(path: &Path) -> Result<CashInventory, String> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

    let mut slots = Vec::new();
    for (index, row) in reader.deserialize::<InventorySeedRecord>().enumerate() {
        let record = row.map_err(|e| format!("Line {}: CSV parse error: {}", index + 2, e))?;
        slots.push((record.denomination, record.count));
    }

    Ok(CashInventory::with_stock(slots))
}
