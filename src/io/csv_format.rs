//! CSV format handling for operation scripts and the session report
//!
//! This module centralizes all CSV format concerns, providing:
//! - OperationCsvRecord structure for deserialization
//! - Conversion from CSV rows to typed operation requests
//! - Session report serialization (accounts + remaining inventory)
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::types::{Account, AccountNumber, Denomination};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Write;

/// One row of an operation script
///
/// Matches the input CSV format with columns:
/// `op,account,pin,amount,from_denom,to_denom,quantity,token`
///
/// Every column except `op` is optional; which ones are required depends
/// on the operation and is enforced in [`convert_operation`].
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OperationCsvRecord {
    pub op: String,
    pub account: Option<AccountNumber>,
    pub pin: Option<String>,
    pub amount: Option<u64>,
    pub from_denom: Option<Denomination>,
    pub to_denom: Option<Denomination>,
    pub quantity: Option<u32>,
    pub token: Option<String>,
}

/// A fully-typed operation request, ready for the engine
#[derive(Debug, Clone, PartialEq)]
pub enum OperationRequest {
    /// Verify a PIN against an account
    Authenticate { account: AccountNumber, pin: String },
    /// Withdraw cash from an account
    Withdraw { account: AccountNumber, amount: u64 },
    /// Deposit cash into an account
    Deposit { account: AccountNumber, amount: u64 },
    /// Swap notes between denominations
    Exchange {
        from: Denomination,
        to: Denomination,
        quantity: u32,
    },
    /// Issue a QR token for later pickup
    QrIssue { account: AccountNumber, amount: u64 },
    /// Redeem a QR token; `None` redeems the most recently issued one
    QrRedeem { token: Option<String> },
}

/// Convert an OperationCsvRecord to an OperationRequest
///
/// Validates that the columns each operation needs are present. The `op`
/// column is matched case-insensitively.
///
/// # Returns
///
/// * `Ok(OperationRequest)` - Successfully converted request
/// * `Err(String)` - Description of the missing or invalid column
pub fn convert_operation(record: OperationCsvRecord) -> Result<OperationRequest, String> {
    let require_account = || {
        record
            .account
            .ok_or_else(|| format!("'{}' requires an account", record.op))
    };
    let require_amount = || {
        record
            .amount
            .ok_or_else(|| format!("'{}' requires an amount", record.op))
    };

    match record.op.to_lowercase().as_str() {
        "authenticate" => Ok(OperationRequest::Authenticate {
            account: require_account()?,
            pin: record
                .pin
                .clone()
                .ok_or_else(|| format!("'{}' requires a pin", record.op))?,
        }),
        "withdraw" => Ok(OperationRequest::Withdraw {
            account: require_account()?,
            amount: require_amount()?,
        }),
        "deposit" => Ok(OperationRequest::Deposit {
            account: require_account()?,
            amount: require_amount()?,
        }),
        "exchange" => Ok(OperationRequest::Exchange {
            from: record
                .from_denom
                .ok_or_else(|| "'exchange' requires a from_denom".to_string())?,
            to: record
                .to_denom
                .ok_or_else(|| "'exchange' requires a to_denom".to_string())?,
            quantity: record
                .quantity
                .ok_or_else(|| "'exchange' requires a quantity".to_string())?,
        }),
        "qr_issue" => Ok(OperationRequest::QrIssue {
            account: require_account()?,
            amount: require_amount()?,
        }),
        "qr_redeem" => Ok(OperationRequest::QrRedeem {
            token: record.token.filter(|t| !t.is_empty()),
        }),
        _ => Err(format!("Invalid operation: '{}'", record.op)),
    }
}

/// Write the end-of-session report
///
/// The report has two CSV sections separated by a blank line:
///
/// 1. Accounts, sorted by account number:
///    `account_number,holder_name,balance,withdrawal_used,deposit_used`
/// 2. Remaining inventory, ascending by denomination:
///    `denomination,count`
///
/// Monetary values are written with two decimal places.
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_report(
    accounts: &[Account],
    inventory: &BTreeMap<Denomination, u32>,
    output: &mut dyn Write,
) -> Result<(), String> {
    use csv::Writer;

    {
        let mut writer = Writer::from_writer(&mut *output);
        writer
            .write_record([
                "account_number",
                "holder_name",
                "balance",
                "withdrawal_used",
                "deposit_used",
            ])
            .map_err(|e| format!("Failed to write report header: {}", e))?;

        let mut sorted = accounts.to_vec();
        sorted.sort_by_key(|account| account.account_number);

        for account in sorted {
            writer
                .write_record(&[
                    account.account_number.to_string(),
                    account.holder_name.clone(),
                    format!("{:.2}", account.balance),
                    format!("{:.2}", account.daily_withdrawal_used),
                    format!("{:.2}", account.daily_deposit_used),
                ])
                .map_err(|e| format!("Failed to write account record: {}", e))?;
        }
        writer
            .flush()
            .map_err(|e| format!("Failed to flush output: {}", e))?;
    }

    writeln!(output).map_err(|e| format!("Failed to write section separator: {}", e))?;

    let mut writer = Writer::from_writer(output);
    writer
        .write_record(["denomination", "count"])
        .map_err(|e| format!("Failed to write inventory header: {}", e))?;
    for (denomination, count) in inventory {
        writer
            .write_record(&[denomination.to_string(), count.to_string()])
            .map_err(|e| format!("Failed to write inventory record: {}", e))?;
    }
    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal::Decimal;

    fn record(op: &str) -> OperationCsvRecord {
        OperationCsvRecord {
            op: op.to_string(),
            account: Some(1001),
            pin: Some("1234".to_string()),
            amount: Some(500),
            from_denom: Some(500),
            to_denom: Some(100),
            quantity: Some(2),
            token: Some("AB12CD34".to_string()),
        }
    }

    #[rstest]
    #[case::withdraw("withdraw", OperationRequest::Withdraw { account: 1001, amount: 500 })]
    #[case::deposit("deposit", OperationRequest::Deposit { account: 1001, amount: 500 })]
    #[case::case_insensitive("WITHDRAW", OperationRequest::Withdraw { account: 1001, amount: 500 })]
    #[case::exchange(
        "exchange",
        OperationRequest::Exchange { from: 500, to: 100, quantity: 2 }
    )]
    #[case::qr_issue("qr_issue", OperationRequest::QrIssue { account: 1001, amount: 500 })]
    #[case::qr_redeem(
        "qr_redeem",
        OperationRequest::QrRedeem { token: Some("AB12CD34".to_string()) }
    )]
    fn test_convert_operation_valid(#[case] op: &str, #[case] expected: OperationRequest) {
        assert_eq!(convert_operation(record(op)), Ok(expected));
    }

    #[test]
    fn test_convert_authenticate() {
        let request = convert_operation(record("authenticate")).unwrap();
        assert_eq!(
            request,
            OperationRequest::Authenticate {
                account: 1001,
                pin: "1234".to_string()
            }
        );
    }

    #[test]
    fn test_qr_redeem_empty_token_means_last_issued() {
        let mut rec = record("qr_redeem");
        rec.token = Some(String::new());
        assert_eq!(
            convert_operation(rec),
            Ok(OperationRequest::QrRedeem { token: None })
        );
    }

    #[rstest]
    #[case::missing_account("withdraw", |r: &mut OperationCsvRecord| r.account = None, "requires an account")]
    #[case::missing_amount("deposit", |r: &mut OperationCsvRecord| r.amount = None, "requires an amount")]
    #[case::missing_pin("authenticate", |r: &mut OperationCsvRecord| r.pin = None, "requires a pin")]
    #[case::missing_quantity("exchange", |r: &mut OperationCsvRecord| r.quantity = None, "requires a quantity")]
    #[case::unknown_op("open_vault", |_: &mut OperationCsvRecord| {}, "Invalid operation")]
    fn test_convert_operation_errors(
        #[case] op: &str,
        #[case] mutate: fn(&mut OperationCsvRecord),
        #[case] expected_error: &str,
    ) {
        let mut rec = record(op);
        mutate(&mut rec);

        let err = convert_operation(rec).unwrap_err();
        assert!(err.contains(expected_error), "got: {}", err);
    }

    #[test]
    fn test_write_report_sections() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let mut alice = Account::new(
            1001,
            "1234",
            "Alice Carter",
            Decimal::new(8800, 0),
            Decimal::new(20000, 0),
            Decimal::new(300000, 0),
            today,
        );
        alice.daily_withdrawal_used = Decimal::new(2700, 0);
        alice.daily_deposit_used = Decimal::new(1500, 0);
        let accounts = vec![alice];
        let inventory = BTreeMap::from([(100, 18), (500, 9), (2000, 4)]);

        let mut output = Vec::new();
        write_report(&accounts, &inventory, &mut output).unwrap();

        let expected = "\
account_number,holder_name,balance,withdrawal_used,deposit_used\n\
1001,Alice Carter,8800.00,2700.00,1500.00\n\
\n\
denomination,count\n\
100,18\n\
500,9\n\
2000,4\n";
        assert_eq!(String::from_utf8(output).unwrap(), expected);
    }

    #[test]
    fn test_write_report_sorts_accounts() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let accounts = vec![
            Account::new(
                2002,
                "0",
                "Bob Lane",
                Decimal::ZERO,
                Decimal::ZERO,
                Decimal::ZERO,
                today,
            ),
            Account::new(
                1001,
                "0",
                "Alice Carter",
                Decimal::ZERO,
                Decimal::ZERO,
                Decimal::ZERO,
                today,
            ),
        ];

        let mut output = Vec::new();
        write_report(&accounts, &BTreeMap::new(), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let alice = text.find("1001").unwrap();
        let bob = text.find("2002").unwrap();
        assert!(alice < bob);
    }
}
