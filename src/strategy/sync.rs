//! Synchronous processing strategy
//!
//! This module provides a single-threaded implementation of the
//! ProcessingStrategy trait. It orchestrates a session by coordinating the
//! seed loaders, the SyncReader over the operation script, and the
//! TransactionEngine, then writes the end-of-session report.
//!
//! Operations are applied strictly in script order. A `qr_redeem` row
//! without a token redeems the most recently issued one, which lets a
//! script exercise the issue/redeem flow without knowing generated codes.

use crate::core::TransactionEngine;
use crate::io::csv_format::{write_report, OperationRequest};
use crate::io::seed::{load_accounts, load_inventory};
use crate::io::sync_reader::SyncReader;
use crate::strategy::{ProcessingStrategy, SessionFiles};
use crate::types::AtmError;
use chrono::Utc;
use std::io::Write;

/// Single-threaded session processing
///
/// Streams the operation script row by row; memory usage is
/// O(accounts + issued tokens + history), not O(script size).
#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy;

/// Apply one request to the engine
///
/// `last_token` tracks the most recently issued QR code so a tokenless
/// `qr_redeem` row can resolve it.
fn dispatch(
    engine: &mut TransactionEngine,
    request: OperationRequest,
    last_token: &mut Option<String>,
) -> Result<(), AtmError> {
    match request {
        OperationRequest::Authenticate { account, pin } => {
            engine.authenticate(account, &pin)?;
        }
        OperationRequest::Withdraw { account, amount } => {
            engine.withdraw(account, amount)?;
        }
        OperationRequest::Deposit { account, amount } => {
            engine.deposit(account, amount)?;
        }
        OperationRequest::Exchange { from, to, quantity } => {
            engine.exchange(from, to, quantity)?;
        }
        OperationRequest::QrIssue { account, amount } => {
            let token = engine.qr_issue(account, amount)?;
            *last_token = Some(token.token);
        }
        OperationRequest::QrRedeem { token } => {
            let code = token
                .or_else(|| last_token.clone())
                .ok_or_else(|| AtmError::token_not_found(""))?;
            engine.qr_redeem(&code)?;
        }
    }
    Ok(())
}

impl ProcessingStrategy for SyncProcessingStrategy {
    /// Run a session from the given files and write the report to output
    ///
    /// Fatal errors (missing files, malformed seed data) are returned
    /// immediately. Individual operation failures are logged to stderr
    /// and the session continues with the next row.
    fn process(&self, files: &SessionFiles, output: &mut dyn Write) -> Result<(), String> {
        let today = Utc::now().date_naive();

        let accounts = load_accounts(&files.accounts, today)?;
        let inventory = load_inventory(&files.inventory)?;
        let mut engine = TransactionEngine::new(
            crate::core::AccountLedger::with_accounts(accounts),
            inventory,
        );

        let reader = SyncReader::new(&files.operations)?;
        let mut last_token: Option<String> = None;

        for result in reader {
            match result {
                Ok(request) => {
                    if let Err(e) = dispatch(&mut engine, request, &mut last_token) {
                        eprintln!("Operation error: {}", e);
                    }
                }
                Err(e) => {
                    eprintln!("CSV parsing error: {}", e);
                }
            }
        }

        write_report(&engine.accounts(), &engine.inventory(), output)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    const OPS_HEADER: &str = "op,account,pin,amount,from_denom,to_denom,quantity,token\n";

    fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("Failed to create file");
        file.write_all(content.as_bytes())
            .expect("Failed to write file");
        path
    }

    fn session(dir: &TempDir, ops: &str) -> SessionFiles {
        let accounts = write_file(
            dir,
            "accounts.csv",
            "account_number,pin,holder_name,balance,daily_withdrawal_limit,daily_deposit_limit\n\
             1001,1234,Alice Carter,10000.00,20000,300000\n",
        );
        let inventory = write_file(dir, "inventory.csv", "denomination,count\n100,20\n500,10\n2000,5\n");
        let operations = write_file(dir, "ops.csv", &format!("{}{}", OPS_HEADER, ops));
        SessionFiles {
            accounts,
            inventory,
            operations,
        }
    }

    #[test]
    fn test_sync_strategy_full_session() {
        let dir = TempDir::new().unwrap();
        let files = session(&dir, "withdraw,1001,,2700,,,,\ndeposit,1001,,1500,,,,\n");

        let mut output = Vec::new();
        SyncProcessingStrategy.process(&files, &mut output).unwrap();

        let report = String::from_utf8(output).unwrap();
        assert!(report.contains("1001,Alice Carter,8800.00,2700.00,1500.00"));
        assert!(report.contains("100,18"));
        assert!(report.contains("500,9"));
        assert!(report.contains("2000,4"));
    }

    #[test]
    fn test_sync_strategy_qr_flow_redeems_last_issued() {
        let dir = TempDir::new().unwrap();
        let files = session(&dir, "qr_issue,1001,,1000,,,,\nqr_redeem,,,,,,,\n");

        let mut output = Vec::new();
        SyncProcessingStrategy.process(&files, &mut output).unwrap();

        let report = String::from_utf8(output).unwrap();
        assert!(report.contains("1001,Alice Carter,9000.00,1000.00,0.00"));
    }

    #[test]
    fn test_sync_strategy_continues_after_failed_operation() {
        let dir = TempDir::new().unwrap();
        // The 250 is not composable from the loaded notes; the session
        // still runs the next row
        let files = session(&dir, "withdraw,1001,,250,,,,\ndeposit,1001,,500,,,,\n");

        let mut output = Vec::new();
        SyncProcessingStrategy.process(&files, &mut output).unwrap();

        let report = String::from_utf8(output).unwrap();
        assert!(report.contains("1001,Alice Carter,10500.00,0.00,500.00"));
    }

    #[test]
    fn test_sync_strategy_missing_seed_file() {
        let dir = TempDir::new().unwrap();
        let mut files = session(&dir, "");
        files.accounts = Path::new("nonexistent.csv").to_path_buf();

        let mut output = Vec::new();
        let err = SyncProcessingStrategy
            .process(&files, &mut output)
            .unwrap_err();
        assert!(err.contains("Failed to open file"));
    }

    #[test]
    fn test_sync_strategy_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SyncProcessingStrategy>();
    }
}
