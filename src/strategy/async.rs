//! Asynchronous batch processing strategy
//!
//! This module provides an implementation of the ProcessingStrategy trait
//! that reads the operation script in batches through csv-async and runs
//! it against the thread-safe `AsyncTransactionEngine` on a tokio
//! multi-threaded runtime.
//!
//! Batches are read and applied in script order. Within a batch the
//! requests are also applied in order: unlike a per-client payments
//! workload, every operation here can touch the single shared cash
//! inventory, so reordering would change which withdrawals find stock.
//! The concurrent engine still earns its keep when the strategy is
//! embedded in a service handling interactive sessions; in this pipeline
//! it guarantees the same results as the synchronous strategy.

use crate::core::r#async::{AsyncAccountLedger, AsyncTransactionEngine};
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::{write_report, OperationRequest};
use crate::io::seed::{load_accounts, load_inventory};
use crate::strategy::{ProcessingStrategy, SessionFiles};
use crate::types::AtmError;
use chrono::Utc;
use std::io::Write;

/// Configuration for batch processing
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of script rows per batch
    pub batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { batch_size: 1000 }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig, falling back to the default on zero
    pub fn new(batch_size: usize) -> Self {
        if batch_size == 0 {
            let default = Self::default();
            eprintln!(
                "Warning: Invalid batch_size ({}), using default ({})",
                batch_size, default.batch_size
            );
            return default;
        }
        Self { batch_size }
    }
}

/// Batched session processing on a tokio runtime
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    /// Create a strategy with the specified batch configuration
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }
}

/// Apply one request to the engine
async fn dispatch(
    engine: &AsyncTransactionEngine,
    request: OperationRequest,
    last_token: &mut Option<String>,
) -> Result<(), AtmError> {
    match request {
        OperationRequest::Authenticate { account, pin } => {
            engine.authenticate(account, &pin)?;
        }
        OperationRequest::Withdraw { account, amount } => {
            engine.withdraw(account, amount).await?;
        }
        OperationRequest::Deposit { account, amount } => {
            engine.deposit(account, amount).await?;
        }
        OperationRequest::Exchange { from, to, quantity } => {
            engine.exchange(from, to, quantity).await?;
        }
        OperationRequest::QrIssue { account, amount } => {
            let token = engine.qr_issue(account, amount).await?;
            *last_token = Some(token.token);
        }
        OperationRequest::QrRedeem { token } => {
            let code = token
                .or_else(|| last_token.clone())
                .ok_or_else(|| AtmError::token_not_found(""))?;
            engine.qr_redeem(&code).await?;
        }
    }
    Ok(())
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Run a session from the given files and write the report to output
    ///
    /// Fatal errors (missing files, malformed seed data, runtime
    /// construction) are returned immediately. Individual operation
    /// failures are logged to stderr and the session continues.
    fn process(&self, files: &SessionFiles, output: &mut dyn Write) -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let today = Utc::now().date_naive();
            let accounts = load_accounts(&files.accounts, today)?;
            let inventory = load_inventory(&files.inventory)?;
            let engine =
                AsyncTransactionEngine::new(AsyncAccountLedger::with_accounts(accounts), inventory);

            let file = tokio::fs::File::open(&files.operations).await.map_err(|e| {
                format!(
                    "Failed to open file '{}': {}",
                    files.operations.display(),
                    e
                )
            })?;
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut last_token: Option<String> = None;
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for request in batch {
                    if let Err(e) = dispatch(&engine, request, &mut last_token).await {
                        eprintln!("Operation error: {}", e);
                    }
                }
            }

            write_report(&engine.accounts(), &engine.inventory().await, output)?;

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
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
             1001,1234,Alice Carter,10000.00,20000,300000\n\
             2002,5678,Bob Lane,1000.00,5000,50000\n",
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
    fn test_async_strategy_full_session() {
        let dir = TempDir::new().unwrap();
        let files = session(&dir, "withdraw,1001,,2700,,,,\ndeposit,2002,,1500,,,,\n");

        let strategy = AsyncProcessingStrategy::new(BatchConfig::default());
        let mut output = Vec::new();
        strategy.process(&files, &mut output).unwrap();

        let report = String::from_utf8(output).unwrap();
        assert!(report.contains("1001,Alice Carter,7300.00,2700.00,0.00"));
        assert!(report.contains("2002,Bob Lane,2500.00,0.00,1500.00"));
        assert!(report.contains("2000,4"));
    }

    #[test]
    fn test_async_strategy_small_batches_keep_script_order() {
        let dir = TempDir::new().unwrap();
        // The deposit must land before the second withdrawal or the limit
        // check rejects it
        let files = session(
            &dir,
            "withdraw,2002,,800,,,,\ndeposit,2002,,5000,,,,\nwithdraw,2002,,4000,,,,\n",
        );

        let strategy = AsyncProcessingStrategy::new(BatchConfig::new(1));
        let mut output = Vec::new();
        strategy.process(&files, &mut output).unwrap();

        let report = String::from_utf8(output).unwrap();
        assert!(report.contains("2002,Bob Lane,1200.00,4800.00,5000.00"));
    }

    #[test]
    fn test_async_strategy_missing_ops_file() {
        let dir = TempDir::new().unwrap();
        let mut files = session(&dir, "");
        files.operations = dir.path().join("missing.csv");

        let strategy = AsyncProcessingStrategy::new(BatchConfig::default());
        let mut output = Vec::new();
        let err = strategy.process(&files, &mut output).unwrap_err();
        assert!(err.contains("Failed to open file"));
    }

    #[test]
    fn test_batch_config_zero_falls_back_to_default() {
        let config = BatchConfig::new(0);
        assert_eq!(config.batch_size, BatchConfig::default().batch_size);
    }
}
