use crate::strategy::{BatchConfig, SessionFiles};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Run ATM operation scripts against seeded accounts and cash
#[derive(Parser, Debug)]
#[command(name = "atm-engine")]
#[command(about = "Run ATM operation scripts against seeded accounts and cash", long_about = None)]
pub struct CliArgs {
    /// Operation script CSV
    #[arg(value_name = "OPERATIONS", help = "Path to the operation script CSV")]
    pub operations: PathBuf,

    /// Accounts seed CSV
    #[arg(
        long = "accounts",
        value_name = "FILE",
        default_value = "accounts.csv",
        help = "Path to the accounts seed CSV"
    )]
    pub accounts: PathBuf,

    /// Cash inventory seed CSV
    #[arg(
        long = "inventory",
        value_name = "FILE",
        default_value = "inventory.csv",
        help = "Path to the cash inventory seed CSV"
    )]
    pub inventory: PathBuf,

    /// Processing strategy to use for the session
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for synchronous or 'async' for asynchronous"
    )]
    pub strategy: StrategyType,

    /// Number of script rows per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of script rows per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,
}

/// Available session processing strategies
#[derive(Clone, Debug, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Bundle the three input paths for the strategy layer
    pub fn to_session_files(&self) -> SessionFiles {
        SessionFiles {
            accounts: self.accounts.clone(),
            inventory: self.inventory.clone(),
            operations: self.operations.clone(),
        }
    }

    /// Create a BatchConfig from CLI arguments
    ///
    /// Uses the provided batch size, or the default when none was given.
    pub fn to_batch_config(&self) -> BatchConfig {
        match self.batch_size {
            Some(batch_size) => BatchConfig::new(batch_size),
            None => BatchConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::default_strategy(&["program", "ops.csv"], StrategyType::Async)]
    #[case::explicit_sync(&["program", "--strategy", "sync", "ops.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["program", "--strategy", "async", "ops.csv"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        match (&parsed.strategy, &expected) {
            (StrategyType::Sync, StrategyType::Sync) => (),
            (StrategyType::Async, StrategyType::Async) => (),
            _ => panic!("Expected {:?}, got {:?}", expected, parsed.strategy),
        }
    }

    #[test]
    fn test_default_seed_paths() {
        let parsed = CliArgs::try_parse_from(["program", "ops.csv"]).unwrap();
        let files = parsed.to_session_files();

        assert_eq!(files.operations, PathBuf::from("ops.csv"));
        assert_eq!(files.accounts, PathBuf::from("accounts.csv"));
        assert_eq!(files.inventory, PathBuf::from("inventory.csv"));
    }

    #[test]
    fn test_custom_seed_paths() {
        let parsed = CliArgs::try_parse_from([
            "program",
            "--accounts",
            "seeds/customers.csv",
            "--inventory",
            "seeds/cash.csv",
            "ops.csv",
        ])
        .unwrap();
        let files = parsed.to_session_files();

        assert_eq!(files.accounts, PathBuf::from("seeds/customers.csv"));
        assert_eq!(files.inventory, PathBuf::from("seeds/cash.csv"));
    }

    #[rstest]
    #[case::default_size(&["program", "ops.csv"], 1000)]
    #[case::custom_size(&["program", "--batch-size", "2000", "ops.csv"], 2000)]
    #[case::zero_falls_back(&["program", "--batch-size", "0", "ops.csv"], 1000)]
    fn test_batch_config_conversion(#[case] args: &[&str], #[case] expected: usize) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.to_batch_config().batch_size, expected);
    }

    #[rstest]
    #[case::missing_operations(&["program"])]
    #[case::invalid_strategy(&["program", "--strategy", "invalid", "ops.csv"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
