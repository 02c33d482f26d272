//! ATM Engine CLI
//!
//! Command-line interface for running ATM operation scripts against seeded
//! account and cash-inventory CSV files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- ops.csv > report.csv
//! cargo run -- --strategy sync ops.csv > report.csv
//! cargo run -- --accounts seeds/accounts.csv --inventory seeds/cash.csv ops.csv > report.csv
//! cargo run -- --strategy async --batch-size 2000 ops.csv > report.csv
//! ```
//!
//! The program seeds the ledger and cash inventory from the two seed files,
//! applies every operation in the script through the selected processing
//! strategy, and writes the end-of-session report to stdout.
//!
//! # Processing Strategies
//!
//! - **sync**: Single-threaded streaming over the script
//! - **async**: Batched reading on a tokio runtime (default)
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Fatal error (missing file, malformed seed data, etc.)

use atm_engine::cli;
use atm_engine::strategy;
use std::process;

fn main() {
    // Parse command-line arguments using clap
    let args = cli::parse_args();

    let files = args.to_session_files();

    // Create the appropriate processing strategy based on CLI arguments
    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, config)
    };

    // Run the session; the report goes to stdout
    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&files, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
