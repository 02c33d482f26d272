//! Processing strategy module for ATM session processing
//!
//! This module defines the Strategy pattern for complete session
//! processing pipelines: seed loading, operation-script parsing, engine
//! dispatch, and report output. This allows different processing
//! implementations (synchronous, asynchronous batch) to be selected at
//! runtime.

use crate::cli::StrategyType;
use std::io::Write;
use std::path::PathBuf;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// The three input files a session runs from
///
/// Accounts and inventory are seed files read eagerly at startup; the
/// operation script is streamed.
#[derive(Debug, Clone)]
pub struct SessionFiles {
    /// Accounts seed CSV
    pub accounts: PathBuf,
    /// Cash inventory seed CSV
    pub inventory: PathBuf,
    /// Operation script CSV
    pub operations: PathBuf,
}

/// Processing strategy trait for complete session pipelines
///
/// Each strategy loads the seed files, runs every operation in the script
/// through the appropriate engine, and writes the end-of-session report to
/// the provided output.
pub trait ProcessingStrategy: Send + Sync {
    /// Run a session from the given files and write the report to output
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the session completed (individual operation failures
    ///   are logged to stderr and do not abort the session)
    /// * `Err(String)` if a fatal error occurred (missing file, I/O error,
    ///   malformed seed data)
    fn process(&self, files: &SessionFiles, output: &mut dyn Write) -> Result<(), String>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create
/// * `config` - Optional configuration for async batch processing
///   (ignored for sync)
///
/// # Returns
///
/// A boxed trait object implementing the ProcessingStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config))
        }
    }
}
