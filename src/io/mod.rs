//! Input/output handling for seed files, operation scripts, and reports
//!
//! This module contains the file-facing layer of the engine:
//!
//! - **seed**: eager loading of the account and inventory seed CSVs
//! - **csv_format**: row structures, request conversion, report writing
//! - **sync_reader**: streaming iterator over an operation script
//! - **async_reader**: streaming batch reads for concurrent processing

pub mod async_reader;
pub mod csv_format;
pub mod seed;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{convert_operation, write_report, OperationCsvRecord, OperationRequest};
pub use seed::{load_accounts, load_inventory};
pub use sync_reader::SyncReader;
