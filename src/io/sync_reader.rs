//! Synchronous operation-script reader with iterator interface
//!
//! Provides a streaming iterator over operation requests from a CSV
//! script. Delegates format concerns to the csv_format module.
//!
//! Rows are read one at a time; memory usage is O(1) per row rather than
//! O(file size). Fatal errors (file not found) are returned from `new()`;
//! per-row parse and conversion errors are yielded as `Err` items with the
//! offending line number, so a bad row never stops the session.

use crate::io::csv_format::{convert_operation, OperationCsvRecord, OperationRequest};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Streaming reader over an operation script
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl SyncReader {
    /// Open an operation script for streaming iteration
    ///
    /// The CSV reader trims whitespace and allows flexible field counts,
    /// since most columns are only meaningful for some operations.
    ///
    /// # Returns
    ///
    /// * `Ok(SyncReader)` if the file opened successfully
    /// * `Err(String)` if it could not be opened
    pub fn new(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 0,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<OperationRequest, String>;

    /// Get the next operation request from the script
    ///
    /// # Returns
    ///
    /// * `Some(Ok(OperationRequest))` - Successfully parsed row
    /// * `Some(Err(String))` - Parse or conversion error with line number
    /// * `None` - End of file reached
    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<OperationCsvRecord>();

        match deserializer.next()? {
            Ok(record) => {
                self.line_num += 1;
                Some(
                    convert_operation(record)
                        .map_err(|e| format!("Line {}: {}", self.line_num + 1, e)),
                )
            }
            Err(e) => {
                self.line_num += 1;
                Some(Err(format!(
                    "Line {}: CSV parse error: {}",
                    self.line_num + 1,
                    e
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "op,account,pin,amount,from_denom,to_denom,quantity,token\n";

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_sync_reader_new_fails_on_missing_file() {
        let result = SyncReader::new(Path::new("nonexistent.csv"));
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[test]
    fn test_sync_reader_iterates_operations() {
        let csv_content = format!(
            "{}withdraw,1001,,2700,,,,\ndeposit,1001,,1500,,,,\nexchange,,,,500,100,2,\n",
            HEADER
        );
        let file = create_temp_csv(&csv_content);

        let reader = SyncReader::new(file.path()).unwrap();
        let requests: Vec<_> = reader.filter_map(Result::ok).collect();

        assert_eq!(
            requests,
            vec![
                OperationRequest::Withdraw {
                    account: 1001,
                    amount: 2700
                },
                OperationRequest::Deposit {
                    account: 1001,
                    amount: 1500
                },
                OperationRequest::Exchange {
                    from: 500,
                    to: 100,
                    quantity: 2
                },
            ]
        );
    }

    #[test]
    fn test_sync_reader_includes_line_numbers_in_errors() {
        let csv_content = format!(
            "{}withdraw,1001,,2700,,,,\nwithdraw,,,100,,,,\ndeposit,1001,,500,,,,\n",
            HEADER
        );
        let file = create_temp_csv(&csv_content);

        let reader = SyncReader::new(file.path()).unwrap();
        let rows: Vec<_> = reader.collect();

        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_ok());
        assert!(rows[2].is_ok());

        let error = rows[1].as_ref().unwrap_err();
        assert!(error.contains("Line 3"));
        assert!(error.contains("requires an account"));
    }

    #[test]
    fn test_sync_reader_continues_after_error() {
        let csv_content = format!(
            "{}withdraw,1001,,2700,,,,\nopen_vault,,,,,,,\ndeposit,1001,,500,,,,\n",
            HEADER
        );
        let file = create_temp_csv(&csv_content);

        let reader = SyncReader::new(file.path()).unwrap();
        let rows: Vec<_> = reader.collect();

        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_ok());
        assert!(rows[1].is_err());
        assert!(rows[2].is_ok());
    }

    #[test]
    fn test_sync_reader_handles_whitespace_and_case() {
        let csv_content = format!("{}  WITHDRAW  ,  1001  ,,  2700  ,,,,\n", HEADER);
        let file = create_temp_csv(&csv_content);

        let reader = SyncReader::new(file.path()).unwrap();
        let requests: Vec<_> = reader.filter_map(Result::ok).collect();

        assert_eq!(
            requests,
            vec![OperationRequest::Withdraw {
                account: 1001,
                amount: 2700
            }]
        );
    }

    #[test]
    fn test_sync_reader_empty_after_header() {
        let file = create_temp_csv(HEADER);

        let reader = SyncReader::new(file.path()).unwrap();
        assert_eq!(reader.count(), 0);
    }
}
