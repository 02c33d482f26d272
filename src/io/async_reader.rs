//! Asynchronous operation-script reader with batch interface
//!
//! Provides streaming batch reads over an operation script for the
//! concurrent processing strategy, built on csv-async. Format concerns
//! live in the csv_format module; invalid rows are logged to stderr and
//! skipped so a bad row never stops the session.

use crate::io::csv_format::{convert_operation, OperationCsvRecord, OperationRequest};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// Asynchronous operation-script reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a reader over async CSV data
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self { csv_reader }
    }

    /// Read up to `batch_size` operation requests
    ///
    /// # Returns
    ///
    /// Successfully converted requests, in script order. An empty vector
    /// signals end of file.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<OperationRequest> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<OperationCsvRecord>();

        while batch.len() < batch_size {
            match records.next().await {
                Some(Ok(record)) => match convert_operation(record) {
                    Ok(request) => batch.push(request),
                    Err(e) => eprintln!("Record conversion error: {}", e),
                },
                Some(Err(e)) => eprintln!("CSV parse error: {}", e),
                None => break,
            }
        }

        batch
    }
}
