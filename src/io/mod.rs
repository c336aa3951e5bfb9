//! Record readers and writers.
//!
//! All three formats share one capability contract: a [`RecordSink`] accepts
//! records until it is closed, a [`RecordSource`] yields records until it is
//! exhausted. Exhaustion is `Ok(None)`, never an error.

use anyhow::Result;
use std::path::Path;

pub mod compression;
pub mod framing;
pub mod schema;

#[cfg_attr(docsrs, doc(cfg(feature = "io-jsonl")))]
#[cfg(feature = "io-jsonl")]
pub mod jsonl;

#[cfg_attr(docsrs, doc(cfg(feature = "io-csv")))]
#[cfg(feature = "io-csv")]
pub mod csv;

#[cfg_attr(docsrs, doc(cfg(feature = "io-binary")))]
#[cfg(feature = "io-binary")]
pub mod binary;

/// Write side of the record contract.
///
/// `Record` is the verbatim unit of the format: CSV fields, a raw JSON line
/// without its terminator, or a raw frame payload.
pub trait RecordSink {
    type Record;

    /// Append one record.
    ///
    /// # Errors
    /// Returns an error if the record cannot be encoded or written.
    fn write_record(&mut self, record: &Self::Record) -> Result<()>;

    /// Flush all layers and release the underlying handle.
    ///
    /// # Errors
    /// Returns an error if any buffered bytes cannot be written.
    fn close(self) -> Result<()>;
}

/// Read side of the record contract.
pub trait RecordSource {
    type Record;

    /// Next record, or `None` once the source is exhausted.
    ///
    /// # Errors
    /// Returns an error for malformed input or I/O failures.
    fn read_record(&mut self) -> Result<Option<Self::Record>>;

    /// Release the underlying handle.
    ///
    /// # Errors
    /// Returns an error if releasing the handle fails.
    fn close(self) -> Result<()>;
}

/// `" in <path>"` for readers opened from a file, empty for plain streams.
pub(crate) fn located(path: Option<&Path>) -> String {
    path.map(|p| format!(" in {}", p.display())).unwrap_or_default()
}
