//! # recfile
//!
//! A **record-oriented file I/O layer** for Rust. recfile writes and reads
//! sequences of records in three wire formats, each optionally gzip-compressed,
//! and splits record files into bounded parts that join back byte for byte.
//!
//! ## Key Features
//!
//! - **CSV** - header-aware rows with named field access and value pipelines
//! - **JSON Lines** - typed (Serde) and raw line access, tolerant of a missing final newline
//! - **Length-prefixed binary** - 4-byte big-endian framed payloads with pluggable codecs
//! - **Transparent gzip** - chosen by `.gz` suffix for files, explicitly for streams
//! - **Split / join** - shard a file into parts of at most N records and reassemble it
//!
//! ## Quick Start
//!
//! ```no_run
//! use recfile::*;
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! // Write a compressed CSV file
//! let mut w = create_csv_file("scores.csv.gz", ValuePipeline::sentinel_encoding())?;
//! w.write(["name", "score"])?;
//! w.write(["alice", "10"])?;
//! w.write(["bob", ""])?;
//! w.close()?;
//!
//! // Read it back with named fields
//! let mut table = open_csv_file("scores.csv.gz", ValuePipeline::sentinel_decoding())?
//!     .read_header()?;
//! while let Some(row) = table.next_record()? {
//!     println!("{} -> {}", row.field("name", "?"), row.field("score", "0"));
//! }
//!
//! // Split into parts of 1000 rows, then join them back
//! let parts = split_csv_file("scores.csv.gz", 1000, |n| format!("scores.{n}.csv.gz").into())?;
//! join_csv_files("scores.joined.csv.gz", &parts)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Readers and writers
//!
//! Every format has a writer bound to any [`std::io::Write`] sink and a reader
//! bound to any [`std::io::Read`] source, plus `create_*_file` / `open_*_file`
//! helpers for paths. Readers return `Ok(None)` once exhausted; exhaustion is
//! never an error. Writers must be closed to flush every layer: closing
//! flushes the buffer above the compressor, finishes the gzip stream, flushes
//! the buffer below it and hands the sink back.
//!
//! ### Schemas
//!
//! A [`Schema`] maps header names to positions. It is detached from any
//! reader, so rows obtained elsewhere can still be read by field name.
//!
//! ### Split and join
//!
//! [`partition::split`] and [`partition::join`] are written once against the
//! [`RecordSource`] / [`RecordSink`] contract and instantiated per format.
//! Split is all-or-nothing: on failure no part files are left behind.
//!
//! ## Feature Flags
//!
//! - `io-csv` - CSV readers and writers (requires the `csv` crate)
//! - `io-jsonl` - JSON Lines readers and writers
//! - `io-binary` - framed binary readers and writers with the postcard codec
//!
//! ## Module Overview
//!
//! - [`config`] - block size, gzip suffix, JSON marshaling options
//! - [`io`] - compression layer, framing and the per-format readers and writers
//! - [`normalize`] - value processors for CSV cells
//! - [`partition`] - split and join
//! - [`testing`] - temporary files, fixtures and failure injection for tests

pub mod config;
pub mod io;
pub mod normalize;
pub mod partition;
pub mod testing;

// General re-exports
pub use config::{FILE_RW_BLOCK_SIZE, GZIP_SUFFIX, JsonOptions};
pub use io::compression::{Compression, InputStream, OutputStream};
pub use io::framing::{FrameCodec, FrameError, RawCodec};
pub use io::schema::{Record, Schema};
pub use io::{RecordSink, RecordSource};
pub use partition::{PartFormat, join, part_namer, split};

// Gated re-exports
#[cfg(feature = "io-csv")]
pub use io::csv::{
    CsvReader, CsvTable, CsvWriter, ValuePipeline, ValueProcessor, create_csv_file, open_csv_file,
};

#[cfg(feature = "io-csv")]
pub use partition::{CsvFormat, join_csv_files, split_csv_file};

#[cfg(feature = "io-jsonl")]
pub use io::jsonl::{JsonlReader, JsonlWriter, create_jsonl_file, open_jsonl_file};

#[cfg(feature = "io-jsonl")]
pub use partition::{JsonlFormat, join_jsonl_files, split_jsonl_file};

#[cfg(feature = "io-binary")]
pub use io::binary::{BinaryReader, BinaryWriter, create_binary_file, open_binary_file};

#[cfg(feature = "io-binary")]
pub use io::framing::PostcardCodec;

#[cfg(feature = "io-binary")]
pub use partition::{BinaryFormat, join_binary_files, split_binary_file};
