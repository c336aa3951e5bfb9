//! CSV record readers and writers.
//!
//! This module provides:
//! - **Row I/O**: [`CsvWriter`] and [`CsvReader`] over any byte sink/source,
//!   with path helpers [`create_csv_file`] and [`open_csv_file`]
//! - **Header mode**: [`CsvReader::read_header`] turns the first row into a
//!   [`Schema`] and yields named-field [`Record`]s through [`CsvTable`]
//! - **Value pipelines**: [`ValuePipeline`] rewrites every cell on read or write
//!
//! # Design notes
//! - Quoting and escaping are delegated to the `csv` crate (quote-as-needed,
//!   `\n` record terminator). Rows may have differing field counts.
//! - A pipeline is applied to every field, left to right, before a write and
//!   after a read. An empty pipeline leaves cells byte-for-byte intact,
//!   including surrounding whitespace.

use crate::io::compression::{Compression, InputStream, OutputStream, create_file, open_file};
use crate::io::schema::{Record, Schema};
use crate::io::{RecordSink, RecordSource, located};
use crate::normalize;
use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A single cell rewrite step.
pub type ValueProcessor = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Ordered composition of [`ValueProcessor`]s.
///
/// ```
/// use recfile::io::csv::ValuePipeline;
/// use recfile::normalize::{from_sentinel, trim};
///
/// let read_side = ValuePipeline::new().then(trim).then(from_sentinel);
/// assert_eq!(read_side.apply(" # "), "");
/// ```
#[derive(Clone, Default)]
pub struct ValuePipeline {
    steps: Vec<ValueProcessor>,
}

impl ValuePipeline {
    /// Identity pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step; it runs after every step already present.
    #[must_use]
    pub fn then<F>(mut self, step: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.steps.push(Arc::new(step));
        self
    }

    /// Write-side normalization: empty and null-like cells become the sentinel.
    pub fn sentinel_encoding() -> Self {
        Self::new().then(normalize::to_sentinel)
    }

    /// Read-side inverse of [`sentinel_encoding`](Self::sentinel_encoding).
    pub fn sentinel_decoding() -> Self {
        Self::new().then(normalize::trim).then(normalize::from_sentinel)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Run one value through every step.
    pub fn apply(&self, value: &str) -> String {
        let mut v = value.to_string();
        for step in &self.steps {
            v = step(&v);
        }
        v
    }

    /// Run every value through the pipeline, preserving order.
    pub fn apply_all<I, T>(&self, values: I) -> Vec<String>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        values.into_iter().map(|v| self.apply(v.as_ref())).collect()
    }
}

impl fmt::Debug for ValuePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValuePipeline")
            .field("steps", &self.steps.len())
            .finish()
    }
}

/// CSV row writer.
pub struct CsvWriter<W: Write> {
    inner: csv::Writer<OutputStream<W>>,
    pipeline: ValuePipeline,
    rows: u64,
}

impl<W: Write> CsvWriter<W> {
    /// Bind a writer to `sink`.
    pub fn new(sink: W, compression: Compression, pipeline: ValuePipeline) -> Self {
        Self::from_stream(OutputStream::new(sink, compression), pipeline)
    }

    fn from_stream(out: OutputStream<W>, pipeline: ValuePipeline) -> Self {
        let inner = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(out);
        Self {
            inner,
            pipeline,
            rows: 0,
        }
    }

    /// Write one row, after running each field through the pipeline.
    ///
    /// # Errors
    /// Returns an error if the row cannot be written.
    pub fn write<I, T>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let row = self.pipeline.apply_all(fields);
        self.inner
            .write_record(&row)
            .with_context(|| format!("write CSV row #{}", self.rows + 1))?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flush the CSV buffer and every stream layer, returning the sink.
    ///
    /// # Errors
    /// Returns an error if buffered bytes or the gzip trailer cannot be written.
    pub fn close(self) -> Result<W> {
        let out = self
            .inner
            .into_inner()
            .map_err(|e| e.into_error())
            .context("flush CSV writer")?;
        out.finish().context("close CSV writer")
    }
}

/// CSV row reader.
pub struct CsvReader<R: Read> {
    inner: csv::Reader<InputStream<R>>,
    pipeline: ValuePipeline,
    record: StringRecord,
    rows: u64,
    path: Option<PathBuf>,
}

impl<R: Read> CsvReader<R> {
    /// Bind a reader to `source`.
    ///
    /// # Errors
    /// Returns an error if gzip was requested and the header is malformed.
    pub fn new(source: R, compression: Compression, pipeline: ValuePipeline) -> Result<Self> {
        Ok(Self::from_stream(InputStream::open(source, compression)?, pipeline, None))
    }

    fn from_stream(input: InputStream<R>, pipeline: ValuePipeline, path: Option<PathBuf>) -> Self {
        let inner = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(input);
        Self {
            inner,
            pipeline,
            record: StringRecord::new(),
            rows: 0,
            path,
        }
    }

    /// Next row with the pipeline applied, or `None` when exhausted.
    ///
    /// # Errors
    /// Returns an error for malformed CSV or invalid UTF-8.
    pub fn read(&mut self) -> Result<Option<Vec<String>>> {
        let more = self
            .inner
            .read_record(&mut self.record)
            .with_context(|| {
                format!("parse CSV record #{}{}", self.rows + 1, located(self.path.as_deref()))
            })?;
        if !more {
            return Ok(None);
        }
        self.rows += 1;
        Ok(Some(self.pipeline.apply_all(self.record.iter())))
    }

    /// Consume the first row as a header and switch to named-field access.
    ///
    /// # Errors
    /// Returns an error if the source has no rows or the header is malformed.
    pub fn read_header(mut self) -> Result<CsvTable<R>> {
        let Some(header) = self.read()? else {
            bail!("missing CSV header{}", located(self.path.as_deref()));
        };
        Ok(CsvTable {
            schema: Arc::new(Schema::new(header)),
            reader: self,
        })
    }

    /// Rows read so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Release the decoder and return the source.
    pub fn close(self) -> R {
        self.inner.into_inner().into_inner()
    }
}

/// A CSV source whose header has been read.
pub struct CsvTable<R: Read> {
    reader: CsvReader<R>,
    schema: Arc<Schema>,
}

impl<R: Read> CsvTable<R> {
    pub fn header(&self) -> &[String] {
        self.schema.header()
    }

    pub fn index(&self) -> &HashMap<String, usize> {
        self.schema.index()
    }

    /// The header as a detached schema, usable after this table is closed.
    pub fn schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    /// Next data row bound to the header, or `None` when exhausted.
    ///
    /// # Errors
    /// See [`CsvReader::read`].
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        Ok(self.reader.read()?.map(|values| self.schema.record(values)))
    }

    pub fn close(self) -> R {
        self.reader.close()
    }
}

/// Create a CSV file; gzip when `path` ends in `.gz`.
///
/// # Errors
/// Returns an error if the file cannot be created.
pub fn create_csv_file(
    path: impl AsRef<Path>,
    pipeline: ValuePipeline,
) -> Result<CsvWriter<File>> {
    Ok(CsvWriter::from_stream(create_file(path)?, pipeline))
}

/// Open a CSV file; gunzip when `path` ends in `.gz`.
///
/// # Errors
/// Returns an error if the file cannot be opened or its gzip header is malformed.
pub fn open_csv_file(path: impl AsRef<Path>, pipeline: ValuePipeline) -> Result<CsvReader<File>> {
    let path = path.as_ref();
    Ok(CsvReader::from_stream(open_file(path)?, pipeline, Some(path.to_path_buf())))
}

impl<W: Write> RecordSink for CsvWriter<W> {
    type Record = Vec<String>;

    fn write_record(&mut self, record: &Vec<String>) -> Result<()> {
        self.write(record)
    }

    fn close(self) -> Result<()> {
        CsvWriter::close(self).map(drop)
    }
}

impl<R: Read> RecordSource for CsvReader<R> {
    type Record = Vec<String>;

    fn read_record(&mut self) -> Result<Option<Vec<String>>> {
        self.read()
    }

    fn close(self) -> Result<()> {
        drop(CsvReader::close(self));
        Ok(())
    }
}
