//! JSON Lines (JSONL) record readers and writers.
//!
//! This module provides:
//! - **Typed I/O** with Serde: [`JsonlWriter::write`], [`JsonlReader::read`],
//!   [`JsonlReader::read_into`]
//! - **Raw I/O** that never re-encodes: [`JsonlWriter::write_raw`], [`JsonlReader::read_raw`]
//! - Path helpers [`create_jsonl_file`] and [`open_jsonl_file`] (gzip by `.gz` suffix)
//!
//! # Notes
//! - One compact JSON document per line, each terminated by `\n`.
//! - A final line without a terminator is still a record. The reader returns
//!   it and reports exhaustion on the following call.
//! - Marshaling follows the [`JsonOptions`] passed at construction.

use crate::config::JsonOptions;
use crate::io::compression::{Compression, InputStream, OutputStream, create_file, open_file};
use crate::io::{RecordSink, RecordSource, located};
use anyhow::{Context, Result, ensure};
use serde::{Serialize, de::DeserializeOwned};
use std::fs::File;
use std::io::{BufRead, Read, Write};
use std::path::{Path, PathBuf};

const TERMINATOR: u8 = b'\n';

/// JSON Lines writer.
pub struct JsonlWriter<W: Write> {
    out: OutputStream<W>,
    options: JsonOptions,
    line: Vec<u8>,
    count: u64,
}

impl<W: Write> JsonlWriter<W> {
    /// Bind a writer to `sink`.
    pub fn new(sink: W, compression: Compression, options: JsonOptions) -> Self {
        Self::from_stream(OutputStream::new(sink, compression), options)
    }

    fn from_stream(out: OutputStream<W>, options: JsonOptions) -> Self {
        Self {
            out,
            options,
            line: Vec::new(),
            count: 0,
        }
    }

    /// Marshal `value` and write it as one line.
    ///
    /// # Errors
    /// Returns an error if `value` cannot be serialized or the line cannot be written.
    pub fn write<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let encoded = self
            .options
            .marshal(value)
            .with_context(|| format!("serialize item #{}", self.count))?;
        self.emit(&encoded)
    }

    /// Write pre-encoded JSON as one line; only the terminator is added.
    ///
    /// # Errors
    /// Rejects payloads containing `\n`, which would split the record.
    pub fn write_raw(&mut self, raw: &[u8]) -> Result<()> {
        ensure!(
            !raw.contains(&TERMINATOR),
            "raw JSONL item #{} contains a line terminator",
            self.count
        );
        self.emit(raw)
    }

    fn emit(&mut self, payload: &[u8]) -> Result<()> {
        self.line.clear();
        self.line.extend_from_slice(payload);
        self.line.push(TERMINATOR);
        self.out
            .write_all(&self.line)
            .with_context(|| format!("write JSONL item #{}", self.count))?;
        self.count += 1;
        Ok(())
    }

    /// Items written so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Flush every stream layer and return the sink.
    ///
    /// # Errors
    /// Returns an error if buffered bytes or the gzip trailer cannot be written.
    pub fn close(self) -> Result<W> {
        self.out.finish().context("close JSONL writer")
    }
}

/// Where a reader stands relative to the end of its input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ReadState {
    Active,
    /// The last line lacked a terminator and has been handed out.
    ExhaustionPending,
    Exhausted,
}

/// JSON Lines reader.
pub struct JsonlReader<R: Read> {
    input: InputStream<R>,
    options: JsonOptions,
    state: ReadState,
    line: Vec<u8>,
    lines: u64,
    path: Option<PathBuf>,
}

impl<R: Read> JsonlReader<R> {
    /// Bind a reader to `source`.
    ///
    /// # Errors
    /// Returns an error if gzip was requested and the header is malformed.
    pub fn new(source: R, compression: Compression, options: JsonOptions) -> Result<Self> {
        Ok(Self::from_stream(InputStream::open(source, compression)?, options, None))
    }

    fn from_stream(input: InputStream<R>, options: JsonOptions, path: Option<PathBuf>) -> Self {
        Self {
            input,
            options,
            state: ReadState::Active,
            line: Vec::new(),
            lines: 0,
            path,
        }
    }

    /// Load the next line (without terminator) into `self.line`.
    fn next_line(&mut self) -> Result<bool> {
        if self.state != ReadState::Active {
            self.state = ReadState::Exhausted;
            return Ok(false);
        }
        self.line.clear();
        let n = self
            .input
            .read_until(TERMINATOR, &mut self.line)
            .with_context(|| {
                format!("read line {}{}", self.lines + 1, located(self.path.as_deref()))
            })?;
        if n == 0 {
            self.state = ReadState::Exhausted;
            return Ok(false);
        }
        if self.line.last() == Some(&TERMINATOR) {
            self.line.pop();
        } else {
            self.state = ReadState::ExhaustionPending;
        }
        self.lines += 1;
        Ok(true)
    }

    /// Next line as raw bytes, terminator stripped.
    ///
    /// # Errors
    /// Returns an error if the underlying stream fails.
    pub fn read_raw(&mut self) -> Result<Option<Vec<u8>>> {
        if !self.next_line()? {
            return Ok(None);
        }
        Ok(Some(self.line.clone()))
    }

    /// Decode the next line into `holder`. Returns `false` on exhaustion,
    /// leaving `holder` untouched.
    ///
    /// # Errors
    /// Returns an error if the line is not valid JSON for `T`.
    pub fn read_into<T: DeserializeOwned>(&mut self, holder: &mut T) -> Result<bool> {
        if !self.next_line()? {
            return Ok(false);
        }
        *holder = self.decode_line()?;
        Ok(true)
    }

    /// Decode the next line into a fresh value.
    ///
    /// # Errors
    /// See [`read_into`](Self::read_into).
    pub fn read<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        if !self.next_line()? {
            return Ok(None);
        }
        self.decode_line().map(Some)
    }

    fn decode_line<T: DeserializeOwned>(&self) -> Result<T> {
        self.options.unmarshal(&self.line).with_context(|| {
            format!(
                "parse JSONL line {}{}: {}",
                self.lines,
                located(self.path.as_deref()),
                String::from_utf8_lossy(&self.line)
            )
        })
    }

    /// Lines read so far.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Release the decoder and return the source.
    pub fn close(self) -> R {
        self.input.into_inner()
    }
}

/// Create a JSONL file; gzip when `path` ends in `.gz`.
///
/// # Errors
/// Returns an error if the file cannot be created.
pub fn create_jsonl_file(path: impl AsRef<Path>, options: JsonOptions) -> Result<JsonlWriter<File>> {
    Ok(JsonlWriter::from_stream(create_file(path)?, options))
}

/// Open a JSONL file; gunzip when `path` ends in `.gz`.
///
/// # Errors
/// Returns an error if the file cannot be opened or its gzip header is malformed.
pub fn open_jsonl_file(path: impl AsRef<Path>, options: JsonOptions) -> Result<JsonlReader<File>> {
    let path = path.as_ref();
    Ok(JsonlReader::from_stream(open_file(path)?, options, Some(path.to_path_buf())))
}

impl<W: Write> RecordSink for JsonlWriter<W> {
    type Record = Vec<u8>;

    fn write_record(&mut self, record: &Vec<u8>) -> Result<()> {
        self.write_raw(record)
    }

    fn close(self) -> Result<()> {
        JsonlWriter::close(self).map(drop)
    }
}

impl<R: Read> RecordSource for JsonlReader<R> {
    type Record = Vec<u8>;

    fn read_record(&mut self) -> Result<Option<Vec<u8>>> {
        self.read_raw()
    }

    fn close(self) -> Result<()> {
        drop(JsonlReader::close(self));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(bytes: &[u8]) -> JsonlReader<&[u8]> {
        JsonlReader::new(bytes, Compression::None, JsonOptions::default()).unwrap()
    }

    #[test]
    fn missing_final_terminator_defers_exhaustion() {
        let mut r = reader(b"1\n2");
        assert_eq!(r.read_raw().unwrap().as_deref(), Some(&b"1"[..]));
        assert_eq!(r.state, ReadState::Active);
        assert_eq!(r.read_raw().unwrap().as_deref(), Some(&b"2"[..]));
        assert_eq!(r.state, ReadState::ExhaustionPending);
        assert_eq!(r.read_raw().unwrap(), None);
        assert_eq!(r.state, ReadState::Exhausted);
        assert_eq!(r.read_raw().unwrap(), None);
    }

    #[test]
    fn terminated_input_exhausts_at_boundary() {
        let mut r = reader(b"1\n");
        assert!(r.read::<u32>().unwrap().is_some());
        assert_eq!(r.state, ReadState::Active);
        assert_eq!(r.read::<u32>().unwrap(), None);
    }

    #[test]
    fn raw_write_rejects_embedded_newline() {
        let mut w = JsonlWriter::new(Vec::new(), Compression::None, JsonOptions::default());
        assert!(w.write_raw(b"{\"a\":\n1}").is_err());
        w.write_raw(b"{\"a\":1}").unwrap();
        assert_eq!(w.close().unwrap(), b"{\"a\":1}\n");
    }
}
