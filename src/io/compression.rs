//! Transparent gzip support layered under and over stream buffers.
//!
//! Every reader and writer in this crate sits on one of the two stream types
//! defined here:
//! - [`OutputStream`] - a buffered sink, optionally feeding a gzip encoder
//! - [`InputStream`] - a buffered source, optionally fed by a gzip decoder
//!
//! ## Layering
//!
//! Each layer exclusively owns the layer beneath it:
//!
//! ```text
//! plain:  BufWriter<W>
//! gzip:   BufWriter<GzEncoder<BufWriter<W>>>
//! ```
//!
//! [`OutputStream::finish`] unwinds the chain innermost-first: the buffer
//! above the compressor is flushed, the compressor writes its trailer, the
//! buffer below it is flushed, and the underlying sink is handed back.
//!
//! ## Selection
//!
//! Path-based helpers pick gzip when the file name ends in `.gz`
//! ([`Compression::from_path`]). Stream-based constructors take an explicit
//! [`Compression`] since there is no name to look at.
//!
//! ```no_run
//! use recfile::io::compression::{create_file, open_file};
//! use std::io::{Read, Write};
//! # fn main() -> anyhow::Result<()> {
//!
//! let mut out = create_file("output.txt.gz")?;
//! out.write_all(b"hello")?;
//! out.finish()?;
//!
//! let mut text = String::new();
//! open_file("output.txt.gz")?.read_to_string(&mut text)?;
//! # Ok(())
//! # }
//! ```

use crate::config::{FILE_RW_BLOCK_SIZE, GZIP_SUFFIX};
use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use std::fs::{File, create_dir_all};
use std::io::{self, BufRead, BufReader, BufWriter, IoSlice, Read, Write};
use std::path::Path;

/// Stream compression applied to a record file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Bytes pass through unchanged.
    #[default]
    None,
    /// RFC 1952 gzip, default compression level.
    Gzip,
}

impl Compression {
    /// Select compression from a file path suffix.
    ///
    /// The match is exact: `data.csv.gz` is gzip, `data.CSV.GZ` is not.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        if path.as_ref().to_string_lossy().ends_with(GZIP_SUFFIX) {
            Compression::Gzip
        } else {
            Compression::None
        }
    }

    /// Human-readable codec name.
    pub fn name(self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
        }
    }
}

impl From<bool> for Compression {
    fn from(gzip: bool) -> Self {
        if gzip { Compression::Gzip } else { Compression::None }
    }
}

/// Buffered output chain that owns its sink.
///
/// Dropping an `OutputStream` flushes on a best-effort basis; call
/// [`finish`](OutputStream::finish) to observe errors and get the sink back.
pub enum OutputStream<W: Write> {
    /// Single buffer over the sink.
    Plain(BufWriter<W>),
    /// Buffer, gzip encoder, buffer, sink.
    Gzip(BufWriter<GzEncoder<BufWriter<W>>>),
}

impl<W: Write> OutputStream<W> {
    /// Wrap `sink` with buffering and, if requested, gzip compression.
    pub fn new(sink: W, compression: Compression) -> Self {
        let lower = BufWriter::with_capacity(FILE_RW_BLOCK_SIZE, sink);
        match compression {
            Compression::None => OutputStream::Plain(lower),
            Compression::Gzip => {
                let gz = GzEncoder::new(lower, flate2::Compression::default());
                OutputStream::Gzip(BufWriter::with_capacity(FILE_RW_BLOCK_SIZE, gz))
            }
        }
    }

    /// Compression this stream was opened with.
    pub fn compression(&self) -> Compression {
        match self {
            OutputStream::Plain(_) => Compression::None,
            OutputStream::Gzip(_) => Compression::Gzip,
        }
    }

    /// Flush every layer in order and return the underlying sink.
    ///
    /// # Errors
    /// Returns the first I/O error raised while flushing a buffer or writing
    /// the gzip trailer. The sink is lost in that case.
    pub fn finish(self) -> io::Result<W> {
        let lower = match self {
            OutputStream::Plain(lower) => lower,
            OutputStream::Gzip(upper) => {
                let gz = upper.into_inner().map_err(io::IntoInnerError::into_error)?;
                gz.finish()?
            }
        };
        lower.into_inner().map_err(io::IntoInnerError::into_error)
    }
}

impl<W: Write> Write for OutputStream<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputStream::Plain(w) => w.write(buf),
            OutputStream::Gzip(w) => w.write(buf),
        }
    }

    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        match self {
            OutputStream::Plain(w) => w.write_vectored(bufs),
            OutputStream::Gzip(w) => w.write_vectored(bufs),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            OutputStream::Plain(w) => w.write_all(buf),
            OutputStream::Gzip(w) => w.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputStream::Plain(w) => w.flush(),
            OutputStream::Gzip(w) => w.flush(),
        }
    }
}

/// Buffered input chain that owns its source.
pub enum InputStream<R: Read> {
    /// Single buffer over the source.
    Plain(BufReader<R>),
    /// Buffer, gzip decoder, buffer, source. Concatenated gzip members are
    /// read as one stream.
    Gzip(BufReader<MultiGzDecoder<BufReader<R>>>),
}

impl<R: Read> InputStream<R> {
    /// Wrap `source` with buffering and, if requested, gzip decompression.
    ///
    /// For gzip the first block is decoded eagerly, so a malformed header is
    /// reported here rather than on the first read.
    ///
    /// # Errors
    /// Returns an error if the gzip header cannot be parsed.
    pub fn open(source: R, compression: Compression) -> Result<Self> {
        let lower = BufReader::with_capacity(FILE_RW_BLOCK_SIZE, source);
        match compression {
            Compression::None => Ok(InputStream::Plain(lower)),
            Compression::Gzip => {
                let gz = MultiGzDecoder::new(lower);
                let mut upper = BufReader::with_capacity(FILE_RW_BLOCK_SIZE, gz);
                upper.fill_buf().context("invalid gzip header")?;
                Ok(InputStream::Gzip(upper))
            }
        }
    }

    /// Compression this stream was opened with.
    pub fn compression(&self) -> Compression {
        match self {
            InputStream::Plain(_) => Compression::None,
            InputStream::Gzip(_) => Compression::Gzip,
        }
    }

    /// Release the decoder and buffers, returning the underlying source.
    pub fn into_inner(self) -> R {
        match self {
            InputStream::Plain(r) => r.into_inner(),
            InputStream::Gzip(r) => r.into_inner().into_inner().into_inner(),
        }
    }
}

impl<R: Read> Read for InputStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            InputStream::Plain(r) => r.read(buf),
            InputStream::Gzip(r) => r.read(buf),
        }
    }
}

impl<R: Read> BufRead for InputStream<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            InputStream::Plain(r) => r.fill_buf(),
            InputStream::Gzip(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            InputStream::Plain(r) => r.consume(amt),
            InputStream::Gzip(r) => r.consume(amt),
        }
    }
}

/// Create (truncate) a file for writing, with compression chosen by suffix.
///
/// Parent directories are created if they don't exist.
///
/// # Errors
/// Returns an error if the directories or the file cannot be created.
pub fn create_file(path: impl AsRef<Path>) -> Result<OutputStream<File>> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    Ok(OutputStream::new(f, Compression::from_path(path)))
}

/// Open a file for reading, with decompression chosen by suffix.
///
/// # Errors
/// Returns an error if the file cannot be opened or its gzip header is malformed.
pub fn open_file(path: impl AsRef<Path>) -> Result<InputStream<File>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    InputStream::open(f, Compression::from_path(path))
        .with_context(|| format!("setup decompression for {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_selects_gzip() {
        assert_eq!(Compression::from_path("a/b/data.csv.gz"), Compression::Gzip);
        assert_eq!(Compression::from_path("DATA.JSONL.GZ"), Compression::None);
        assert_eq!(Compression::from_path("data.gzip"), Compression::None);
        assert_eq!(Compression::from_path("data.csv"), Compression::None);
        assert_eq!(Compression::from(true), Compression::Gzip);
        assert_eq!(Compression::from(false), Compression::None);
    }

    #[test]
    fn finish_writes_gzip_trailer() {
        let mut out = OutputStream::new(Vec::new(), Compression::Gzip);
        out.write_all(b"payload").unwrap();
        let bytes = out.finish().unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);

        let mut input = InputStream::open(bytes.as_slice(), Compression::Gzip).unwrap();
        let mut text = String::new();
        input.read_to_string(&mut text).unwrap();
        assert_eq!(text, "payload");
    }

    #[test]
    fn plain_stream_is_passthrough() {
        let mut out = OutputStream::new(Vec::new(), Compression::None);
        out.write_all(b"abc").unwrap();
        assert_eq!(out.finish().unwrap(), b"abc");
    }

    #[test]
    fn malformed_gzip_fails_at_open() {
        let junk = b"definitely not gzip".to_vec();
        assert!(InputStream::open(junk.as_slice(), Compression::Gzip).is_err());
    }
}
