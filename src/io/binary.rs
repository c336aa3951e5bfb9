//! Length-prefixed binary record files.
//!
//! This module provides:
//! - [`BinaryWriter`] / [`BinaryReader`] over any byte sink or source
//! - Path helpers [`create_binary_file`] and [`open_binary_file`] (gzip by `.gz` suffix)
//!
//! Each record is one frame (see [`crate::io::framing`]). Payloads are
//! produced and consumed by a [`FrameCodec`]; the raw variants
//! ([`BinaryWriter::write_raw`], [`BinaryReader::read_raw`]) move payload
//! bytes without touching the codec, which is how split and join copy frames.
//!
//! ```no_run
//! use recfile::io::binary::{create_binary_file, open_binary_file};
//! use recfile::io::framing::PostcardCodec;
//! use serde::{Deserialize, Serialize};
//! # fn main() -> anyhow::Result<()> {
//!
//! #[derive(Serialize, Deserialize, Default)]
//! struct Event { id: u64, kind: String }
//!
//! let mut w = create_binary_file("events.bin.gz", PostcardCodec::<Event>::new())?;
//! w.write(&Event { id: 1, kind: "click".into() })?;
//! w.close()?;
//!
//! let mut r = open_binary_file("events.bin.gz", PostcardCodec::<Event>::new())?;
//! let mut holder = Event::default();
//! while r.read_into(&mut holder)? {
//!     println!("{}", holder.id);
//! }
//! # Ok(())
//! # }
//! ```

use crate::io::compression::{Compression, InputStream, OutputStream, create_file, open_file};
use crate::io::framing::{FrameCodec, FrameError, read_frame, write_frame};
use crate::io::{RecordSink, RecordSource, located};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Writer of framed records.
pub struct BinaryWriter<W: Write, C> {
    out: OutputStream<W>,
    codec: C,
    scratch: Vec<u8>,
    poisoned: bool,
}

impl<W: Write, C: FrameCodec> BinaryWriter<W, C> {
    /// Bind a writer to `sink`. Use `Vec::new()` as the sink to frame records
    /// in memory; [`close`](Self::close) then returns the bytes.
    pub fn new(sink: W, compression: Compression, codec: C) -> Self {
        Self {
            out: OutputStream::new(sink, compression),
            codec,
            scratch: Vec::new(),
            poisoned: false,
        }
    }

    /// Encode `message` with the codec and write it as one frame.
    ///
    /// Returns the encoded payload, valid until the next write, so callers
    /// can checksum or log it without encoding twice.
    ///
    /// # Errors
    /// Encode failures leave the stream untouched. A failed frame write poisons
    /// the writer: every later write fails with [`FrameError::Poisoned`].
    pub fn write(&mut self, message: &C::Message) -> Result<&[u8]> {
        self.check_poisoned()?;
        self.scratch.clear();
        self.codec
            .encode(message, &mut self.scratch)
            .context("encode frame payload")?;
        let res = write_frame(&mut self.out, &self.scratch);
        self.settle(res)?;
        Ok(&self.scratch)
    }

    /// Write pre-encoded payload bytes as one frame.
    ///
    /// # Errors
    /// Same poisoning rules as [`write`](Self::write).
    pub fn write_raw(&mut self, payload: &[u8]) -> Result<()> {
        self.check_poisoned()?;
        let res = write_frame(&mut self.out, payload);
        self.settle(res)
    }

    fn check_poisoned(&self) -> Result<(), FrameError> {
        if self.poisoned {
            return Err(FrameError::Poisoned);
        }
        Ok(())
    }

    fn settle(&mut self, res: Result<(), FrameError>) -> Result<()> {
        if let Err(FrameError::Io(_)) = &res {
            self.poisoned = true;
        }
        res.context("write frame")
    }

    /// Flush all layers and return the sink.
    ///
    /// # Errors
    /// Returns an error if buffered bytes or the gzip trailer cannot be written.
    pub fn close(self) -> Result<W> {
        self.out.finish().context("close binary writer")
    }
}

/// Reader of framed records.
pub struct BinaryReader<R: Read, C> {
    input: InputStream<R>,
    codec: C,
    buf: Vec<u8>,
    frames: u64,
    path: Option<PathBuf>,
}

impl<R: Read, C: FrameCodec> BinaryReader<R, C> {
    /// Bind a reader to `source`.
    ///
    /// # Errors
    /// Returns an error if gzip was requested and the header is malformed.
    pub fn new(source: R, compression: Compression, codec: C) -> Result<Self> {
        Ok(Self {
            input: InputStream::open(source, compression)?,
            codec,
            buf: Vec::new(),
            frames: 0,
            path: None,
        })
    }

    /// Decode the next frame into `holder`. Returns `false` on exhaustion,
    /// leaving `holder` untouched.
    ///
    /// # Errors
    /// Returns [`FrameError`] (via `anyhow`) for truncated frames, or a codec
    /// error if the payload does not decode.
    pub fn read_into(&mut self, holder: &mut C::Message) -> Result<bool> {
        if !self.next_frame()? {
            return Ok(false);
        }
        self.codec.decode(&self.buf, holder).with_context(|| {
            format!("decode frame #{}{}", self.frames, located(self.path.as_deref()))
        })?;
        Ok(true)
    }

    /// Decode the next frame into a fresh message.
    ///
    /// # Errors
    /// See [`read_into`](Self::read_into).
    pub fn read(&mut self) -> Result<Option<C::Message>>
    where
        C::Message: Default,
    {
        let mut holder = C::Message::default();
        Ok(self.read_into(&mut holder)?.then_some(holder))
    }

    /// Next frame payload, undecoded.
    ///
    /// # Errors
    /// Returns [`FrameError`] (via `anyhow`) for truncated frames.
    pub fn read_raw(&mut self) -> Result<Option<Vec<u8>>> {
        if !self.next_frame()? {
            return Ok(None);
        }
        Ok(Some(self.buf.clone()))
    }

    fn next_frame(&mut self) -> Result<bool> {
        let more = read_frame(&mut self.input, &mut self.buf).with_context(|| {
            format!("read frame #{}{}", self.frames + 1, located(self.path.as_deref()))
        })?;
        if more {
            self.frames += 1;
        }
        Ok(more)
    }

    /// Frames read so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Release the decoder and return the source.
    pub fn close(self) -> R {
        self.input.into_inner()
    }
}

/// Create a framed record file; gzip when `path` ends in `.gz`.
///
/// # Errors
/// Returns an error if the file cannot be created.
pub fn create_binary_file<C: FrameCodec>(
    path: impl AsRef<Path>,
    codec: C,
) -> Result<BinaryWriter<File, C>> {
    let out = create_file(path)?;
    Ok(BinaryWriter {
        out,
        codec,
        scratch: Vec::new(),
        poisoned: false,
    })
}

/// Open a framed record file; gunzip when `path` ends in `.gz`.
///
/// # Errors
/// Returns an error if the file cannot be opened or its gzip header is malformed.
pub fn open_binary_file<C: FrameCodec>(
    path: impl AsRef<Path>,
    codec: C,
) -> Result<BinaryReader<File, C>> {
    let path = path.as_ref();
    Ok(BinaryReader {
        input: open_file(path)?,
        codec,
        buf: Vec::new(),
        frames: 0,
        path: Some(path.to_path_buf()),
    })
}

impl<W: Write, C: FrameCodec> RecordSink for BinaryWriter<W, C> {
    type Record = Vec<u8>;

    fn write_record(&mut self, record: &Vec<u8>) -> Result<()> {
        self.write_raw(record)
    }

    fn close(self) -> Result<()> {
        BinaryWriter::close(self).map(drop)
    }
}

impl<R: Read, C: FrameCodec> RecordSource for BinaryReader<R, C> {
    type Record = Vec<u8>;

    fn read_record(&mut self) -> Result<Option<Vec<u8>>> {
        self.read_raw()
    }

    fn close(self) -> Result<()> {
        drop(BinaryReader::close(self));
        Ok(())
    }
}
