//! Length-prefixed binary framing.
//!
//! A frame is a 4-byte unsigned big-endian length followed by exactly that
//! many payload bytes; one frame carries one record. Record boundaries are
//! self-describing, so frames can be copied between files without ever
//! looking at the payload.
//!
//! Payload encoding is pluggable through [`FrameCodec`]:
//! - [`RawCodec`] - the payload is the message (`Vec<u8>`)
//! - [`PostcardCodec`] - `serde` types encoded with `postcard` (feature `io-binary`)

use std::io::{self, Read, Write};
use thiserror::Error;

/// Size of the length prefix in bytes.
pub const PREFIX_LEN: usize = 4;

/// Framing failures. Any of these leaves the stream at an unknown position;
/// there is no resynchronization.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The stream ended inside a length prefix.
    #[error("truncated frame prefix: read {read} of 4 bytes")]
    TruncatedPrefix { read: usize },

    /// The stream ended before the declared payload was complete.
    #[error("truncated frame payload: read {read} of {declared} bytes")]
    TruncatedPayload { declared: u32, read: usize },

    /// The payload does not fit a 32-bit length prefix.
    #[error("frame payload of {len} bytes exceeds the 4 GiB limit")]
    PayloadTooLarge { len: usize },

    /// A previous write failed; the stream has no usable record boundary.
    #[error("writer is poisoned by an earlier failed write")]
    Poisoned,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Write one frame: the big-endian length of `payload`, then `payload`.
///
/// # Errors
/// Fails with [`FrameError::PayloadTooLarge`] before writing anything if the
/// payload is longer than `u32::MAX`; any I/O error is fatal for the stream.
pub fn write_frame<W: Write + ?Sized>(w: &mut W, payload: &[u8]) -> Result<(), FrameError> {
    let len = u32::try_from(payload.len())
        .map_err(|_| FrameError::PayloadTooLarge { len: payload.len() })?;
    w.write_all(&len.to_be_bytes())?;
    w.write_all(payload)?;
    Ok(())
}

/// Read one frame into `buf`, replacing its contents.
///
/// Returns `Ok(false)` when the stream ends cleanly at a frame boundary.
///
/// # Errors
/// [`FrameError::TruncatedPrefix`] or [`FrameError::TruncatedPayload`] when
/// the stream ends mid-frame, [`FrameError::Io`] for anything else.
pub fn read_frame<R: Read + ?Sized>(r: &mut R, buf: &mut Vec<u8>) -> Result<bool, FrameError> {
    let mut prefix = [0u8; PREFIX_LEN];
    let got = read_fully(r, &mut prefix)?;
    if got == 0 {
        return Ok(false);
    }
    if got < PREFIX_LEN {
        return Err(FrameError::TruncatedPrefix { read: got });
    }

    let declared = u32::from_be_bytes(prefix);
    buf.clear();
    // grows with the bytes actually present, not the declared length
    let read = r.take(u64::from(declared)).read_to_end(buf)?;
    if read < declared as usize {
        return Err(FrameError::TruncatedPayload { declared, read });
    }
    Ok(true)
}

/// Like `read_exact`, but reports how much was read before end of stream.
fn read_fully<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Payload encoding for framed records.
pub trait FrameCodec {
    /// In-memory record type.
    type Message;

    /// Append the encoded form of `message` to `buf`.
    ///
    /// # Errors
    /// Returns an error if the message cannot be encoded.
    fn encode(&self, message: &Self::Message, buf: &mut Vec<u8>) -> anyhow::Result<()>;

    /// Decode `payload` into `holder`, overwriting its previous value.
    ///
    /// # Errors
    /// Returns an error if the payload is not a valid encoding.
    fn decode(&self, payload: &[u8], holder: &mut Self::Message) -> anyhow::Result<()>;
}

/// Identity codec: the message is the payload.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawCodec;

impl FrameCodec for RawCodec {
    type Message = Vec<u8>;

    fn encode(&self, message: &Vec<u8>, buf: &mut Vec<u8>) -> anyhow::Result<()> {
        buf.extend_from_slice(message);
        Ok(())
    }

    fn decode(&self, payload: &[u8], holder: &mut Vec<u8>) -> anyhow::Result<()> {
        holder.clear();
        holder.extend_from_slice(payload);
        Ok(())
    }
}

/// `serde` codec backed by `postcard`.
///
/// A zero-length payload decodes to `T::default()`, so an empty frame is the
/// empty message.
#[cfg(feature = "io-binary")]
pub struct PostcardCodec<T>(std::marker::PhantomData<fn() -> T>);

#[cfg(feature = "io-binary")]
impl<T> PostcardCodec<T> {
    pub fn new() -> Self {
        Self(std::marker::PhantomData)
    }
}

#[cfg(feature = "io-binary")]
impl<T> Default for PostcardCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "io-binary")]
impl<T> Clone for PostcardCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

#[cfg(feature = "io-binary")]
impl<T> FrameCodec for PostcardCodec<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned + Default,
{
    type Message = T;

    fn encode(&self, message: &T, buf: &mut Vec<u8>) -> anyhow::Result<()> {
        let bytes = postcard::to_allocvec(message)
            .map_err(|e| anyhow::anyhow!("postcard encode: {e}"))?;
        buf.extend_from_slice(&bytes);
        Ok(())
    }

    fn decode(&self, payload: &[u8], holder: &mut T) -> anyhow::Result<()> {
        *holder = if payload.is_empty() {
            T::default()
        } else {
            postcard::from_bytes(payload).map_err(|e| anyhow::anyhow!("postcard decode: {e}"))?
        };
        Ok(())
    }
}
