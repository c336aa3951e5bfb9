//! Fixed I/O constants and the structured-text marshaling policy.
//!
//! Everything here is read-only configuration. The JSON marshaling policy is
//! an explicit value handed to each JSON Lines reader and writer rather than
//! a process-wide default.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Buffer size applied to every buffered layer of a stream (64 KiB).
pub const FILE_RW_BLOCK_SIZE: usize = 64 * 1024;

/// File suffix that selects gzip compression for path-based readers and writers.
pub const GZIP_SUFFIX: &str = ".gz";

/// Marshaling policy for JSON Lines records.
///
/// Field naming and unknown-field tolerance are expressed on the record type
/// itself through `serde` attributes (`rename_all`, `deny_unknown_fields`);
/// this value only carries the runtime knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JsonOptions {
    /// Emit object fields whose value is `null`. When `false`, such fields
    /// are dropped from the encoded line (at every nesting level) and object
    /// keys come out in `serde_json::Map` order.
    pub emit_nulls: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self { emit_nulls: true }
    }
}

impl JsonOptions {
    /// Options that omit `null` object fields on write.
    #[must_use]
    pub fn omit_nulls() -> Self {
        Self { emit_nulls: false }
    }

    /// Encode `value` as a single compact JSON document.
    ///
    /// # Errors
    /// Returns an error if `value` cannot be serialized.
    pub fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        if self.emit_nulls {
            return serde_json::to_vec(value).context("serialize JSON value");
        }
        let mut tree = serde_json::to_value(value).context("serialize JSON value")?;
        strip_nulls(&mut tree);
        serde_json::to_vec(&tree).context("serialize JSON value")
    }

    /// Decode one JSON document.
    ///
    /// # Errors
    /// Returns an error if `bytes` is not valid JSON for `T`.
    pub fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).context("deserialize JSON value")
    }
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}
