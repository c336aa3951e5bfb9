//! Value processors for CSV cells.
//!
//! These are the building blocks for a [`ValuePipeline`](crate::io::csv::ValuePipeline):
//! [`to_sentinel`] on write turns every empty-looking cell into [`SENTINEL`],
//! and [`from_sentinel`] on read turns it back into an empty string.
//!
//! ```
//! use recfile::normalize::{from_sentinel, to_sentinel};
//!
//! assert_eq!(to_sentinel("  NaN "), "#");
//! assert_eq!(to_sentinel(" 42 "), "42");
//! assert_eq!(from_sentinel("#"), "");
//! ```

/// Placeholder written in place of an empty or null-like cell.
pub const SENTINEL: &str = "#";

/// Tokens (after trimming) treated as empty, in addition to the empty string.
pub const EMPTY_VALUES: [&str; 7] = ["null", "NULL", "Null", "NaN", "nan", "N/A", "n/a"];

/// Whether `v` (after trimming) is empty or a recognized null token.
pub fn is_empty_value(v: &str) -> bool {
    let v = v.trim();
    v.is_empty() || EMPTY_VALUES.contains(&v)
}

/// Trim surrounding whitespace; collapse empty and null-like values to [`SENTINEL`].
pub fn to_sentinel(v: &str) -> String {
    if is_empty_value(v) {
        SENTINEL.to_string()
    } else {
        v.trim().to_string()
    }
}

/// Map [`SENTINEL`] back to the empty string; anything else passes through.
pub fn from_sentinel(v: &str) -> String {
    if v == SENTINEL {
        String::new()
    } else {
        v.to_string()
    }
}

/// Trim surrounding whitespace.
pub fn trim(v: &str) -> String {
    v.trim().to_string()
}
