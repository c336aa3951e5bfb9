//! Header-to-position mapping for delimited records.
//!
//! A [`Schema`] is built once from a header row and can be shared by any
//! number of [`Record`]s. It does not need an open reader: a schema built from
//! a known header can interpret raw field vectors from anywhere, e.g. rows of
//! a file produced by a join.

use std::collections::HashMap;
use std::sync::Arc;

/// Ordered field names plus a name → position index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    header: Vec<String>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Build a schema from header names. A name that appears more than once
    /// maps to its last position.
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let header: Vec<String> = header.into_iter().map(Into::into).collect();
        let index = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { header, index }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn index(&self) -> &HashMap<String, usize> {
        &self.index
    }

    /// Position of `name`, if the header has it.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.header.len()
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    /// Bind raw field values to this schema.
    pub fn record(self: &Arc<Self>, values: Vec<String>) -> Record {
        Record {
            values,
            schema: Arc::clone(self),
        }
    }
}

/// A row of field values bound to a [`Schema`].
///
/// Rows may be shorter or longer than the header; lookups degrade to defaults
/// instead of failing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    values: Vec<String>,
    schema: Arc<Schema>,
}

impl Record {
    /// Positional values as read.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn into_values(self) -> Vec<String> {
        self.values
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Value of the named field, or `default` when the header has no such
    /// name or this row is too short to reach it.
    pub fn field<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.schema
            .position(name)
            .and_then(|i| self.values.get(i))
            .map_or(default, String::as_str)
    }

    /// All values keyed by header name. Values past the end of the header are
    /// keyed by the empty name (the last such value wins).
    pub fn fields(&self) -> HashMap<String, String> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let name = self.schema.header.get(i).cloned().unwrap_or_default();
                (name, v.clone())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(["name", "value", "note"]))
    }

    #[test]
    fn field_lookup_by_name() {
        let r = schema().record(vec!["a".into(), "1".into(), "x".into()]);
        assert_eq!(r.field("value", "-"), "1");
        assert_eq!(r.field("missing", "-"), "-");
    }

    #[test]
    fn short_row_falls_back_to_default() {
        let r = schema().record(vec!["a".into()]);
        assert_eq!(r.field("name", "-"), "a");
        assert_eq!(r.field("note", ""), "");
    }

    #[test]
    fn fields_map_extra_values_to_empty_name() {
        let s = Arc::new(Schema::new(["k"]));
        let r = s.record(vec!["v".into(), "extra".into()]);
        let m = r.fields();
        assert_eq!(m.get("k").map(String::as_str), Some("v"));
        assert_eq!(m.get("").map(String::as_str), Some("extra"));
    }

    #[test]
    fn duplicate_names_resolve_to_last_position() {
        let s = Schema::new(["a", "b", "a"]);
        assert_eq!(s.position("a"), Some(2));
        assert_eq!(s.len(), 3);
    }
}
