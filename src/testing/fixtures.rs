//! Pre-built records for common testing scenarios.

use serde::{Deserialize, Serialize};

/// Sample event used by the JSON Lines and binary fixtures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleEvent {
    pub id: u64,
    pub kind: String,
    pub user: Option<String>,
    pub tags: Vec<String>,
}

/// Generate `n` deterministic events with ids `0..n`.
///
/// Every third event has no user, every fifth carries tags.
///
/// # Example
///
/// ```
/// use recfile::testing::sample_events;
///
/// let events = sample_events(10);
/// assert_eq!(events.len(), 10);
/// assert_eq!(events[3].id, 3);
/// ```
#[must_use]
pub fn sample_events(n: usize) -> Vec<SampleEvent> {
    const KINDS: [&str; 4] = ["click", "view", "purchase", "logout"];
    (0..n as u64)
        .map(|id| SampleEvent {
            id,
            kind: KINDS[id as usize % KINDS.len()].to_string(),
            user: (id % 3 != 0).then(|| format!("user-{}", id % 7)),
            tags: if id % 5 == 0 {
                vec!["batch".to_string(), format!("t{id}")]
            } else {
                Vec::new()
            },
        })
        .collect()
}

/// Header used by [`sample_rows`].
pub const SAMPLE_HEADER: [&str; 4] = ["id", "name", "score", "note"];

/// Generate `n` CSV data rows matching [`SAMPLE_HEADER`].
///
/// Rows exercise quoting: some names contain commas, some notes contain
/// quotes or embedded newlines, and some notes are empty.
#[must_use]
pub fn sample_rows(n: usize) -> Vec<Vec<String>> {
    (0..n)
        .map(|i| {
            let name = if i % 4 == 0 {
                format!("Doe, J{i}")
            } else {
                format!("name{i}")
            };
            let note = match i % 5 {
                0 => String::new(),
                1 => format!("said \"hi\" {i}"),
                2 => format!("line one\nline two {i}"),
                _ => format!("  padded {i}  "),
            };
            vec![i.to_string(), name, format!("{}.5", i * 3), note]
        })
        .collect()
}
