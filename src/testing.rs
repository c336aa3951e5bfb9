//! Testing utilities for record files.
//!
//! This module provides helpers for end-users (and this crate's own tests) to
//! exercise readers, writers and split/join without boilerplate:
//!
//! - **Mock I/O**: temporary files and directories, a writer that fails on demand
//! - **Fixtures**: deterministic sample records for every format
//!
//! # Quick Start
//!
//! ```no_run
//! use recfile::testing::*;
//! use recfile::partition::{join_jsonl_files, split_jsonl_file};
//!
//! # fn main() -> anyhow::Result<()> {
//! let dir = TempDirPath::new()?;
//! let source = mock_jsonl_file(&dir, "events.jsonl", &sample_events(25))?;
//! let parts = split_jsonl_file(&source, 10, dir.part_namer("events", "jsonl"))?;
//! assert_eq!(parts.len(), 3);
//! join_jsonl_files(dir.file_path("joined.jsonl"), &parts)?;
//! assert_files_equal(&source, dir.file_path("joined.jsonl"));
//! # Ok(())
//! # }
//! ```

pub mod fixtures;
pub mod mock_io;

// Re-export commonly used items
pub use fixtures::*;
pub use mock_io::*;
