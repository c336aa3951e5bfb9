//! Mock I/O helpers for testing record files.
//!
//! This module provides temporary directories that clean up after themselves,
//! file builders for each format, and a sink that fails after a byte budget.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory that is automatically deleted when dropped.
pub struct TempDirPath {
    #[allow(dead_code)]
    temp_dir: TempDir,
    path: PathBuf,
}

impl TempDirPath {
    /// Create a new temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> io::Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();
        Ok(Self { temp_dir, path })
    }

    /// Get the path to the temporary directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a file path within this directory.
    #[must_use]
    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.path.join(filename)
    }

    /// Part namer producing `<stem>-<n>.<extension>` inside this directory.
    pub fn part_namer(&self, stem: &str, extension: &str) -> impl Fn(usize) -> PathBuf + use<> {
        let dir = self.path.clone();
        let stem = stem.to_string();
        let extension = extension.to_string();
        move |n| dir.join(format!("{stem}-{n}.{extension}"))
    }

    /// Names of the regular files currently in the directory, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn file_names(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.path)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

impl Default for TempDirPath {
    fn default() -> Self {
        Self::new().expect("Failed to create temporary directory")
    }
}

/// A sink that accepts `budget` bytes, then fails every write.
///
/// Useful for checking how writers behave on a short write.
#[derive(Debug, Default)]
pub struct FailingWriter {
    /// Bytes accepted so far.
    pub written: Vec<u8>,
    budget: usize,
}

impl FailingWriter {
    #[must_use]
    pub fn new(budget: usize) -> Self {
        Self {
            written: Vec::new(),
            budget,
        }
    }
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = self.budget - self.written.len();
        if room == 0 {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "write budget exhausted"));
        }
        let n = room.min(buf.len());
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Write `rows` (header first) to `dir/name` with this crate's CSV writer.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
#[cfg(feature = "io-csv")]
pub fn mock_csv_file<S: AsRef<str>>(
    dir: &TempDirPath,
    name: &str,
    header: &[S],
    rows: &[Vec<String>],
) -> Result<PathBuf> {
    use crate::io::csv::{ValuePipeline, create_csv_file};

    let path = dir.file_path(name);
    let mut w = create_csv_file(&path, ValuePipeline::new())?;
    w.write(header)?;
    for row in rows {
        w.write(row)?;
    }
    w.close()?;
    Ok(path)
}

/// Write `data` as JSON Lines to `dir/name` with this crate's writer.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
#[cfg(feature = "io-jsonl")]
pub fn mock_jsonl_file<T: Serialize>(dir: &TempDirPath, name: &str, data: &[T]) -> Result<PathBuf> {
    use crate::config::JsonOptions;
    use crate::io::jsonl::create_jsonl_file;

    let path = dir.file_path(name);
    let mut w = create_jsonl_file(&path, JsonOptions::default())?;
    for item in data {
        w.write(item)?;
    }
    w.close()?;
    Ok(path)
}

/// Write `data` as postcard frames to `dir/name`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
#[cfg(feature = "io-binary")]
pub fn mock_binary_file<T>(dir: &TempDirPath, name: &str, data: &[T]) -> Result<PathBuf>
where
    T: Serialize + serde::de::DeserializeOwned + Default,
{
    use crate::io::binary::create_binary_file;
    use crate::io::framing::PostcardCodec;

    let path = dir.file_path(name);
    let mut w = create_binary_file(&path, PostcardCodec::<T>::new())?;
    for item in data {
        w.write(item)?;
    }
    w.close()?;
    Ok(path)
}

/// Decompressed contents of a file (gzip by `.gz` suffix).
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_decoded(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    use std::io::Read;

    let path = path.as_ref();
    let mut out = Vec::new();
    crate::io::compression::open_file(path)?
        .read_to_end(&mut out)
        .with_context(|| format!("read {}", path.display()))?;
    Ok(out)
}

/// Assert that two files have identical decompressed contents.
///
/// # Panics
///
/// Panics if either file cannot be read or the contents differ.
pub fn assert_files_equal(left: impl AsRef<Path>, right: impl AsRef<Path>) {
    let (left, right) = (left.as_ref(), right.as_ref());
    let a = read_decoded(left).expect("read left file");
    let b = read_decoded(right).expect("read right file");
    assert!(
        a == b,
        "{} and {} differ ({} vs {} bytes)",
        left.display(),
        right.display(),
        a.len(),
        b.len()
    );
}
