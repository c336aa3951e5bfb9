//! Split a record file into bounded part files, and join parts back together.
//!
//! The algorithm is written once against [`RecordSource`] / [`RecordSink`]
//! and instantiated per format through [`PartFormat`]:
//!
//! | format | records copied as | header repeated per part |
//! |--------|-------------------|--------------------------|
//! | [`CsvFormat`] | unprocessed fields | yes |
//! | [`JsonlFormat`] | raw lines | no |
//! | [`BinaryFormat`] | raw frame payloads | no |
//!
//! Records are never re-encoded, so `join(split(x))` reproduces `x` byte for
//! byte for any file written by this crate.
//!
//! # Failure semantics
//! - [`split`] is all-or-nothing: on any error every part created so far is
//!   deleted and no paths are returned.
//! - [`join`] aborts on the first error and leaves the destination as it is.
//!
//! ```no_run
//! use recfile::partition::{join_jsonl_files, part_namer, split_jsonl_file};
//! use std::path::Path;
//! # fn main() -> anyhow::Result<()> {
//!
//! let source = Path::new("events.jsonl.gz");
//! let parts = split_jsonl_file(source, 10_000, part_namer(source))?;
//! // events.part0001.jsonl.gz, events.part0002.jsonl.gz, ...
//! join_jsonl_files("events.joined.jsonl.gz", &parts)?;
//! # Ok(())
//! # }
//! ```

use crate::io::{RecordSink, RecordSource};
use anyhow::{Context, Result, ensure};
use std::fs::remove_file;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A record file format that split and join can operate on.
pub trait PartFormat {
    /// Verbatim record unit.
    type Record: PartialEq;
    type Reader: RecordSource<Record = Self::Record>;
    type Writer: RecordSink<Record = Self::Record>;

    /// Whether the first record of a file is a header that every part repeats.
    const HEADER: bool;

    /// Short format name for diagnostics.
    fn name() -> &'static str;

    /// Open an existing file for reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened.
    fn open(path: &Path) -> Result<Self::Reader>;

    /// Create (truncate) a file for writing.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    fn create(path: &Path) -> Result<Self::Writer>;
}

/// CSV files; the header row is repeated at the top of each part.
#[cfg(feature = "io-csv")]
pub struct CsvFormat;

#[cfg(feature = "io-csv")]
impl PartFormat for CsvFormat {
    type Record = Vec<String>;
    type Reader = crate::io::csv::CsvReader<std::fs::File>;
    type Writer = crate::io::csv::CsvWriter<std::fs::File>;

    const HEADER: bool = true;

    fn name() -> &'static str {
        "csv"
    }

    fn open(path: &Path) -> Result<Self::Reader> {
        crate::io::csv::open_csv_file(path, crate::io::csv::ValuePipeline::new())
    }

    fn create(path: &Path) -> Result<Self::Writer> {
        crate::io::csv::create_csv_file(path, crate::io::csv::ValuePipeline::new())
    }
}

/// JSON Lines files, copied line by line.
#[cfg(feature = "io-jsonl")]
pub struct JsonlFormat;

#[cfg(feature = "io-jsonl")]
impl PartFormat for JsonlFormat {
    type Record = Vec<u8>;
    type Reader = crate::io::jsonl::JsonlReader<std::fs::File>;
    type Writer = crate::io::jsonl::JsonlWriter<std::fs::File>;

    const HEADER: bool = false;

    fn name() -> &'static str {
        "jsonl"
    }

    fn open(path: &Path) -> Result<Self::Reader> {
        crate::io::jsonl::open_jsonl_file(path, crate::config::JsonOptions::default())
    }

    fn create(path: &Path) -> Result<Self::Writer> {
        crate::io::jsonl::create_jsonl_file(path, crate::config::JsonOptions::default())
    }
}

/// Length-prefixed binary files, copied frame by frame.
#[cfg(feature = "io-binary")]
pub struct BinaryFormat;

#[cfg(feature = "io-binary")]
impl PartFormat for BinaryFormat {
    type Record = Vec<u8>;
    type Reader = crate::io::binary::BinaryReader<std::fs::File, crate::io::framing::RawCodec>;
    type Writer = crate::io::binary::BinaryWriter<std::fs::File, crate::io::framing::RawCodec>;

    const HEADER: bool = false;

    fn name() -> &'static str {
        "binary"
    }

    fn open(path: &Path) -> Result<Self::Reader> {
        crate::io::binary::open_binary_file(path, crate::io::framing::RawCodec)
    }

    fn create(path: &Path) -> Result<Self::Writer> {
        crate::io::binary::create_binary_file(path, crate::io::framing::RawCodec)
    }
}

/// Part files created by an in-flight split. Deleted on drop unless committed.
#[derive(Default)]
struct PartSet {
    paths: Vec<PathBuf>,
    committed: bool,
}

impl PartSet {
    fn push(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    fn len(&self) -> usize {
        self.paths.len()
    }

    fn commit(mut self) -> Vec<PathBuf> {
        self.committed = true;
        std::mem::take(&mut self.paths)
    }
}

impl Drop for PartSet {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for path in &self.paths {
            match remove_file(path) {
                Ok(()) => debug!(part = %path.display(), "removed part after failed split"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(part = %path.display(), error = %e, "could not remove part"),
            }
        }
    }
}

/// Split `source` into parts of at most `limit` data records each.
///
/// `namer` is called with the 1-based part number and returns where to write
/// that part; a `.gz` name gets a gzip part. A source without records (or,
/// for CSV, without a header) produces no parts.
///
/// # Errors
/// Fails if `limit` is zero, or on any read, write or close error. Every part
/// file created before the failure is removed.
pub fn split<F: PartFormat>(
    source: impl AsRef<Path>,
    limit: usize,
    mut namer: impl FnMut(usize) -> PathBuf,
) -> Result<Vec<PathBuf>> {
    let source = source.as_ref();
    ensure!(limit > 0, "split limit must be positive");
    debug!(source = %source.display(), format = F::name(), limit, "starting split");

    let mut parts = PartSet::default();
    split_into::<F>(source, limit, &mut namer, &mut parts)
        .with_context(|| format!("split {} file '{}'", F::name(), source.display()))?;

    let parts = parts.commit();
    debug!(source = %source.display(), parts = parts.len(), "split complete");
    Ok(parts)
}

fn split_into<F: PartFormat>(
    source: &Path,
    limit: usize,
    namer: &mut impl FnMut(usize) -> PathBuf,
    parts: &mut PartSet,
) -> Result<()> {
    let mut reader = F::open(source)?;

    let header = if F::HEADER {
        match reader.read_record().context("read header")? {
            Some(h) => Some(h),
            None => return Ok(()),
        }
    } else {
        None
    };

    let mut writer: Option<F::Writer> = None;
    let mut count = limit;

    while let Some(record) = reader.read_record()? {
        let w = match writer.take() {
            Some(w) if count < limit => writer.insert(w),
            full => {
                if let Some(full) = full {
                    full.close()?;
                    debug!(part = parts.len(), records = count, "part complete");
                }
                let path = namer(parts.len() + 1);
                let mut next = F::create(&path)?;
                parts.push(path);
                if let Some(h) = &header {
                    next.write_record(h)?;
                }
                count = 0;
                writer.insert(next)
            }
        };
        w.write_record(&record)?;
        count += 1;
    }

    if let Some(last) = writer {
        last.close()?;
        debug!(part = parts.len(), records = count, "final part complete");
    }
    reader.close()
}

/// Concatenate `parts`, in order, into `destination`.
///
/// For header formats each part must start with the same header; it is written
/// once, from the first part.
///
/// # Errors
/// Fails on the first open, read or write error, or on a missing or mismatched
/// part header. The destination is not removed.
pub fn join<F, I>(destination: impl AsRef<Path>, parts: I) -> Result<()>
where
    F: PartFormat,
    I: IntoIterator,
    I::Item: AsRef<Path>,
{
    let destination = destination.as_ref();
    let mut writer = F::create(destination)?;
    let mut header: Option<F::Record> = None;

    for part in parts {
        let part = part.as_ref();
        let mut reader =
            F::open(part).with_context(|| format!("can not open file '{}'", part.display()))?;

        if F::HEADER {
            let h = reader
                .read_record()
                .with_context(|| format!("can not read header in file '{}'", part.display()))?
                .with_context(|| format!("missing header in file '{}'", part.display()))?;
            match &header {
                Some(first) => ensure!(
                    *first == h,
                    "header of '{}' differs from the first part",
                    part.display()
                ),
                None => {
                    writer.write_record(&h).with_context(|| {
                        format!("can not write header to file '{}'", destination.display())
                    })?;
                    header = Some(h);
                }
            }
        }

        let mut records = 0u64;
        while let Some(record) = reader
            .read_record()
            .with_context(|| format!("join read file '{}'", part.display()))?
        {
            writer.write_record(&record).with_context(|| {
                format!("can not write row to file '{}'", destination.display())
            })?;
            records += 1;
        }
        reader.close()?;
        debug!(part = %part.display(), records, "joined part");
    }

    writer
        .close()
        .with_context(|| format!("close '{}'", destination.display()))
}

/// Namer that places parts next to `source` as `<stem>.partNNNN.<extensions>`.
///
/// All extensions are kept, so `data/events.jsonl.gz` yields
/// `data/events.part0001.jsonl.gz`, and the parts are compressed like the source.
pub fn part_namer(source: &Path) -> impl Fn(usize) -> PathBuf + use<> {
    let dir = source.parent().map(Path::to_path_buf).unwrap_or_default();
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (stem, extensions) = match name.split_once('.') {
        Some((stem, rest)) => (stem.to_string(), format!(".{rest}")),
        None => (name, String::new()),
    };
    move |n| dir.join(format!("{stem}.part{n:04}{extensions}"))
}

/// Split a CSV file; see [`split`].
///
/// # Errors
/// See [`split`].
#[cfg(feature = "io-csv")]
pub fn split_csv_file(
    source: impl AsRef<Path>,
    limit: usize,
    namer: impl FnMut(usize) -> PathBuf,
) -> Result<Vec<PathBuf>> {
    split::<CsvFormat>(source, limit, namer)
}

/// Join CSV parts; see [`join`].
///
/// # Errors
/// See [`join`].
#[cfg(feature = "io-csv")]
pub fn join_csv_files<I>(destination: impl AsRef<Path>, parts: I) -> Result<()>
where
    I: IntoIterator,
    I::Item: AsRef<Path>,
{
    join::<CsvFormat, I>(destination, parts)
}

/// Split a JSON Lines file; see [`split`].
///
/// # Errors
/// See [`split`].
#[cfg(feature = "io-jsonl")]
pub fn split_jsonl_file(
    source: impl AsRef<Path>,
    limit: usize,
    namer: impl FnMut(usize) -> PathBuf,
) -> Result<Vec<PathBuf>> {
    split::<JsonlFormat>(source, limit, namer)
}

/// Join JSON Lines parts; see [`join`].
///
/// # Errors
/// See [`join`].
#[cfg(feature = "io-jsonl")]
pub fn join_jsonl_files<I>(destination: impl AsRef<Path>, parts: I) -> Result<()>
where
    I: IntoIterator,
    I::Item: AsRef<Path>,
{
    join::<JsonlFormat, I>(destination, parts)
}

/// Split a length-prefixed binary file; see [`split`].
///
/// # Errors
/// See [`split`].
#[cfg(feature = "io-binary")]
pub fn split_binary_file(
    source: impl AsRef<Path>,
    limit: usize,
    namer: impl FnMut(usize) -> PathBuf,
) -> Result<Vec<PathBuf>> {
    split::<BinaryFormat>(source, limit, namer)
}

/// Join length-prefixed binary parts; see [`join`].
///
/// # Errors
/// See [`join`].
#[cfg(feature = "io-binary")]
pub fn join_binary_files<I>(destination: impl AsRef<Path>, parts: I) -> Result<()>
where
    I: IntoIterator,
    I::Item: AsRef<Path>,
{
    join::<BinaryFormat, I>(destination, parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namer_keeps_all_extensions() {
        let name = part_namer(Path::new("data/events.jsonl.gz"));
        assert_eq!(name(1), PathBuf::from("data/events.part0001.jsonl.gz"));
        assert_eq!(name(12), PathBuf::from("data/events.part0012.jsonl.gz"));
    }

    #[test]
    fn namer_without_extension() {
        let name = part_namer(Path::new("rows"));
        assert_eq!(name(3), PathBuf::from("rows.part0003"));
    }

    #[test]
    fn uncommitted_part_set_removes_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        std::fs::write(&a, b"x").unwrap();
        {
            let mut set = PartSet::default();
            set.push(a.clone());
            set.push(dir.path().join("never-created"));
        }
        assert!(!a.exists());
    }

    #[test]
    fn committed_part_set_keeps_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        std::fs::write(&a, b"x").unwrap();
        let mut set = PartSet::default();
        set.push(a.clone());
        assert_eq!(set.commit(), vec![a.clone()]);
        assert!(a.exists());
    }
}
