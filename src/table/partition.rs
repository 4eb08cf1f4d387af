//! Monthly partition keys and file naming.
//!
//! A partition is one SQLite file per calendar month named
//! `YYYY-MM-monthly.sqlite`. The naming helpers here are pure; they never
//! touch the files themselves except for discovery.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::{Error, Result};

/// Suffix appended to the `YYYY-MM` stem.
pub const PARTITION_SUFFIX: &str = "-monthly";

/// Extension of the SQLite partition files.
pub const PARTITION_EXTENSION: &str = "sqlite";

/// Calendar month identifying one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey {
    year: i32,
    month: u32,
}

impl PartitionKey {
    /// Create a key, rejecting months outside 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidConfig(format!("month {month} out of range")));
        }
        if !(0..=9999).contains(&year) {
            return Err(Error::InvalidConfig(format!("year {year} out of range")));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// File stem, e.g. `2023-01-monthly`.
    pub fn file_stem(&self) -> String {
        format!("{self}{PARTITION_SUFFIX}")
    }

    /// File name, e.g. `2023-01-monthly.sqlite`.
    pub fn file_name(&self) -> String {
        format!("{}.{PARTITION_EXTENSION}", self.file_stem())
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Parse a partition file name back into its key.
///
/// Returns `None` for anything that is not exactly `YYYY-MM-monthly.sqlite`.
pub fn parse_partition_filename(name: &str) -> Option<PartitionKey> {
    let stem = name
        .strip_suffix(PARTITION_EXTENSION)?
        .strip_suffix('.')?
        .strip_suffix(PARTITION_SUFFIX)?;

    let (year, month) = stem.split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    if !year.chars().chain(month.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    PartitionKey::new(year.parse().ok()?, month.parse().ok()?).ok()
}

/// Path of the partition file for `key` under `root`.
pub fn partition_path(root: &Path, key: PartitionKey) -> PathBuf {
    root.join(key.file_name())
}

/// SQLite side files that belong to a partition database.
pub(crate) fn companion_paths(path: &Path) -> [PathBuf; 2] {
    let mut journal = path.as_os_str().to_owned();
    journal.push("-journal");
    let mut wal = path.as_os_str().to_owned();
    wal.push("-wal");
    [PathBuf::from(journal), PathBuf::from(wal)]
}

/// Discover all partition files in a directory, sorted by key.
pub fn discover_partitions(dir: &Path) -> Result<Vec<PartitionKey>> {
    let mut keys = Vec::new();

    if !dir.exists() {
        return Ok(keys);
    }

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if let Some(key) = parse_partition_filename(file_name) {
            keys.push(key);
        }
    }

    keys.sort_unstable();
    Ok(keys)
}
