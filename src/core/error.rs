use thiserror::Error;

use crate::table::PartitionKey;

/// Low-level cause behind a storage failure.
#[derive(Debug, Error)]
pub enum StoreFault {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("partition writer thread exited")]
    WriterGone,
}

#[derive(Debug, Error)]
pub enum Error {
    /// Partition file could not be replaced, created, or given its schema.
    #[error("failed to initialise partition {key}: {source}")]
    StorageInit {
        key: PartitionKey,
        #[source]
        source: StoreFault,
    },
    /// A single row insert failed; the partition stays open.
    #[error("insert failed for channel {channel} at {recorded_time}: {source}")]
    RowInsert {
        channel: u8,
        recorded_time: i64,
        #[source]
        source: StoreFault,
    },
    /// The partition transaction could not be committed.
    #[error("commit failed for partition {key}: {source}")]
    Commit {
        key: PartitionKey,
        #[source]
        source: StoreFault,
    },
    #[error("calendar error: {0}")]
    Calendar(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_partition() {
        let err = Error::StorageInit {
            key: PartitionKey::new(2023, 4).unwrap(),
            source: StoreFault::WriterGone,
        };
        assert_eq!(
            err.to_string(),
            "failed to initialise partition 2023-04: partition writer thread exited"
        );
    }

    #[test]
    fn row_insert_keeps_source() {
        let err = Error::RowInsert {
            channel: 5,
            recorded_time: 1_672_560_000,
            source: StoreFault::Io(std::io::Error::other("disk hiccup")),
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}
