//! Monthly partition store.
//!
//! Each open partition owns one SQLite connection living on a dedicated writer
//! thread. The connection runs a single transaction for the whole lifetime of
//! the partition:
//!
//! ```text
//! open_partition ──► remove stale file ─► CREATE TABLE ─► BEGIN IMMEDIATE ─► prepare INSERT
//! insert (xN)    ──► execute prepared INSERT (one reply per row)
//! finalize       ──► drop statement ─► COMMIT ─► close
//! ```
//!
//! The handle talks to the thread through an unbounded channel with a oneshot
//! reply per command, so inserts are awaitable and many can be in flight while
//! the thread applies them one at a time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use rusqlite::{params, Connection, OpenFlags, TransactionBehavior};
use tokio::sync::{mpsc, oneshot};

use crate::core::{Error, Measurement, Result, StoreFault};
use crate::table::partition::{companion_paths, partition_path, PartitionKey};

/// Name of the single table in every partition.
pub const MEASUREMENTS_TABLE: &str = "Measurements";

const CREATE_TABLE_SQL: &str = r#"CREATE TABLE "Measurements" (
    "id" INTEGER NOT NULL,
    "channel" INTEGER,
    "measured_value" REAL,
    "recorded_time" INTEGER,
    PRIMARY KEY("id" AUTOINCREMENT)
)"#;

const INSERT_SQL: &str =
    "INSERT INTO Measurements (channel, measured_value, recorded_time) VALUES (?1, ?2, ?3)";

type Reply = oneshot::Sender<std::result::Result<(), StoreFault>>;

enum Command {
    Insert { row: Measurement, reply: Reply },
    Finalize { reply: Reply },
}

/// Outcome of one partition after the run is done with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionReport {
    pub key: PartitionKey,
    pub path: PathBuf,
    pub rows_written: u64,
    pub row_failures: u64,
    pub committed: bool,
}

/// Creates monthly partition files under a root directory.
#[derive(Debug, Clone)]
pub struct PartitionStore {
    root: PathBuf,
}

impl PartitionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the partition file for `key`.
    pub fn path_for(&self, key: PartitionKey) -> PathBuf {
        partition_path(&self.root, key)
    }

    /// Replace the partition file for `key` with an empty one and open it for writing.
    ///
    /// Any existing file for the same month is deleted first; there is no
    /// merge or append.
    ///
    /// # Errors
    ///
    /// - `Error::StorageInit`: stale file could not be removed, the database
    ///   could not be created, or the schema/transaction could not be set up
    pub async fn open_partition(&self, key: PartitionKey) -> Result<PartitionHandle> {
        let path = self.path_for(key);
        let (sender, receiver) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        let thread_path = path.clone();
        thread::Builder::new()
            .name(format!("partition-{key}"))
            .spawn(move || partition_writer_loop(&thread_path, ready_tx, receiver))
            .map_err(|err| Error::StorageInit {
                key,
                source: StoreFault::Io(err),
            })?;

        let ready = ready_rx.await.unwrap_or(Err(StoreFault::WriterGone));
        if let Err(source) = ready {
            return Err(Error::StorageInit { key, source });
        }

        log::info!("DB file '{}' created.", key.file_name());

        Ok(PartitionHandle {
            key,
            path,
            sender,
            rows_written: AtomicU64::new(0),
            row_failures: AtomicU64::new(0),
        })
    }
}

/// Write access to the one open partition.
///
/// Dropping the handle without calling [`PartitionHandle::finalize`] rolls
/// the partition's transaction back.
#[derive(Debug)]
pub struct PartitionHandle {
    key: PartitionKey,
    path: PathBuf,
    sender: mpsc::UnboundedSender<Command>,
    rows_written: AtomicU64,
    row_failures: AtomicU64,
}

impl PartitionHandle {
    pub fn key(&self) -> PartitionKey {
        self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows acknowledged by the writer so far (not yet durable until finalize).
    pub fn rows_written(&self) -> u64 {
        self.rows_written.load(Ordering::Relaxed)
    }

    pub fn row_failures(&self) -> u64 {
        self.row_failures.load(Ordering::Relaxed)
    }

    /// Insert one row inside the partition transaction.
    ///
    /// A failure is returned to the caller and leaves the transaction open.
    pub async fn insert(&self, channel: u8, measured_value: f64, recorded_time: i64) -> Result<()> {
        let row = Measurement {
            channel,
            measured_value,
            recorded_time,
        };
        match self.request(|reply| Command::Insert { row, reply }).await {
            Ok(()) => {
                self.rows_written.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(source) => {
                self.row_failures.fetch_add(1, Ordering::Relaxed);
                Err(Error::RowInsert {
                    channel,
                    recorded_time,
                    source,
                })
            }
        }
    }

    /// Snapshot of this partition's counters, `committed` still false.
    pub fn report(&self) -> PartitionReport {
        PartitionReport {
            key: self.key,
            path: self.path.clone(),
            rows_written: self.rows_written(),
            row_failures: self.row_failures(),
            committed: false,
        }
    }

    /// Release the prepared statement and commit the transaction.
    ///
    /// # Errors
    ///
    /// - `Error::Commit`: the commit failed; the transaction is rolled back and
    ///   none of this partition's rows are kept
    pub async fn finalize(self) -> Result<()> {
        let key = self.key;
        self.request(|reply| Command::Finalize { reply })
            .await
            .map_err(|source| Error::Commit { key, source })
    }

    async fn request(
        &self,
        build: impl FnOnce(Reply) -> Command,
    ) -> std::result::Result<(), StoreFault> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(build(reply))
            .map_err(|_| StoreFault::WriterGone)?;
        response.await.map_err(|_| StoreFault::WriterGone)?
    }
}

fn partition_writer_loop(
    path: &Path,
    ready: oneshot::Sender<std::result::Result<(), StoreFault>>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    let mut conn = match create_database(path) {
        Ok(conn) => conn,
        Err(fault) => {
            let _ = ready.send(Err(fault));
            return;
        }
    };
    let tx = match conn.transaction_with_behavior(TransactionBehavior::Immediate) {
        Ok(tx) => tx,
        Err(err) => {
            let _ = ready.send(Err(err.into()));
            return;
        }
    };
    let mut insert = match tx.prepare(INSERT_SQL) {
        Ok(stmt) => stmt,
        Err(err) => {
            let _ = ready.send(Err(err.into()));
            return;
        }
    };
    if ready.send(Ok(())).is_err() {
        return;
    }

    let finalize = loop {
        match commands.blocking_recv() {
            Some(Command::Insert { row, reply }) => {
                let result = insert
                    .execute(params![row.channel, row.measured_value, row.recorded_time])
                    .map(|_| ())
                    .map_err(StoreFault::from);
                let _ = reply.send(result);
            }
            Some(Command::Finalize { reply }) => break Some(reply),
            None => break None,
        }
    };

    drop(insert);
    match finalize {
        Some(reply) => {
            let result = match tx.commit() {
                Ok(()) => conn.close().map_err(|(_, err)| StoreFault::from(err)),
                Err(err) => Err(StoreFault::from(err)),
            };
            let _ = reply.send(result);
        }
        None => {
            log::warn!(
                "partition {} dropped without finalize, rolling back",
                path.display()
            );
        }
    }
}

fn create_database(path: &Path) -> std::result::Result<Connection, StoreFault> {
    remove_stale(path)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.execute_batch(CREATE_TABLE_SQL)?;
    Ok(conn)
}

fn remove_stale(path: &Path) -> io::Result<()> {
    let [journal, wal] = companion_paths(path);
    for candidate in [path.to_path_buf(), journal, wal] {
        match fs::remove_file(&candidate) {
            Ok(()) => log::debug!("removed stale {}", candidate.display()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
    }
    Ok(())
}
