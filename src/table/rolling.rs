//! Month-boundary rotation.
//!
//! Walks the hourly timeline and keeps exactly one partition open: the one
//! whose month matches the current tick in the configured zone.

use std::path::Path;

use crate::core::{Calendar, Error, Result, Tick, Timeline};
use crate::table::driver::WriteDriver;
use crate::table::partition::PartitionKey;
use crate::table::store::{PartitionHandle, PartitionReport, PartitionStore};

/// Statistics for a generation run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Ticks visited.
    pub ticks: u64,
    /// Ticks that fell into a month whose partition could not be opened.
    pub ticks_skipped: u64,
    pub rows_written: u64,
    pub row_failures: u64,
    /// Rotations from one open partition to the next.
    pub partition_rolls: u64,
    pub commit_failures: u64,
    pub open_failures: u64,
    /// Every partition that was opened, in timeline order.
    pub partitions: Vec<PartitionReport>,
}

impl RunReport {
    /// Keys of all partitions opened during the run.
    pub fn partition_keys(&self) -> Vec<PartitionKey> {
        self.partitions.iter().map(|p| p.key).collect()
    }
}

enum RotationState {
    NoPartition,
    PartitionOpen(PartitionHandle),
    Done,
}

/// Drives the timeline through monthly partitions.
///
/// The first tick always opens the partition of its own month, even when the
/// run does not start on a month boundary. After that a partition is
/// finalized and the next one opened whenever a tick lands in a new month.
///
/// # Example
///
/// ```no_run
/// use meterlog::core::{Timeline, Zone};
/// use meterlog::table::{PartitionStore, RotationController, WriteDriver};
///
/// # async fn demo() -> meterlog::core::Result<()> {
/// let zone = Zone::parse(Some("America/Los_Angeles"))?;
/// let timeline = Timeline::for_years(&zone, 2023, 1)?;
/// let controller = RotationController::new(
///     PartitionStore::new("./out"),
///     zone,
///     WriteDriver::default(),
/// );
/// let report = controller.run(timeline).await?;
/// println!("wrote {} partitions", report.partitions.len());
/// # Ok(())
/// # }
/// ```
pub struct RotationController<C: Calendar> {
    store: PartitionStore,
    calendar: C,
    driver: WriteDriver,
    state: RotationState,
    /// Month of the partition last opened or attempted.
    current_key: Option<PartitionKey>,
    report: RunReport,
    on_roll_callback: Option<Box<dyn FnMut(&PartitionKey, &PartitionKey)>>,
    on_open_callback: Option<Box<dyn FnMut(&PartitionKey, &Path)>>,
}

impl<C: Calendar> RotationController<C> {
    pub fn new(store: PartitionStore, calendar: C, driver: WriteDriver) -> Self {
        Self {
            store,
            calendar,
            driver,
            state: RotationState::NoPartition,
            current_key: None,
            report: RunReport::default(),
            on_roll_callback: None,
            on_open_callback: None,
        }
    }

    /// Set a callback invoked on partition rolls with (old, new).
    ///
    /// Fires after `old` has been finalized. Months whose partition never
    /// opened do not produce a roll.
    pub fn on_partition_roll<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&PartitionKey, &PartitionKey) + 'static,
    {
        self.on_roll_callback = Some(Box::new(callback));
        self
    }

    /// Set a callback invoked with the key and file path of every partition
    /// right after it opens, before any row is written to it.
    pub fn on_partition_open<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&PartitionKey, &Path) + 'static,
    {
        self.on_open_callback = Some(Box::new(callback));
        self
    }

    /// Walk `timeline` to the end and finalize the last partition.
    ///
    /// # Errors
    ///
    /// - `Error::StorageInit`: the very first partition could not be opened
    /// - `Error::Calendar`: a tick could not be decomposed in the zone
    /// - `Error::InvalidConfig`: a tick falls in a year past 9999
    pub async fn run(mut self, mut timeline: Timeline) -> Result<RunReport> {
        log::debug!(
            "walking {} ticks from {} in {}",
            timeline.len(),
            timeline.start(),
            self.calendar.name()
        );

        while !matches!(self.state, RotationState::Done) {
            match timeline.next() {
                Some(tick) => self.step(tick).await?,
                None => self.finish().await,
            }
        }
        Ok(self.report)
    }

    async fn step(&mut self, tick: Tick) -> Result<()> {
        self.report.ticks += 1;
        let key = self.calendar.decompose(tick.unix_secs)?.partition_key()?;

        if self.current_key != Some(key) {
            self.rotate(key).await?;
        }

        if let RotationState::PartitionOpen(handle) = &self.state {
            let tick_report = self.driver.write_tick(handle, tick).await;
            self.report.rows_written += u64::from(tick_report.written);
            self.report.row_failures += tick_report.failed_channels.len() as u64;
        } else {
            self.report.ticks_skipped += 1;
        }
        Ok(())
    }

    /// Finalize the last partition and enter the terminal state.
    async fn finish(&mut self) {
        self.close_current().await;
        self.state = RotationState::Done;
    }

    /// Finalize whatever is open and open the partition for `key`.
    async fn rotate(&mut self, key: PartitionKey) -> Result<()> {
        let first_open = self.current_key.is_none();
        let rolled = self.close_current().await;

        if rolled {
            if let (Some(old), Some(callback)) = (self.current_key, &mut self.on_roll_callback) {
                callback(&old, &key);
            }
        }
        self.current_key = Some(key);

        match self.store.open_partition(key).await {
            Ok(handle) => {
                if rolled {
                    self.report.partition_rolls += 1;
                }
                if let Some(callback) = &mut self.on_open_callback {
                    callback(&key, handle.path());
                }
                self.state = RotationState::PartitionOpen(handle);
                Ok(())
            }
            Err(err) if first_open => Err(err),
            Err(err) => {
                log::error!("{err}; skipping month {key}");
                self.report.open_failures += 1;
                self.state = RotationState::NoPartition;
                Ok(())
            }
        }
    }

    /// Commit and close the open partition, if any. Returns whether one was open.
    async fn close_current(&mut self) -> bool {
        let handle = match std::mem::replace(&mut self.state, RotationState::NoPartition) {
            RotationState::PartitionOpen(handle) => handle,
            other => {
                self.state = other;
                return false;
            }
        };

        let mut report = handle.report();
        match handle.finalize().await {
            Ok(()) => report.committed = true,
            Err(err @ Error::Commit { .. }) => {
                log::error!("{err}; data for {} is unreliable", report.key);
                self.report.commit_failures += 1;
            }
            Err(err) => {
                log::error!("{err}");
                self.report.commit_failures += 1;
            }
        }
        self.report.partitions.push(report);
        true
    }
}
