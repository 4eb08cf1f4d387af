//! Per-tick write fan-out.

use std::future::Future;

use futures_util::future::join_all;

use crate::core::{Measurement, MeasurementGenerator, Result, Tick};
use crate::table::store::PartitionHandle;

/// Destination for measurement rows.
///
/// Implemented by [`PartitionHandle`]; wrappers can intercept writes.
pub trait MeasurementSink {
    fn write(&self, row: Measurement) -> impl Future<Output = Result<()>>;
}

impl MeasurementSink for PartitionHandle {
    fn write(&self, row: Measurement) -> impl Future<Output = Result<()>> {
        self.insert(row.channel, row.measured_value, row.recorded_time)
    }
}

/// Outcome of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub written: u32,
    /// Channels whose row was dropped after all attempts.
    pub failed_channels: Vec<u8>,
    /// Extra attempts spent on retries.
    pub retries: u32,
}

/// Issues all channel inserts for a tick and collects their outcomes.
#[derive(Debug, Clone, Default)]
pub struct WriteDriver {
    generator: MeasurementGenerator,
    insert_retries: u32,
}

impl WriteDriver {
    pub fn new(generator: MeasurementGenerator) -> Self {
        Self {
            generator,
            insert_retries: 0,
        }
    }

    /// Re-issue a failed row up to `retries` more times before dropping it.
    pub fn with_insert_retries(mut self, retries: u32) -> Self {
        self.insert_retries = retries;
        self
    }

    pub fn generator(&self) -> &MeasurementGenerator {
        &self.generator
    }

    /// Write every channel of `tick` into `sink`.
    ///
    /// All rows are submitted together; completion order is unspecified. A
    /// failing channel is logged and reported but never stops the others.
    pub async fn write_tick<S: MeasurementSink>(&self, sink: &S, tick: Tick) -> TickReport {
        let pending = self
            .generator
            .rows_for(&tick)
            .map(|row| self.write_with_retry(sink, row));
        let outcomes = join_all(pending).await;

        let mut report = TickReport::default();
        for (channel, attempts, result) in outcomes {
            report.retries += attempts - 1;
            match result {
                Ok(()) => report.written += 1,
                Err(err) => {
                    log::error!("{err}");
                    report.failed_channels.push(channel);
                }
            }
        }
        report.failed_channels.sort_unstable();
        report
    }

    async fn write_with_retry<S: MeasurementSink>(
        &self,
        sink: &S,
        row: Measurement,
    ) -> (u8, u32, Result<()>) {
        let mut attempts = 1;
        loop {
            match sink.write(row).await {
                Err(err) if attempts <= self.insert_retries => {
                    log::warn!("retrying channel {} at {}: {err}", row.channel, row.recorded_time);
                    attempts += 1;
                }
                result => return (row.channel, attempts, result),
            }
        }
    }
}
