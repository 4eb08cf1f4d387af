//! Monthly-partitioned measurement storage.
//!
//! This module provides the write path from an hourly timeline into one SQLite
//! file per calendar month:
//! 1. **PartitionStore**: creates, fills and commits a month's file
//! 2. **WriteDriver**: fans one tick out into twelve channel inserts
//! 3. **RotationController**: keeps the right month open as the timeline advances
//!
//! ```no_run
//! use meterlog::core::{Timeline, Zone};
//! use meterlog::table::{PartitionStore, RotationController, WriteDriver};
//!
//! # async fn demo() -> meterlog::core::Result<()> {
//! let zone = Zone::Utc;
//! let controller = RotationController::new(
//!     PartitionStore::new("./partitions"),
//!     zone,
//!     WriteDriver::default().with_insert_retries(1),
//! );
//! let report = controller.run(Timeline::for_years(&zone, 2024, 1)?).await?;
//! assert_eq!(report.partitions.len(), 12);
//! # Ok(())
//! # }
//! ```

mod config;
mod driver;
mod partition;
mod rolling;
mod store;

pub use config::GeneratorConfig;
pub use driver::{MeasurementSink, TickReport, WriteDriver};
pub use partition::{
    discover_partitions, parse_partition_filename, partition_path, PartitionKey,
    PARTITION_EXTENSION, PARTITION_SUFFIX,
};
pub use rolling::{RotationController, RunReport};
pub use store::{PartitionHandle, PartitionReport, PartitionStore, MEASUREMENTS_TABLE};
