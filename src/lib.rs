//! Deterministic hourly measurement series written into monthly SQLite partitions.
//!
//! The timeline advances one hour at a time; every tick produces one row per
//! channel, and every calendar month of the configured zone gets its own
//! `YYYY-MM-monthly.sqlite` file written inside a single transaction.

pub mod core;
pub mod run;
pub mod table;

pub use crate::core::{Error, Result};
pub use run::generate;
