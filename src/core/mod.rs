//! Timeline, calendar, and value generation primitives.

pub mod calendar;
pub mod error;
pub mod generator;
pub mod timeline;

pub use calendar::{Calendar, CalendarTime, Zone};
pub use error::{Error, Result, StoreFault};
pub use generator::{Measurement, MeasurementGenerator, CHANNEL_COUNT, DEFAULT_VALUE_STEP};
pub use timeline::{Tick, Timeline, TICK_SECS};
