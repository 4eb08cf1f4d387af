//! Hourly timeline cursor.
//!
//! Steps are one hour of absolute time, so DST transitions show up as a local
//! hour that is skipped or repeated, never as a missing or duplicated tick.

use crate::core::calendar::Calendar;
use crate::core::{Error, Result};

/// Seconds in one tick.
pub const TICK_SECS: i64 = 3600;

/// One hourly step of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Zero-based position from the start of the run.
    pub index: u64,
    /// Instant of the tick in Unix seconds.
    pub unix_secs: i64,
}

/// Iterator over hourly ticks from `start` to `end` inclusive.
#[derive(Debug, Clone)]
pub struct Timeline {
    start: i64,
    end: i64,
    next_index: u64,
}

impl Timeline {
    /// Timeline over `[start, end]`; both bounds in Unix seconds.
    pub fn new(start: i64, end_inclusive: i64) -> Self {
        Self {
            start,
            end: end_inclusive,
            next_index: 0,
        }
    }

    /// Whole calendar years starting at local midnight on Jan 1 of `start_year`.
    ///
    /// The last tick is the final hour of the last year, so the timeline never
    /// touches the month after the configured span.
    pub fn for_years(calendar: &impl Calendar, start_year: i32, span_years: u32) -> Result<Self> {
        if span_years == 0 {
            return Err(Error::InvalidConfig("span must be at least one year".to_string()));
        }
        let end_year = i32::try_from(span_years)
            .ok()
            .and_then(|span| start_year.checked_add(span))
            .ok_or_else(|| Error::InvalidConfig(format!("span {span_years} overflows year")))?;

        let start = calendar.resolve(start_year, 1, 1, 0)?;
        let end = calendar.resolve(end_year, 1, 1, 0)? - TICK_SECS;
        Ok(Self::new(start, end))
    }

    /// First instant of the timeline.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Last instant of the timeline (inclusive).
    pub fn end(&self) -> i64 {
        self.end
    }

    fn cursor(&self) -> i64 {
        self.start + self.next_index as i64 * TICK_SECS
    }
}

impl Iterator for Timeline {
    type Item = Tick;

    fn next(&mut self) -> Option<Tick> {
        let unix_secs = self.cursor();
        if unix_secs > self.end {
            return None;
        }
        let tick = Tick {
            index: self.next_index,
            unix_secs,
        };
        self.next_index += 1;
        Some(tick)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.cursor() > self.end {
            0
        } else {
            ((self.end - self.cursor()) / TICK_SECS + 1) as usize
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Timeline {}
