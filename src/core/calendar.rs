use chrono::{DateTime, Datelike, Duration, Local, LocalResult, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::core::{Error, Result};
use crate::table::PartitionKey;

/// Wall-clock decomposition of an instant in a particular zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
}

impl CalendarTime {
    /// The monthly partition this instant belongs to.
    ///
    /// Fails for years that do not fit the four-digit partition naming.
    pub fn partition_key(&self) -> Result<PartitionKey> {
        PartitionKey::new(self.year, self.month)
    }
}

/// A source of timezone-aware calendar arithmetic.
///
/// The writer only needs two things from a calendar: splitting a Unix instant
/// into local fields, and turning a local hour back into an instant. Anything
/// that can do both can drive partition rotation.
pub trait Calendar: Send + Sync {
    /// Decompose `unix_secs` into local calendar fields.
    fn decompose(&self, unix_secs: i64) -> Result<CalendarTime>;

    /// Resolve a local wall-clock hour into Unix seconds.
    ///
    /// Ambiguous hours resolve to the earliest instant; hours skipped by a
    /// forward transition resolve to the first instant after the gap.
    fn resolve(&self, year: i32, month: u32, day: u32, hour: u32) -> Result<i64>;

    /// Human-readable zone name for logging.
    fn name(&self) -> String;
}

/// Built-in calendar backed by `chrono`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Utc,
    /// Host local time (naive wall clock of the running machine).
    Local,
    /// IANA zone, e.g. `America/Los_Angeles`.
    Named(Tz),
}

impl Zone {
    /// Parse a zone option; `None` selects host local time.
    pub fn parse(name: Option<&str>) -> Result<Self> {
        match name.map(str::trim) {
            None | Some("") => Ok(Zone::Local),
            Some("UTC") | Some("utc") => Ok(Zone::Utc),
            Some(name) => name
                .parse::<Tz>()
                .map(Zone::Named)
                .map_err(|_| Error::Calendar(format!("unknown timezone '{name}'"))),
        }
    }
}

impl Calendar for Zone {
    fn decompose(&self, unix_secs: i64) -> Result<CalendarTime> {
        match self {
            Zone::Utc => decompose_in(&Utc, unix_secs),
            Zone::Local => decompose_in(&Local, unix_secs),
            Zone::Named(tz) => decompose_in(tz, unix_secs),
        }
    }

    fn resolve(&self, year: i32, month: u32, day: u32, hour: u32) -> Result<i64> {
        match self {
            Zone::Utc => resolve_in(&Utc, year, month, day, hour),
            Zone::Local => resolve_in(&Local, year, month, day, hour),
            Zone::Named(tz) => resolve_in(tz, year, month, day, hour),
        }
    }

    fn name(&self) -> String {
        match self {
            Zone::Utc => "UTC".to_string(),
            Zone::Local => "local".to_string(),
            Zone::Named(tz) => tz.name().to_string(),
        }
    }
}

fn decompose_in<Z: TimeZone>(zone: &Z, unix_secs: i64) -> Result<CalendarTime> {
    let utc = DateTime::from_timestamp(unix_secs, 0)
        .ok_or_else(|| Error::Calendar(format!("timestamp {unix_secs} out of range")))?;
    let local = utc.with_timezone(zone);
    Ok(CalendarTime {
        year: local.year(),
        month: local.month(),
        day: local.day(),
        hour: local.hour(),
    })
}

fn resolve_in<Z: TimeZone>(zone: &Z, year: i32, month: u32, day: u32, hour: u32) -> Result<i64> {
    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .ok_or_else(|| {
            Error::Calendar(format!("invalid local time {year:04}-{month:02}-{day:02} {hour:02}:00"))
        })?;

    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.timestamp()),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.timestamp()),
        LocalResult::None => {
            // Gap: the hour before exists, the instant one hour after it is where
            // the clock resumes.
            let before = naive - Duration::hours(1);
            zone.from_local_datetime(&before)
                .earliest()
                .map(|dt| dt.timestamp() + 3600)
                .ok_or_else(|| {
                    Error::Calendar(format!(
                        "local time {naive} does not exist in this zone"
                    ))
                })
        }
    }
}
