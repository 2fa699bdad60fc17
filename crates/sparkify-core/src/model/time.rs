use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Text layout of `start_time` columns. Millisecond precision keeps events
/// that differ only in milliseconds distinct.
pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Render a start time the way it is stored in the database.
#[must_use]
pub fn format_start_time(start_time: &NaiveDateTime) -> String {
    start_time.format(START_TIME_FORMAT).to_string()
}

/// A row of the `time` dimension. Every field is a function of `start_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRow {
    pub start_time: NaiveDateTime,
    pub hour: u32,
    pub day: u32,
    /// ISO 8601 week of year.
    pub week: u32,
    pub month: u32,
    pub year: i32,
    /// Day of week, Monday = 0.
    pub weekday: u32,
}

impl TimeRow {
    /// Convert epoch milliseconds (UTC) to a naive UTC date-time.
    pub fn start_time_from_millis(ts: i64) -> Result<NaiveDateTime> {
        DateTime::from_timestamp_millis(ts)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| Error::InvalidData(format!("timestamp out of range: {ts}")))
    }

    /// Derive all time attributes from an epoch-millisecond timestamp.
    pub fn from_millis(ts: i64) -> Result<Self> {
        Ok(Self::from_start_time(Self::start_time_from_millis(ts)?))
    }

    #[must_use]
    pub fn from_start_time(start_time: NaiveDateTime) -> Self {
        Self {
            start_time,
            hour: start_time.hour(),
            day: start_time.day(),
            week: start_time.iso_week().week(),
            month: start_time.month(),
            year: start_time.year(),
            weekday: start_time.weekday().num_days_from_monday(),
        }
    }
}
