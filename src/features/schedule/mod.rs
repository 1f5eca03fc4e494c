//! # Schedule Feature
//!
//! Parsing for repeat-interval specs and absolute fire times, plus the
//! next-occurrence calculator with catch-up and jitter.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod fire_time;
pub mod interval;

pub use fire_time::{catch_up, jitter_between, next_fire_time, parse_fire_time, FIRE_TIME_FORMAT};
pub use interval::{interval_or_default, parse_interval, DEFAULT_INTERVAL_SECS};

use std::fmt;

/// A schedule field that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleParseError {
    /// Timestamp did not match `YYYY-MM-DD HH:MM:SS`.
    BadTimestamp(String),
    /// Interval spec was not four colon-separated integers.
    BadInterval(String),
}

impl fmt::Display for ScheduleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleParseError::BadTimestamp(raw) => {
                write!(f, "invalid fire time '{raw}' (expected YYYY-MM-DD HH:MM:SS)")
            }
            ScheduleParseError::BadInterval(raw) => {
                write!(f, "invalid repeat interval '{raw}' (expected days:hours:minutes:seconds)")
            }
        }
    }
}

impl std::error::Error for ScheduleParseError {}
