//! Fire-time parsing and the next-occurrence calculator.
//!
//! Fire times are local wall-clock timestamps. A reminder whose first fire
//! time already passed is caught up to the next still-pending slot rather
//! than replaying every missed occurrence, and a small random jitter keeps
//! reminders that land on the same instant from firing as one burst.

use chrono::{Duration, NaiveDateTime};
use rand::Rng;

use super::ScheduleParseError;

/// Timestamp format for first-fire times: `2026-01-05 09:00:00`.
pub const FIRE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse an absolute fire time.
pub fn parse_fire_time(raw: &str) -> Result<NaiveDateTime, ScheduleParseError> {
    NaiveDateTime::parse_from_str(raw.trim(), FIRE_TIME_FORMAT)
        .map_err(|_| ScheduleParseError::BadTimestamp(raw.to_string()))
}

/// Advance `base` past every already-elapsed occurrence.
///
/// - `base` in the future: the first occurrence is `base` itself.
/// - `base` elapsed, positive interval: skip the whole intervals that have
///   passed and land on the next slot, which is strictly after `now` and
///   congruent to `base` modulo the interval.
/// - `base` elapsed, zero interval: returned unchanged; a one-shot whose
///   moment passed is an expiry case the task checks before scheduling.
pub fn catch_up(base: NaiveDateTime, interval: Duration, now: NaiveDateTime) -> NaiveDateTime {
    if base > now {
        return base;
    }
    let step = interval.num_seconds();
    if step <= 0 {
        return base;
    }
    let elapsed = (now - base).num_seconds();
    let skipped = elapsed / step + 1;
    base + Duration::seconds(step * skipped)
}

/// First occurrence for a task that is just starting: catch-up plus one
/// application of jitter.
pub fn next_fire_time(
    base: NaiveDateTime,
    interval: Duration,
    now: NaiveDateTime,
    jitter_min_secs: i64,
    jitter_max_secs: i64,
) -> NaiveDateTime {
    catch_up(base, interval, now) + jitter_between(jitter_min_secs, jitter_max_secs)
}

/// Uniform random offset in `[min_secs, max_secs]` seconds. A non-positive
/// or inverted range yields zero, which is what tests run with.
pub fn jitter_between(min_secs: i64, max_secs: i64) -> Duration {
    if max_secs <= 0 || max_secs < min_secs {
        return Duration::zero();
    }
    Duration::seconds(rand::rng().random_range(min_secs..=max_secs))
}
