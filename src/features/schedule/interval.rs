//! Repeat-interval parsing.
//!
//! Intervals are written as `days:hours:minutes:seconds`, e.g.
//! `7:00:00:00` for weekly or `0:00:30:00` for every half hour. A day is
//! exactly 24 hours; there are no calendar semantics. An all-zero interval
//! means the reminder fires once.

use chrono::Duration;
use log::warn;

use super::ScheduleParseError;

/// Fallback used when a stored interval spec turns out to be malformed:
/// one day.
pub const DEFAULT_INTERVAL_SECS: i64 = 86_400;

/// Parse a `days:hours:minutes:seconds` spec into a duration.
pub fn parse_interval(spec: &str) -> Result<Duration, ScheduleParseError> {
    let fields: Vec<&str> = spec.split(':').collect();
    if fields.len() != 4 {
        return Err(ScheduleParseError::BadInterval(spec.to_string()));
    }

    let mut parts = [0i64; 4];
    for (slot, field) in parts.iter_mut().zip(&fields) {
        *slot = field
            .trim()
            .parse()
            .map_err(|_| ScheduleParseError::BadInterval(spec.to_string()))?;
    }

    let [days, hours, minutes, seconds] = parts;
    Ok(Duration::seconds(
        days * 86_400 + hours * 3_600 + minutes * 60 + seconds,
    ))
}

/// Parse a repeat spec, falling back to the 1-day default on malformed
/// input. Used on the task-start path, where a bad stored spec must not
/// keep the reminder from running at all.
pub fn interval_or_default(spec: &str) -> Duration {
    match parse_interval(spec) {
        Ok(interval) => interval,
        Err(e) => {
            warn!("{e}; falling back to a 1-day interval");
            Duration::seconds(DEFAULT_INTERVAL_SECS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval_sums_fields() {
        assert_eq!(parse_interval("0:00:00:00").unwrap(), Duration::seconds(0));
        assert_eq!(parse_interval("0:00:00:30").unwrap(), Duration::seconds(30));
        assert_eq!(
            parse_interval("0:00:30:00").unwrap(),
            Duration::seconds(1_800)
        );
        assert_eq!(
            parse_interval("1:00:00:00").unwrap(),
            Duration::seconds(86_400)
        );
        assert_eq!(
            parse_interval("7:00:00:00").unwrap(),
            Duration::seconds(604_800)
        );
        assert_eq!(
            parse_interval("1:02:03:04").unwrap(),
            Duration::seconds(86_400 + 2 * 3_600 + 3 * 60 + 4)
        );
    }

    #[test]
    fn test_parse_interval_accepts_whitespace() {
        assert_eq!(
            parse_interval(" 1 : 00 : 00 : 00 ").unwrap(),
            Duration::seconds(86_400)
        );
    }

    #[test]
    fn test_parse_interval_rejects_wrong_field_count() {
        assert!(parse_interval("1:00:00").is_err());
        assert!(parse_interval("1:00:00:00:00").is_err());
        assert!(parse_interval("").is_err());
        assert!(parse_interval("daily").is_err());
    }

    #[test]
    fn test_parse_interval_rejects_non_integers() {
        assert!(parse_interval("1:aa:00:00").is_err());
        assert!(parse_interval("1:00:0.5:00").is_err());
    }

    #[test]
    fn test_interval_or_default_falls_back_to_one_day() {
        assert_eq!(
            interval_or_default("nonsense"),
            Duration::seconds(DEFAULT_INTERVAL_SECS)
        );
        assert_eq!(interval_or_default("0:00:00:15"), Duration::seconds(15));
    }
}
