//! # Runtime Configuration
//!
//! Environment-driven settings for the daemon plus the timing knobs shared
//! with the per-reminder task loops.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use log::warn;
use std::path::PathBuf;
use std::time::Duration;

/// Default poll cadence for the task wait loops, in seconds.
pub const DEFAULT_POLL_SECS: u64 = 10;

/// Default lower jitter bound applied to computed fire times, in seconds.
pub const DEFAULT_JITTER_MIN_SECS: i64 = 1;

/// Default upper jitter bound applied to computed fire times, in seconds.
pub const DEFAULT_JITTER_MAX_SECS: i64 = 40;

/// Daemon settings, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Human-authored base reminder set (YAML).
    pub base_config_path: PathBuf,

    /// Machine-written overlay of runtime-added reminders (JSON).
    pub overlay_config_path: PathBuf,

    /// Poll cadence for the task wait loops, in seconds.
    pub poll_secs: u64,

    /// Default log filter passed to the logger at startup.
    pub log_level: String,
}

impl Config {
    /// Read settings from the environment, falling back to defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let base_config_path = std::env::var("REMINDD_BASE_CONFIG")
            .unwrap_or_else(|_| "reminders.yaml".to_string())
            .into();

        let overlay_config_path = std::env::var("REMINDD_OVERLAY_CONFIG")
            .unwrap_or_else(|_| "reminders.runtime.json".to_string())
            .into();

        let poll_secs = match std::env::var("REMINDD_POLL_SECS") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("REMINDD_POLL_SECS is not a number ({raw}), using {DEFAULT_POLL_SECS}");
                DEFAULT_POLL_SECS
            }),
            Err(_) => DEFAULT_POLL_SECS,
        };

        let log_level = std::env::var("REMINDD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Config {
            base_config_path,
            overlay_config_path,
            poll_secs,
            log_level,
        }
    }

    /// Timing profile for the task loops derived from these settings.
    pub fn timing(&self) -> Timing {
        Timing {
            poll: Duration::from_secs(self.poll_secs.max(1)),
            ..Timing::default()
        }
    }
}

/// Timing knobs for the per-reminder task loops.
///
/// Jitter bounds are plain data so tests can zero them; production code
/// uses the defaults.
#[derive(Debug, Clone)]
pub struct Timing {
    /// How long a task sleeps between due-time checks.
    pub poll: Duration,

    /// Lower jitter bound in seconds, inclusive.
    pub jitter_min_secs: i64,

    /// Upper jitter bound in seconds, inclusive.
    pub jitter_max_secs: i64,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            poll: Duration::from_secs(DEFAULT_POLL_SECS),
            jitter_min_secs: DEFAULT_JITTER_MIN_SECS,
            jitter_max_secs: DEFAULT_JITTER_MAX_SECS,
        }
    }
}

impl Timing {
    /// Timing with no jitter, used by tests that assert on exact fire counts.
    pub fn without_jitter(poll: Duration) -> Self {
        Timing {
            poll,
            jitter_min_secs: 0,
            jitter_max_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing_bounds() {
        let timing = Timing::default();
        assert_eq!(timing.poll, Duration::from_secs(DEFAULT_POLL_SECS));
        assert_eq!(timing.jitter_min_secs, 1);
        assert_eq!(timing.jitter_max_secs, 40);
    }

    #[test]
    fn test_without_jitter() {
        let timing = Timing::without_jitter(Duration::from_millis(25));
        assert_eq!(timing.jitter_min_secs, 0);
        assert_eq!(timing.jitter_max_secs, 0);
        assert_eq!(timing.poll, Duration::from_millis(25));
    }
}
