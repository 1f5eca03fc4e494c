//! Reminder definitions and their validation.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::features::schedule::{parse_fire_time, parse_interval};

/// A named reminder as stored in the config files, which key entries by
/// name; the name itself travels alongside the definition in every API.
///
/// Definitions are immutable once scheduled. An edit is a remove followed
/// by an add of the whole definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderDefinition {
    /// Destination identifiers, attempted in order at every fire.
    pub destinations: Vec<String>,

    /// First fire time, `YYYY-MM-DD HH:MM:SS` local wall-clock.
    pub first_fire_at: String,

    /// Repeat interval, `days:hours:minutes:seconds`. All-zero means the
    /// reminder fires once.
    pub repeat_every: String,

    /// Total fire budget. `-1` repeats forever.
    #[serde(default = "default_repeat_count")]
    pub repeat_count: i64,

    /// Message body delivered to every destination.
    pub message: String,
}

fn default_repeat_count() -> i64 {
    -1
}

impl ReminderDefinition {
    /// True when the fire budget is unbounded.
    pub fn is_unbounded(&self) -> bool {
        self.repeat_count < 0
    }
}

/// A definition field the caller can correct. Nothing is registered or
/// persisted when validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyName,
    EmptyDestinations,
    EmptyMessage,
    BadFireTime(String),
    BadInterval(String),
    BadRepeatCount(i64),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyName => write!(f, "reminder name must not be empty"),
            ValidationError::EmptyDestinations => {
                write!(f, "at least one non-empty destination is required")
            }
            ValidationError::EmptyMessage => write!(f, "message must not be empty"),
            ValidationError::BadFireTime(raw) => {
                write!(f, "invalid fire time '{raw}' (expected YYYY-MM-DD HH:MM:SS)")
            }
            ValidationError::BadInterval(raw) => write!(
                f,
                "invalid repeat interval '{raw}' (expected days:hours:minutes:seconds, non-negative)"
            ),
            ValidationError::BadRepeatCount(count) => {
                write!(f, "invalid repeat count {count} (use -1 for unbounded, or a positive budget)")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a definition before it is accepted into the registry.
pub fn validate(name: &str, definition: &ReminderDefinition) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if definition.destinations.is_empty()
        || definition.destinations.iter().any(|d| d.trim().is_empty())
    {
        return Err(ValidationError::EmptyDestinations);
    }
    if definition.message.trim().is_empty() {
        return Err(ValidationError::EmptyMessage);
    }
    if parse_fire_time(&definition.first_fire_at).is_err() {
        return Err(ValidationError::BadFireTime(definition.first_fire_at.clone()));
    }
    match parse_interval(&definition.repeat_every) {
        Ok(interval) if interval >= Duration::zero() => {}
        _ => return Err(ValidationError::BadInterval(definition.repeat_every.clone())),
    }
    if definition.repeat_count < -1 {
        return Err(ValidationError::BadRepeatCount(definition.repeat_count));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_definition() -> ReminderDefinition {
        ReminderDefinition {
            destinations: vec!["user:1001".to_string(), "group:42".to_string()],
            first_fire_at: "2026-01-05 09:00:00".to_string(),
            repeat_every: "1:00:00:00".to_string(),
            repeat_count: 3,
            message: "morning check-in".to_string(),
        }
    }

    #[test]
    fn test_valid_definition_passes() {
        validate("checkin", &valid_definition()).unwrap();
    }

    #[test]
    fn test_unbounded_and_one_shot_counts_pass() {
        let mut definition = valid_definition();
        definition.repeat_count = -1;
        validate("forever", &definition).unwrap();

        definition.repeat_count = 1;
        definition.repeat_every = "0:00:00:00".to_string();
        validate("once", &definition).unwrap();
    }

    #[test]
    fn test_empty_name_rejected() {
        assert_eq!(
            validate("  ", &valid_definition()),
            Err(ValidationError::EmptyName)
        );
    }

    #[test]
    fn test_empty_destinations_rejected() {
        let mut definition = valid_definition();
        definition.destinations.clear();
        assert_eq!(
            validate("checkin", &definition),
            Err(ValidationError::EmptyDestinations)
        );

        definition.destinations = vec!["user:1".to_string(), "".to_string()];
        assert_eq!(
            validate("checkin", &definition),
            Err(ValidationError::EmptyDestinations)
        );
    }

    #[test]
    fn test_empty_message_rejected() {
        let mut definition = valid_definition();
        definition.message = " ".to_string();
        assert_eq!(
            validate("checkin", &definition),
            Err(ValidationError::EmptyMessage)
        );
    }

    #[test]
    fn test_bad_fire_time_rejected() {
        let mut definition = valid_definition();
        definition.first_fire_at = "tomorrow-ish".to_string();
        assert!(matches!(
            validate("checkin", &definition),
            Err(ValidationError::BadFireTime(_))
        ));
    }

    #[test]
    fn test_bad_interval_rejected() {
        let mut definition = valid_definition();
        definition.repeat_every = "1:00:00".to_string();
        assert!(matches!(
            validate("checkin", &definition),
            Err(ValidationError::BadInterval(_))
        ));

        // parses, but sums to a negative duration
        definition.repeat_every = "0:00:00:-30".to_string();
        assert!(matches!(
            validate("checkin", &definition),
            Err(ValidationError::BadInterval(_))
        ));
    }

    #[test]
    fn test_repeat_count_below_minus_one_rejected() {
        let mut definition = valid_definition();
        definition.repeat_count = -2;
        assert_eq!(
            validate("checkin", &definition),
            Err(ValidationError::BadRepeatCount(-2))
        );
    }

    #[test]
    fn test_serde_defaults_repeat_count_to_unbounded() {
        let yaml = r#"
destinations: ["user:1001"]
first_fire_at: "2026-01-05 09:00:00"
repeat_every: "1:00:00:00"
message: "no count given"
"#;
        let definition: ReminderDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(definition.repeat_count, -1);
        assert!(definition.is_unbounded());
    }
}
