//! # Features Module
//!
//! The scheduler's feature layers: time/interval handling, best-effort
//! message delivery, and the reminder registry itself.

pub mod delivery;
pub mod reminders;
pub mod schedule;

// Re-export the items callers normally need
pub use delivery::{DeliveryFailure, DeliveryReport, DeliveryTransport, Dispatcher};
pub use reminders::{
    RegistryError, ReminderDefinition, ReminderScheduler, ReminderStatus, ValidationError,
};
pub use schedule::ScheduleParseError;
