// Core layer - runtime configuration and reminder persistence
pub mod core;

// Features layer - scheduling, delivery, and the reminder registry
pub mod features;

// Re-export core items for convenience
pub use self::core::{Config, FileReminderStore, ReminderStore, Timing};

// Re-export feature items
pub use features::{
    // Delivery
    DeliveryFailure, DeliveryReport, DeliveryTransport, Dispatcher,
    // Reminders
    RegistryError, ReminderDefinition, ReminderScheduler, ReminderStatus, ValidationError,
    // Schedule
    ScheduleParseError,
};
