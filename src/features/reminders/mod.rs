//! # Reminders Feature
//!
//! Named recurring reminders: one cooperative task per reminder, a registry
//! enforcing at most one active task per name, and persistence of
//! runtime-added reminders across restarts.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true

pub mod definition;
pub mod scheduler;
pub mod task;

pub use definition::{ReminderDefinition, ValidationError};
pub use scheduler::{RegistryError, ReminderScheduler, ReminderStatus};
pub use task::TaskState;
