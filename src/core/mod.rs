//! # Core Module
//!
//! Runtime configuration and the reminder persistence layer.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod config;
pub mod store;

// Re-export commonly used items
pub use config::{Config, Timing};
pub use store::{FileReminderStore, ReminderMap, ReminderStore};
