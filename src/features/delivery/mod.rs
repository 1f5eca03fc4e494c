//! # Delivery Feature
//!
//! Best-effort message delivery with a direct-then-broadcast fallback per
//! destination.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod dispatcher;

pub use dispatcher::{DeliveryFailure, DeliveryReport, DeliveryTransport, Dispatcher};
