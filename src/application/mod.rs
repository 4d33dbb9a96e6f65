//! Application layer - Use cases and application services
//!
//! Services that drive the payment lifecycle: creation, status polling and
//! the purchase webhook.

pub mod services;
pub mod use_cases;

pub use services::*;
pub use use_cases::*;
