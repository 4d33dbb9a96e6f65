//! HTTP route handlers module
//!
//! Handlers grouped by endpoint family.

pub mod health;
pub mod metrics;
pub mod pages;
pub mod payments;

pub use health::handle_health_request;
pub use metrics::handle_metrics_request;
pub use pages::{handle_index, handle_success};
pub use payments::{
    handle_bank_callback, handle_create_payment, handle_get_payment, handle_payment_status,
};
