//! Infrastructure layer - External concerns and adapters
//!
//! Bank and webhook HTTP clients, the payments file store and the HTTP
//! surface.

pub mod adapters;
pub mod http;

pub use adapters::{BankAuthClient, BankQrAdapter, PaymentsStore, WebhookClient};
