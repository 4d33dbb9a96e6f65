//! Infrastructure adapters module
//!
//! Adapters for the bank API, the payments file and downstream webhooks.

pub mod bank_auth;
pub mod bank_qr;
pub mod payments_store;
pub mod purchase_webhook;

pub use bank_auth::{BankAuthClient, Clock, SystemClock};
pub use bank_qr::BankQrAdapter;
pub use payments_store::PaymentsStore;
pub use purchase_webhook::{sign_payload, WebhookClient};
