//! Application services - Orchestration of domain logic

pub mod payments_service;
pub mod status_poller;
pub mod webhook_notifier;

pub use payments_service::{CreatePaymentRequest, PaymentCreated, PaymentStatusView, PaymentsService};
pub use status_poller::StatusPoller;
pub use webhook_notifier::{NotifyOutcome, SkipReason, WebhookNotifier};
