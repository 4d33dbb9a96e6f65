//! Domain layer - Core business logic and domain models
//!
//! Payment records, status rules and the bank port, independent of HTTP
//! and storage concerns.

pub mod health;
pub mod payments;
pub mod provider;
pub mod status;

pub use health::{HealthResponse, HealthStatus};
pub use payments::{Customer, PaymentRecord, PaymentStatus, PaymentUpdate, WebhookDestination};
pub use provider::{normalize_qr_image, IssuedQr, ProviderStatus, QrIntent, QrProvider};
pub use status::{normalize_status, PollResult, StatusReport};
