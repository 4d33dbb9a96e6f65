//! QR provider port
//!
//! The issuing bank is reached through this trait so the application layer
//! can run against the real HTTP adapter or an in-process fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::shared::error::AppResult;

/// Payment intent submitted to the bank
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QrIntent {
    pub currency: String,
    pub gloss: String,
    /// Two-decimal amount, e.g. `"100.00"`
    pub amount: String,
    pub single_use: bool,
    /// Provider-local day, `YYYY-MM-DD`
    pub expiration_date: String,
}

/// A QR issued by the bank
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedQr {
    pub qr_id: String,
    /// Base64 image or data URI, as returned
    pub image: Option<String>,
}

/// Raw status fields returned by the bank
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderStatus {
    pub status_code: Option<Value>,
    pub expiration_date: Option<Value>,
    pub provider_qr_id: Option<Value>,
    pub voucher_id: Option<Value>,
}

#[async_trait]
pub trait QrProvider: Send + Sync {
    /// Create a QR payment intent
    async fn create_qr(&self, intent: &QrIntent) -> AppResult<IssuedQr>;

    /// Fetch the current status of a QR
    async fn qr_status(&self, qr_id: &str) -> AppResult<ProviderStatus>;
}

/// Turn whatever image form the bank returned into a data URI
pub fn normalize_qr_image(image: Option<&str>) -> String {
    match image {
        Some(img) if img.starts_with("data:image") => img.to_string(),
        Some(img) => format!("data:image/png;base64,{}", img),
        None => "data:image/png;base64,".to_string(),
    }
}
