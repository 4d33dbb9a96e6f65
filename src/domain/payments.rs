//! Payments domain models and types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Settlement status of a QR payment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Expired,
    Error,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Expired => "expired",
            PaymentStatus::Error => "error",
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }

    /// Merge a freshly observed status into the recorded one.
    ///
    /// Statuses only move forward from `pending`. `paid` is never given up,
    /// and a settled payment wins over an earlier `expired`/`error` reading.
    pub fn reconcile(self, observed: PaymentStatus) -> PaymentStatus {
        match (self, observed) {
            (PaymentStatus::Paid, _) => PaymentStatus::Paid,
            (_, PaymentStatus::Paid) => PaymentStatus::Paid,
            (current, PaymentStatus::Pending) => current,
            (PaymentStatus::Pending, observed) => observed,
            (current, _) => current,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buyer details captured at checkout
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// One QR payment, keyed by the bank-issued QR id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRecord {
    pub transaction_id: String,
    pub payment_id: String,
    pub qr_id: String,
    pub qr_code_image: String,
    pub amount_bob: f64,
    pub currency: String,
    pub status: PaymentStatus,
    /// Mirrors `status == paid` for older callers
    #[serde(default)]
    pub is_paid: bool,
    pub expires_at: String,
    pub customer: Customer,
    #[serde(default)]
    pub extras: Vec<Value>,
    pub product: String,
    pub product_type: String,
    #[serde(default)]
    pub gloss: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub provider_status_code: Option<Value>,
    #[serde(default)]
    pub provider_qr_id: Option<Value>,
    #[serde(default)]
    pub voucher_id: Option<Value>,
    #[serde(default)]
    pub webhook_notified: bool,
    #[serde(default)]
    pub webhook_notified_at: Option<DateTime<Utc>>,
}

impl PaymentRecord {
    /// Apply a status observation, honoring forward-only transitions
    pub fn apply_update(&mut self, update: &PaymentUpdate, now: DateTime<Utc>) {
        let next = self.status.reconcile(update.status);
        if next.is_paid() && self.payment_date.is_none() {
            self.payment_date = Some(update.payment_date.unwrap_or(now));
        }
        self.status = next;
        self.is_paid = next.is_paid();

        if update.provider_status_code.is_some() {
            self.provider_status_code = update.provider_status_code.clone();
        }
        if update.provider_qr_id.is_some() {
            self.provider_qr_id = update.provider_qr_id.clone();
        }
        if update.voucher_id.is_some() {
            self.voucher_id = update.voucher_id.clone();
        }
        self.updated_at = Some(now);
    }
}

/// Partial update produced by a status poll
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentUpdate {
    pub status: PaymentStatus,
    pub payment_date: Option<DateTime<Utc>>,
    pub provider_status_code: Option<Value>,
    pub provider_qr_id: Option<Value>,
    pub voucher_id: Option<Value>,
}

/// Which downstream webhook receives the purchase event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookDestination {
    Main,
    Upsell,
}

impl WebhookDestination {
    /// Explicit product type wins; otherwise fall back to the product name
    pub fn resolve(product_type: &str, product: &str) -> Self {
        match product_type.trim().to_lowercase().as_str() {
            "upsell" => WebhookDestination::Upsell,
            "main" => WebhookDestination::Main,
            _ if product.to_lowercase().contains("upsell") => WebhookDestination::Upsell,
            _ => WebhookDestination::Main,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookDestination::Main => "main",
            WebhookDestination::Upsell => "upsell",
        }
    }
}
