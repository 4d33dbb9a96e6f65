//! Bank status code normalization
//!
//! The QR status field is numeric in some bank environments and a string
//! token in others. Numeric interpretation is always tried first.

use serde::Serialize;
use serde_json::Value;

use super::payments::{PaymentStatus, PaymentUpdate};

/// Map a numeric bank status code
pub fn status_from_code(code: f64) -> PaymentStatus {
    if code == 2.0 {
        PaymentStatus::Paid
    } else if code == 3.0 {
        PaymentStatus::Expired
    } else if code == 4.0 {
        PaymentStatus::Error
    } else {
        PaymentStatus::Pending
    }
}

/// Map a string bank status token (case-insensitive)
pub fn status_from_token(token: &str) -> PaymentStatus {
    match token.trim().to_uppercase().as_str() {
        "USED" | "PAID" => PaymentStatus::Paid,
        "EXPIRED" => PaymentStatus::Expired,
        "ERROR" => PaymentStatus::Error,
        _ => PaymentStatus::Pending,
    }
}

/// Numeric reading of a raw status value, if it has one.
///
/// Blank strings, null and booleans read as numbers that map to nothing,
/// so they fall through to `pending` either way.
fn numeric_code(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        _ => None,
    }
}

/// Normalize whatever the bank returned into the fixed status vocabulary
pub fn normalize_status(raw: &Value) -> PaymentStatus {
    match numeric_code(raw) {
        Some(code) => status_from_code(code),
        None => match raw {
            Value::String(s) => status_from_token(s),
            _ => PaymentStatus::Pending,
        },
    }
}

/// A status the bank actually answered with
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub qr_id: String,
    pub status: PaymentStatus,
    pub is_paid: bool,
    pub expiration_date: Option<Value>,
    pub provider_status_code: Option<Value>,
    pub provider_qr_id: Option<Value>,
    pub voucher_id: Option<Value>,
}

impl StatusReport {
    pub fn to_update(&self) -> PaymentUpdate {
        PaymentUpdate {
            status: self.status,
            payment_date: None,
            provider_status_code: self.provider_status_code.clone(),
            provider_qr_id: self.provider_qr_id.clone(),
            voucher_id: self.voucher_id.clone(),
        }
    }
}

/// Outcome of one status poll.
///
/// `Inconclusive` covers provider outages and business failures; callers
/// present it as `pending` so the client keeps polling.
#[derive(Debug, Clone, PartialEq)]
pub enum PollResult {
    Confirmed(StatusReport),
    Inconclusive { qr_id: String, reason: String },
}

impl PollResult {
    pub fn status(&self) -> PaymentStatus {
        match self {
            PollResult::Confirmed(report) => report.status,
            PollResult::Inconclusive { .. } => PaymentStatus::Pending,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status().is_paid()
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, PollResult::Confirmed(_))
    }

    pub fn report(&self) -> Option<&StatusReport> {
        match self {
            PollResult::Confirmed(report) => Some(report),
            PollResult::Inconclusive { .. } => None,
        }
    }
}
