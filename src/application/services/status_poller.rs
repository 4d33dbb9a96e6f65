//! Status poller
//!
//! Asks the bank for a QR's current status and normalizes the answer. Bank
//! failures never escape: they come back as `PollResult::Inconclusive`,
//! which callers present as `pending`.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::provider::QrProvider;
use crate::domain::status::{normalize_status, PollResult, StatusReport};
use crate::shared::metrics::MetricsUtils;

pub struct StatusPoller {
    provider: Arc<dyn QrProvider>,
    metrics: Arc<MetricsUtils>,
}

impl StatusPoller {
    pub fn new(provider: Arc<dyn QrProvider>, metrics: Arc<MetricsUtils>) -> Self {
        Self { provider, metrics }
    }

    pub async fn check_status(&self, qr_id: &str) -> PollResult {
        let result = match self.provider.qr_status(qr_id).await {
            Ok(raw) => {
                let status = normalize_status(raw.status_code.as_ref().unwrap_or(&serde_json::Value::Null));
                debug!(qr_id = %qr_id, raw_status = ?raw.status_code, status = %status, "Bank status normalized");

                PollResult::Confirmed(StatusReport {
                    qr_id: qr_id.to_string(),
                    status,
                    is_paid: status.is_paid(),
                    expiration_date: raw.expiration_date,
                    provider_status_code: raw.status_code,
                    provider_qr_id: raw.provider_qr_id,
                    voucher_id: raw.voucher_id,
                })
            }
            Err(e) => {
                warn!(qr_id = %qr_id, error = %e, "Status poll inconclusive, reporting pending");
                PollResult::Inconclusive {
                    qr_id: qr_id.to_string(),
                    reason: e.to_string(),
                }
            }
        };

        self.metrics.record_status_check(result.is_confirmed());
        result
    }
}
