//! Outbound purchase webhook delivery
//!
//! POSTs an already-serialized event body to a destination URL with bounded
//! retries. Attempt `n` that fails is followed by a `backoff_base × n` pause;
//! nothing waits after the final attempt.

use std::time::Duration;

use bytes::Bytes;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};

use crate::config::app_config::WebhookConfig;
use crate::shared::error::{AppError, AppResult};

pub const EVENT_HEADER: &str = "X-Event";
pub const SIGNATURE_HEADER: &str = "X-Signature";

type HmacSha256 = Hmac<Sha256>;

/// Hex HMAC-SHA256 of the exact body bytes
pub fn sign_payload(secret: &str, body: &[u8]) -> AppResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("Invalid webhook secret: {}", e)))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// HTTP client for downstream purchase webhooks
pub struct WebhookClient {
    http: reqwest::Client,
    max_attempts: u32,
    backoff_base: Duration,
}

impl WebhookClient {
    pub fn new(config: &WebhookConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        })
    }

    /// Deliver `body` to `url`. Returns the attempt number that succeeded.
    pub async fn deliver(
        &self,
        url: &str,
        body: Bytes,
        event: &str,
        signature: Option<&str>,
    ) -> AppResult<u32> {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match self.post_once(url, body.clone(), event, signature).await {
                Ok(()) => {
                    debug!(url = %url, attempt, "Webhook accepted");
                    return Ok(attempt);
                }
                Err(e) => {
                    warn!(url = %url, attempt, max_attempts = self.max_attempts, error = %e, "Webhook attempt failed");
                    last_error = e;
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.backoff_base * attempt).await;
            }
        }

        Err(AppError::Notification(format!(
            "delivery to {} failed after {} attempts: {}",
            url, self.max_attempts, last_error
        )))
    }

    async fn post_once(
        &self,
        url: &str,
        body: Bytes,
        event: &str,
        signature: Option<&str>,
    ) -> Result<(), String> {
        let mut request = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(EVENT_HEADER, event)
            .body(body);
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }

        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(format!("HTTP {}: {}", status.as_u16(), text))
        }
    }
}
