//! Bank QR API adapter
//!
//! HTTP implementation of [`QrProvider`]. Every call carries the current
//! bearer token; a 401 drops the token and the call is replayed exactly once
//! with a fresh one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::app_config::BankConfig;
use crate::domain::provider::{IssuedQr, ProviderStatus, QrIntent, QrProvider};
use crate::infrastructure::adapters::bank_auth::BankAuthClient;
use crate::shared::error::{AppError, AppResult};

const CREATE_QR_PATH: &str = "/main/getQRWithImageAsync";
const QR_STATUS_PATH: &str = "/main/getQRStatusAsync";

/// Adapter for the bank's QR payment API
pub struct BankQrAdapter {
    http: reqwest::Client,
    qr_url: String,
    auth: Arc<BankAuthClient>,
}

impl BankQrAdapter {
    pub fn new(config: &BankConfig, auth: Arc<BankAuthClient>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_seconds))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            qr_url: config.qr_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    async fn send(&self, url: &str, body: &Value, token: &str) -> AppResult<reqwest::Response> {
        self.http
            .post(url)
            .header("Accept", "application/json")
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("request to {} failed: {}", url, e)))
    }

    /// POST with bearer token, replaying once on 401
    async fn post_authorized(&self, path: &str, body: &Value) -> AppResult<Value> {
        let url = format!("{}{}", self.qr_url, path);

        let token = self.auth.ensure_valid_token().await?;
        let mut response = self.send(&url, body, &token).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(path = %path, "Bank rejected token, re-authenticating");
            self.auth.invalidate().await;
            let token = self.auth.ensure_valid_token().await?;
            response = self.send(&url, body, &token).await?;

            if response.status() == StatusCode::UNAUTHORIZED {
                self.auth.invalidate().await;
                return Err(AppError::Authentication(format!(
                    "bank rejected a freshly issued token on {}",
                    path
                )));
            }
        }

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Provider(format!("response from {} unreadable: {}", path, e)))?;
        debug!(path = %path, status = status.as_u16(), body = %text, "Bank response");

        let payload: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        if !status.is_success() {
            return Err(AppError::Provider(format!(
                "{} returned HTTP {}: {}",
                path,
                status.as_u16(),
                message_of(&payload).unwrap_or(text)
            )));
        }
        if payload.is_null() {
            return Err(AppError::Provider(format!("{} returned a non-JSON body", path)));
        }

        Ok(payload)
    }
}

/// First field in `keys` that is present and not null
fn first_present(payload: &Value, keys: &[&str]) -> Option<Value> {
    keys.iter()
        .filter_map(|key| payload.get(*key))
        .find(|value| !value.is_null())
        .cloned()
}

fn message_of(payload: &Value) -> Option<String> {
    payload.get("message").and_then(|m| m.as_str()).map(str::to_string)
}

/// QR ids come back as strings or numbers depending on the environment
fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl QrProvider for BankQrAdapter {
    async fn create_qr(&self, intent: &QrIntent) -> AppResult<IssuedQr> {
        let body = serde_json::to_value(intent)?;
        let payload = self.post_authorized(CREATE_QR_PATH, &body).await?;

        if payload.get("success").and_then(Value::as_bool) != Some(true) {
            return Err(AppError::Provider(
                message_of(&payload).unwrap_or_else(|| "Failed to create QR code".to_string()),
            ));
        }

        let qr_id = first_present(&payload, &["qrId", "id"])
            .as_ref()
            .and_then(id_to_string)
            .ok_or_else(|| AppError::Provider("bank response missing QR id".to_string()))?;
        let image = first_present(&payload, &["qr", "qrImage", "qrContent"])
            .and_then(|v| v.as_str().map(str::to_string));

        info!(
            qr_id = %qr_id,
            image_len = image.as_ref().map(|i| i.len()).unwrap_or(0),
            "Bank issued QR"
        );

        Ok(IssuedQr { qr_id, image })
    }

    async fn qr_status(&self, qr_id: &str) -> AppResult<ProviderStatus> {
        let payload = self
            .post_authorized(QR_STATUS_PATH, &json!({ "qrId": qr_id }))
            .await?;

        if payload.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(AppError::Provider(
                message_of(&payload).unwrap_or_else(|| "Failed to query QR status".to_string()),
            ));
        }

        Ok(ProviderStatus {
            status_code: first_present(&payload, &["statusId", "qrStatus", "status"]),
            expiration_date: first_present(&payload, &["expirationDate"]),
            provider_qr_id: first_present(&payload, &["id"]),
            voucher_id: first_present(&payload, &["voucherId"]),
        })
    }
}
