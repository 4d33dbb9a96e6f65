//! Bank authentication adapter
//!
//! Obtains bearer tokens from the bank's authentication API and caches the
//! current one together with its computed expiry. The cache belongs to the
//! adapter instance; nothing here is process-global.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::config::app_config::BankConfig;
use crate::shared::error::{AppError, AppResult};

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    account_id: &'a str,
    authorization_id: &'a str,
}

/// The bank returns the token in `message` on success and the failure text there otherwise
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Bearer token client for the bank API
pub struct BankAuthClient {
    http: reqwest::Client,
    config: BankConfig,
    clock: Arc<dyn Clock>,
    state: RwLock<Option<CachedToken>>,
}

impl BankAuthClient {
    pub fn new(config: &BankConfig) -> AppResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &BankConfig, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.auth_timeout_seconds))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config: config.clone(),
            clock,
            state: RwLock::new(None),
        })
    }

    /// Return a token that is valid right now, authenticating if needed
    pub async fn ensure_valid_token(&self) -> AppResult<String> {
        let now = self.clock.now();
        if let Some(cached) = self.state.read().await.as_ref() {
            if now < cached.expires_at {
                return Ok(cached.token.clone());
            }
        }

        self.authenticate().await
    }

    /// Request a fresh token and replace the cached one
    pub async fn authenticate(&self) -> AppResult<String> {
        let url = format!("{}/auth/token", self.config.auth_url.trim_end_matches('/'));
        info!(url = %url, "Authenticating with bank");

        match self.request_token(&url).await {
            Ok(token) => {
                let expires_at = self.clock.now() + self.config.effective_token_validity();
                *self.state.write().await = Some(CachedToken {
                    token: token.clone(),
                    expires_at,
                });
                info!(expires_at = %expires_at.to_rfc3339(), "Bank authentication succeeded");
                Ok(token)
            }
            Err(e) => {
                self.invalidate().await;
                error!(error = %e, "Bank authentication failed");
                Err(e)
            }
        }
    }

    async fn request_token(&self, url: &str) -> AppResult<String> {
        let body = TokenRequest {
            account_id: &self.config.account_id,
            authorization_id: &self.config.authorization_id,
        };

        let response = self
            .http
            .post(url)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Authentication(format!("auth request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Authentication(format!("auth response unreadable: {}", e)))?;
        let parsed: Option<TokenResponse> = serde_json::from_str(&text).ok();

        match parsed {
            Some(TokenResponse { success: true, message: Some(token) })
                if status.is_success() && !token.is_empty() =>
            {
                Ok(token)
            }
            Some(TokenResponse { message, .. }) => Err(AppError::Authentication(format!(
                "bank refused credentials (HTTP {}): {}",
                status.as_u16(),
                message.unwrap_or_else(|| "no message".to_string())
            ))),
            None => Err(AppError::Authentication(format!(
                "unexpected auth response (HTTP {})",
                status.as_u16()
            ))),
        }
    }

    /// Drop the cached token so the next call re-authenticates
    pub async fn invalidate(&self) {
        *self.state.write().await = None;
    }

    /// Expiry of the cached token, if any
    pub async fn token_expiry(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.as_ref().map(|t| t.expires_at)
    }
}
