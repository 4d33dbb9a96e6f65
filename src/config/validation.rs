//! Configuration validation module
//!
//! This module provides additional validation logic for configuration
//! beyond the basic validator crate validation.

use crate::config::app_config::{
    BankConfig, PaymentsAppConfig, RateLimitConfig, SecurityConfig, WebhookConfig,
};
use crate::config::AppConfig;
use crate::shared::error::{AppError, AppResult};

/// Configuration validator for additional validation logic
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the complete configuration
    pub fn validate_config(config: &AppConfig) -> AppResult<()> {
        Self::validate_bank_config(&config.bank)?;
        Self::validate_webhook_config(&config.webhooks)?;
        Self::validate_payments_config(&config.payments)?;
        Self::validate_rate_limit_config(&config.rate_limit)?;
        Self::validate_security_config(&config.security)?;

        Ok(())
    }

    /// CORS values are handed to warp, which panics on malformed entries
    fn validate_security_config(security: &SecurityConfig) -> AppResult<()> {
        for origin in &security.cors_origins {
            if origin == "*" {
                tracing::warn!("CORS is configured to allow any origin");
                continue;
            }
            let parsed = reqwest::Url::parse(origin)
                .map_err(|e| AppError::Validation(format!("Invalid CORS origin {}: {}", origin, e)))?;
            if parsed.host_str().is_none() || parsed.path() != "/" || origin.ends_with('/') {
                return Err(AppError::Validation(format!(
                    "CORS origin must be scheme://host[:port], got {}",
                    origin
                )));
            }
        }

        for method in &security.cors_methods {
            warp::http::Method::from_bytes(method.as_bytes())
                .map_err(|_| AppError::Validation(format!("Invalid CORS method: {}", method)))?;
        }

        for header in &security.cors_headers {
            warp::http::header::HeaderName::from_bytes(header.as_bytes())
                .map_err(|_| AppError::Validation(format!("Invalid CORS header: {}", header)))?;
        }

        Ok(())
    }

    fn validate_bank_config(bank: &BankConfig) -> AppResult<()> {
        Self::validate_service_url("Bank auth URL", &bank.auth_url)?;
        Self::validate_service_url("Bank QR URL", &bank.qr_url)?;

        if bank.token_safety_margin_seconds >= bank.token_lifetime_seconds {
            return Err(AppError::Validation(
                "Token safety margin must be shorter than the token lifetime".to_string(),
            ));
        }

        Ok(())
    }

    /// Bank URLs must be http(s); anything not on localhost must be https
    fn validate_service_url(name: &str, url: &str) -> AppResult<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AppError::Validation(format!(
                "{} must start with http:// or https://",
                name
            )));
        }

        if url.contains("localhost") || url.contains("127.0.0.1") {
            Ok(())
        } else if !url.starts_with("https://") {
            Err(AppError::Validation(format!("Production {} must use HTTPS", name)))
        } else {
            Ok(())
        }
    }

    fn validate_webhook_config(webhooks: &WebhookConfig) -> AppResult<()> {
        for (name, url) in [("main", &webhooks.main_url), ("upsell", &webhooks.upsell_url)] {
            if url.is_empty() {
                tracing::warn!(destination = name, "Purchase webhook destination not configured");
                continue;
            }
            reqwest::Url::parse(url).map_err(|e| {
                AppError::Validation(format!("Invalid {} webhook URL: {}", name, e))
            })?;
        }

        if matches!(&webhooks.secret, Some(secret) if secret.is_empty()) {
            return Err(AppError::Validation(
                "Webhook secret must not be empty when set".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_payments_config(payments: &PaymentsAppConfig) -> AppResult<()> {
        if let Some(rate) = payments.exchange_rate {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(AppError::Validation(
                    "Exchange rate must be a positive number".to_string(),
                ));
            }
        }

        Ok(())
    }

    fn validate_rate_limit_config(rate_limit: &RateLimitConfig) -> AppResult<()> {
        if rate_limit.enabled && rate_limit.burst_size > rate_limit.status_checks_per_minute {
            return Err(AppError::Validation(
                "Burst size cannot be greater than requests per minute".to_string(),
            ));
        }

        Ok(())
    }
}
