//! Logging utilities module
//!
//! This module provides centralized logging functionality and utilities.

use crate::shared::error::{AppError, AppResult};
use tracing::{info, warn};

/// Logging utilities for the application
pub struct LoggingUtils;

impl LoggingUtils {
    /// Initialize logging with the specified configuration
    pub fn initialize(level: &str, format: &str, structured: bool) -> AppResult<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level));

        let builder = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(structured)
            .with_file(structured)
            .with_line_number(structured)
            .with_ansi(false);

        let result = if format.eq_ignore_ascii_case("json") {
            tracing::subscriber::set_global_default(builder.json().finish())
        } else {
            tracing::subscriber::set_global_default(builder.finish())
        };

        result.map_err(|e| AppError::Internal(format!("Failed to initialize logging: {}", e)))
    }

    /// Log an HTTP request once the response is known
    pub fn log_access(method: &str, path: &str, status: u16, elapsed_ms: u128) {
        if status >= 500 {
            warn!(method = %method, path = %path, status, elapsed_ms = %elapsed_ms, "Request failed");
        } else {
            info!(method = %method, path = %path, status, elapsed_ms = %elapsed_ms, "Request completed");
        }
    }

    /// Log a rejected request caused by rate limiting
    pub fn log_rate_limit(key: &str, limit: u32) {
        warn!(key = %key, limit_per_minute = limit, "Rate limit exceeded");
    }
}
