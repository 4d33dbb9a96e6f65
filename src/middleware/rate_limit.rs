//! Per-payment rate limiting for the status polling endpoint

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::config::app_config::RateLimitConfig;
use crate::shared::error::{AppError, AppResult};
use crate::shared::logging::LoggingUtils;
use crate::shared::metrics::MetricsUtils;

/// Keys kept before idle buckets are swept
const SWEEP_THRESHOLD: usize = 10_000;

/// Keyed limiter; each payment id gets its own bucket
pub struct RateLimitMiddleware {
    limiter: Option<DefaultKeyedRateLimiter<String>>,
    per_minute: u32,
    metrics: Arc<MetricsUtils>,
}

impl RateLimitMiddleware {
    pub fn new(config: &RateLimitConfig, metrics: Arc<MetricsUtils>) -> AppResult<Self> {
        let limiter = if config.enabled {
            let per_minute = NonZeroU32::new(config.status_checks_per_minute).ok_or_else(|| {
                AppError::Config("status_checks_per_minute must be greater than zero".to_string())
            })?;
            let burst = NonZeroU32::new(config.burst_size)
                .ok_or_else(|| AppError::Config("burst_size must be greater than zero".to_string()))?;
            Some(RateLimiter::keyed(Quota::per_minute(per_minute).allow_burst(burst)))
        } else {
            None
        };

        Ok(Self {
            limiter,
            per_minute: config.status_checks_per_minute,
            metrics,
        })
    }

    /// Consume one cell for `key`, failing with `RateLimit` when exhausted
    pub fn check(&self, key: &str) -> AppResult<()> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };

        if limiter.len() > SWEEP_THRESHOLD {
            limiter.retain_recent();
        }

        limiter.check_key(&key.to_string()).map_err(|_| {
            self.metrics.increment_rate_limited_requests();
            LoggingUtils::log_rate_limit(key, self.per_minute);
            AppError::RateLimit
        })
    }
}
