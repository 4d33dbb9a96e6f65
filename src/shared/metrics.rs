//! Metrics utilities module
//!
//! Counters for the payment lifecycle, exposed as JSON on `/metrics`.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

/// Metrics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    pub payments_created: u64,
    pub payment_creation_failures: u64,
    pub status_checks_confirmed: u64,
    pub status_checks_inconclusive: u64,
    pub payments_confirmed_paid: u64,
    pub webhooks_delivered: u64,
    pub webhooks_skipped: u64,
    pub webhooks_failed: u64,
    pub rate_limited_requests: u64,
    pub uptime_seconds: u64,
}

/// Lock-free counters shared by services and handlers
pub struct MetricsUtils {
    payments_created: AtomicU64,
    payment_creation_failures: AtomicU64,
    status_checks_confirmed: AtomicU64,
    status_checks_inconclusive: AtomicU64,
    payments_confirmed_paid: AtomicU64,
    webhooks_delivered: AtomicU64,
    webhooks_skipped: AtomicU64,
    webhooks_failed: AtomicU64,
    rate_limited_requests: AtomicU64,
    start_time: SystemTime,
}

impl MetricsUtils {
    pub fn new() -> Self {
        Self {
            payments_created: AtomicU64::new(0),
            payment_creation_failures: AtomicU64::new(0),
            status_checks_confirmed: AtomicU64::new(0),
            status_checks_inconclusive: AtomicU64::new(0),
            payments_confirmed_paid: AtomicU64::new(0),
            webhooks_delivered: AtomicU64::new(0),
            webhooks_skipped: AtomicU64::new(0),
            webhooks_failed: AtomicU64::new(0),
            rate_limited_requests: AtomicU64::new(0),
            start_time: SystemTime::now(),
        }
    }

    pub fn increment_payments_created(&self) {
        self.payments_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_payment_creation_failures(&self) {
        self.payment_creation_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one provider status poll
    pub fn record_status_check(&self, confirmed: bool) {
        if confirmed {
            self.status_checks_confirmed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.status_checks_inconclusive.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn increment_payments_confirmed_paid(&self) {
        self.payments_confirmed_paid.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_webhooks_delivered(&self) {
        self.webhooks_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_webhooks_skipped(&self) {
        self.webhooks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_webhooks_failed(&self) {
        self.webhooks_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rate_limited_requests(&self) {
        self.rate_limited_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics
    pub fn get_metrics(&self) -> Metrics {
        let uptime = SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or(Duration::from_secs(0))
            .as_secs();

        Metrics {
            payments_created: self.payments_created.load(Ordering::Relaxed),
            payment_creation_failures: self.payment_creation_failures.load(Ordering::Relaxed),
            status_checks_confirmed: self.status_checks_confirmed.load(Ordering::Relaxed),
            status_checks_inconclusive: self.status_checks_inconclusive.load(Ordering::Relaxed),
            payments_confirmed_paid: self.payments_confirmed_paid.load(Ordering::Relaxed),
            webhooks_delivered: self.webhooks_delivered.load(Ordering::Relaxed),
            webhooks_skipped: self.webhooks_skipped.load(Ordering::Relaxed),
            webhooks_failed: self.webhooks_failed.load(Ordering::Relaxed),
            rate_limited_requests: self.rate_limited_requests.load(Ordering::Relaxed),
            uptime_seconds: uptime,
        }
    }
}

impl Default for MetricsUtils {
    fn default() -> Self {
        Self::new()
    }
}
