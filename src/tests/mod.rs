//! Test suite for the QR checkout service
//!
//! - `common`: fakes and wiremock helpers shared by unit and HTTP tests
//! - `integration`: full HTTP flows against stubbed bank and webhook servers

pub mod common;
pub mod integration;

/// Test configuration and utilities
pub mod config {
    use crate::config::AppConfig;
    use std::sync::Once;
    use tempfile::TempDir;
    use wiremock::MockServer;

    static INIT: Once = Once::new();

    /// Initialize tracing once for the whole test binary
    pub fn init() {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter("qr_checkout=debug")
                .with_test_writer()
                .try_init();
        });
    }

    /// Configuration pointing at stub servers and a throwaway store
    pub fn test_config(dir: &TempDir, bank: &MockServer, hooks: &MockServer) -> AppConfig {
        let mut config = AppConfig::default();

        config.server.port = 0;
        config.bank.auth_url = bank.uri();
        config.bank.qr_url = bank.uri();
        config.bank.account_id = "acc".to_string();
        config.bank.authorization_id = "authz".to_string();
        config.payments.storage_path = dir.path().join("payments.json").display().to_string();
        config.payments.diagnostic_status_check = false;
        config.webhooks.main_url = format!("{}/main", hooks.uri());
        config.webhooks.upsell_url = format!("{}/upsell", hooks.uri());
        config.webhooks.backoff_base_ms = 5;
        config.rate_limit.enabled = false;

        config
    }
}

/// Test utilities and helpers
pub mod utils {
    use std::time::Duration;
    use tokio::time::sleep;

    /// Wait for a condition to be true
    pub async fn wait_for<F, Fut>(mut condition: F, timeout: Duration) -> bool
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let start = std::time::Instant::now();
        while start.elapsed() < timeout {
            if condition().await {
                return true;
            }
            sleep(Duration::from_millis(10)).await;
        }
        false
    }
}
