use crate::{
    domain::health::*,
    infrastructure::adapters::PaymentsStore,
    shared::error::AppResult,
};
use serde_json::json;
use std::sync::Arc;

/// Health check use case
pub struct HealthCheckUseCase {
    store: Arc<PaymentsStore>,
}

impl HealthCheckUseCase {
    pub fn new(store: Arc<PaymentsStore>) -> Self {
        Self { store }
    }

    /// Healthy while the payments file can be read (or has not been created yet)
    pub async fn execute(&self) -> AppResult<HealthResponse> {
        let mut details = json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION"),
        });

        let status = match self.store.count().await {
            Ok(count) => {
                details["storage"] = json!({
                    "path": self.store.path().display().to_string(),
                    "initialized": self.store.exists().await,
                    "payments": count,
                });
                HealthStatus::Healthy
            }
            Err(e) => {
                details["storage"] = json!({
                    "path": self.store.path().display().to_string(),
                    "error": e.to_string(),
                });
                details["warnings"] = json!(["Payments file is unreadable"]);
                HealthStatus::Degraded
            }
        };

        Ok(HealthResponse::new(status, details))
    }
}
