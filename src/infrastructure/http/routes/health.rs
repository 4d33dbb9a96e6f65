//! Health and metrics routes

use std::sync::Arc;

use warp::Filter;

use crate::application::use_cases::HealthCheckUseCase;
use crate::config::AppConfig;
use crate::infrastructure::http::handlers::{handle_health_request, handle_metrics_request};
use crate::infrastructure::http::utils::{with_security, with_shared};
use crate::middleware::security_headers::SecurityHeadersMiddleware;
use crate::shared::metrics::MetricsUtils;

pub struct HealthRoutes;

impl HealthRoutes {
    pub fn create_routes(
        config: &AppConfig,
        health_use_case: Arc<HealthCheckUseCase>,
        metrics: Arc<MetricsUtils>,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let security = SecurityHeadersMiddleware::new(&config.security);

        let health = warp::path!("health")
            .and(warp::get())
            .and(with_shared(health_use_case))
            .and(with_security(security.clone()))
            .and_then(handle_health_request);

        let metrics = warp::path!("metrics")
            .and(warp::get())
            .and(with_shared(metrics))
            .and(with_security(security))
            .and_then(handle_metrics_request);

        health.or(metrics)
    }
}
