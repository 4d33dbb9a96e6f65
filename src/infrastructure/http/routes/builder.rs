//! Route builder module
//!
//! Assembles every route group with CORS, rejection handling and access
//! logging.

use std::convert::Infallible;
use std::sync::Arc;

use warp::Filter;

use crate::application::services::PaymentsService;
use crate::application::use_cases::HealthCheckUseCase;
use crate::config::AppConfig;
use crate::infrastructure::http::responses::handle_rejection;
use crate::infrastructure::http::routes::{HealthRoutes, PageRoutes, PaymentsRoutes};
use crate::middleware::cors::cors_policy;
use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::shared::logging::LoggingUtils;
use crate::shared::metrics::MetricsUtils;

pub struct RouteBuilder;

impl RouteBuilder {
    pub fn build_routes(
        config: &AppConfig,
        payments_service: Arc<PaymentsService>,
        health_use_case: Arc<HealthCheckUseCase>,
        rate_limiter: Arc<RateLimitMiddleware>,
        metrics: Arc<MetricsUtils>,
    ) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
        let payments = PaymentsRoutes::create_routes(config, payments_service, rate_limiter);
        let health = HealthRoutes::create_routes(config, health_use_case, metrics);
        let pages = PageRoutes::create_routes();

        let access_log = warp::log::custom(|info| {
            LoggingUtils::log_access(
                info.method().as_str(),
                info.path(),
                info.status().as_u16(),
                info.elapsed().as_millis(),
            )
        });

        payments
            .or(health)
            .or(pages)
            .with(cors_policy(&config.security))
            .recover(handle_rejection)
            .with(access_log)
    }
}
