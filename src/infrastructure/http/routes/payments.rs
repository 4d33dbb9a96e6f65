//! Payments routes

use std::sync::Arc;

use warp::Filter;

use crate::application::services::payments_service::PaymentsService;
use crate::config::AppConfig;
use crate::infrastructure::http::handlers::{
    handle_bank_callback, handle_create_payment, handle_get_payment, handle_payment_status,
};
use crate::infrastructure::http::utils::{with_security, with_shared};
use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::middleware::security_headers::SecurityHeadersMiddleware;

pub struct PaymentsRoutes;

impl PaymentsRoutes {
    pub fn create_routes(
        config: &AppConfig,
        service: Arc<PaymentsService>,
        limiter: Arc<RateLimitMiddleware>,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let security = SecurityHeadersMiddleware::new(&config.security);
        let body_limit = config.server.max_request_size as u64;

        let create = warp::path!("api" / "create-payment")
            .and(warp::post())
            .and(warp::body::content_length_limit(body_limit))
            .and(warp::body::bytes())
            .and(with_shared(service.clone()))
            .and(with_security(security.clone()))
            .and_then(handle_create_payment);

        let status = warp::path!("api" / "payment-status" / String)
            .and(warp::get())
            .and(with_shared(service.clone()))
            .and(with_shared(limiter))
            .and(with_security(security.clone()))
            .and_then(handle_payment_status);

        let detail = warp::path!("api" / "payment" / String)
            .and(warp::get())
            .and(with_shared(service))
            .and(with_security(security.clone()))
            .and_then(handle_get_payment);

        let callback = warp::path!("webhook" / "payment")
            .and(warp::post())
            .and(warp::body::content_length_limit(body_limit))
            .and(warp::body::bytes())
            .and(with_security(security))
            .and_then(handle_bank_callback);

        create.or(status).or(detail).or(callback)
    }
}
