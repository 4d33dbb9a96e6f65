//! Health check handler

use std::sync::Arc;

use warp::http::StatusCode;
use warp::reply::Response;

use crate::application::use_cases::HealthCheckUseCase;
use crate::middleware::security_headers::{json_response, SecurityHeadersMiddleware};

/// Handle health check requests
pub async fn handle_health_request(
    health_use_case: Arc<HealthCheckUseCase>,
    security: SecurityHeadersMiddleware,
) -> Result<Response, warp::Rejection> {
    let response = match health_use_case.execute().await {
        Ok(health) => {
            let status = if health.is_healthy() {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            json_response(&health, status, &security)
        }
        Err(e) => json_response(&e.to_json(), e.http_status_code(), &security),
    };
    Ok(response)
}
