//! Metrics handler

use std::sync::Arc;

use warp::http::StatusCode;
use warp::reply::Response;

use crate::middleware::security_headers::{json_response, SecurityHeadersMiddleware};
use crate::shared::metrics::MetricsUtils;

/// Handle metrics requests
pub async fn handle_metrics_request(
    metrics: Arc<MetricsUtils>,
    security: SecurityHeadersMiddleware,
) -> Result<Response, warp::Rejection> {
    Ok(json_response(&metrics.get_metrics(), StatusCode::OK, &security))
}
