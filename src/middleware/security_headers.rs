//! Security headers for JSON responses

use serde::Serialize;
use warp::http::{header, HeaderValue, StatusCode};
use warp::reply::Response;
use warp::Reply;

use crate::config::app_config::SecurityConfig;

#[derive(Debug, Clone)]
pub struct SecurityHeadersMiddleware {
    enabled: bool,
}

impl SecurityHeadersMiddleware {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            enabled: config.enable_security_headers,
        }
    }

    pub fn apply(&self, mut response: Response) -> Response {
        if self.enabled {
            let headers = response.headers_mut();
            headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
            headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
            headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
        }
        response
    }
}

/// JSON body with status and, when enabled, security headers
pub fn json_response<T: Serialize>(
    body: &T,
    status: StatusCode,
    security: &SecurityHeadersMiddleware,
) -> Response {
    security.apply(warp::reply::with_status(warp::reply::json(body), status).into_response())
}
