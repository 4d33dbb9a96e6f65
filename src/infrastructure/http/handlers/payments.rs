//! Payments HTTP handlers

use std::sync::Arc;

use bytes::Bytes;
use serde_json::{json, Value};
use tracing::{info, warn};
use warp::http::StatusCode;
use warp::reply::Response;

use crate::application::services::payments_service::{CreatePaymentRequest, PaymentsService};
use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::middleware::security_headers::{json_response, SecurityHeadersMiddleware};
use crate::shared::error::AppError;

/// `POST /api/create-payment`
pub async fn handle_create_payment(
    body: Bytes,
    service: Arc<PaymentsService>,
    security: SecurityHeadersMiddleware,
) -> Result<Response, warp::Rejection> {
    let request: CreatePaymentRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            let err = AppError::from(e);
            return Ok(json_response(&err.to_json(), err.http_status_code(), &security));
        }
    };

    let response = match service.create_payment(request).await {
        Ok(created) => json_response(&created, StatusCode::OK, &security),
        Err(e @ AppError::Validation(_)) => {
            info!(error = %e, "Create payment rejected");
            json_response(&e.to_json(), e.http_status_code(), &security)
        }
        Err(e) => json_response(
            &json!({
                "success": false,
                "error": "Failed to create QR payment",
                "details": e.to_string(),
            }),
            StatusCode::INTERNAL_SERVER_ERROR,
            &security,
        ),
    };
    Ok(response)
}

/// `GET /api/payment-status/{id}`
pub async fn handle_payment_status(
    payment_id: String,
    service: Arc<PaymentsService>,
    limiter: Arc<RateLimitMiddleware>,
    security: SecurityHeadersMiddleware,
) -> Result<Response, warp::Rejection> {
    if let Err(e) = limiter.check(&payment_id) {
        return Ok(json_response(&e.to_json(), e.http_status_code(), &security));
    }

    let response = match service.check_status(&payment_id).await {
        Ok(view) => json_response(&view, StatusCode::OK, &security),
        Err(e) => {
            warn!(payment_id = %payment_id, error = %e, "Status check failed");
            json_response(
                &json!({ "success": false, "error": "Failed to check payment status" }),
                StatusCode::INTERNAL_SERVER_ERROR,
                &security,
            )
        }
    };
    Ok(response)
}

/// `GET /api/payment/{id}`
pub async fn handle_get_payment(
    payment_id: String,
    service: Arc<PaymentsService>,
    security: SecurityHeadersMiddleware,
) -> Result<Response, warp::Rejection> {
    let response = match service.get_payment(&payment_id).await {
        Ok(payment) => json_response(
            &json!({ "success": true, "payment": payment }),
            StatusCode::OK,
            &security,
        ),
        Err(e) => json_response(&e.to_json(), e.http_status_code(), &security),
    };
    Ok(response)
}

/// `POST /webhook/payment`: bank callbacks are acknowledged and logged only
pub async fn handle_bank_callback(
    body: Bytes,
    security: SecurityHeadersMiddleware,
) -> Result<Response, warp::Rejection> {
    match serde_json::from_slice::<Value>(&body) {
        Ok(payload) => info!(payload = %payload, "Bank callback received"),
        Err(_) => warn!(bytes = body.len(), "Bank callback with non-JSON body"),
    }

    Ok(json_response(&json!({ "received": true }), StatusCode::OK, &security))
}
