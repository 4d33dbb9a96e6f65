//! HTTP responses module
//!
//! Turns warp rejections into the JSON error envelope used by the API.

use std::convert::Infallible;

use serde_json::json;
use tracing::{debug, error};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Rejection, Reply};

use crate::shared::error::AppError;

fn error_body(status: StatusCode, message: &str) -> Response {
    warp::reply::with_status(
        warp::reply::json(&json!({ "success": false, "error": message })),
        status,
    )
    .into_response()
}

/// Final rejection handler for every route
pub async fn handle_rejection(rejection: Rejection) -> Result<Response, Infallible> {
    if rejection.is_not_found() {
        return Ok(error_body(StatusCode::NOT_FOUND, "Not found"));
    }

    if let Some(err) = rejection.find::<AppError>() {
        let response = warp::reply::with_status(warp::reply::json(&err.to_json()), err.http_status_code());
        return Ok(response.into_response());
    }

    let (status, message) = if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else if rejection.find::<warp::cors::CorsForbidden>().is_some() {
        (StatusCode::FORBIDDEN, "Origin not allowed")
    } else if rejection.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Content-Length required")
    } else if rejection.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported media type")
    } else {
        error!(rejection = ?rejection, "Unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };

    debug!(status = status.as_u16(), "Request rejected");
    Ok(error_body(status, message))
}
