//! HTTP utilities - filters that inject shared state into handlers

use std::convert::Infallible;
use std::sync::Arc;

use warp::Filter;

use crate::middleware::security_headers::SecurityHeadersMiddleware;

/// Hand a shared value to every request
pub fn with_shared<T>(value: Arc<T>) -> impl Filter<Extract = (Arc<T>,), Error = Infallible> + Clone
where
    T: Send + Sync + ?Sized + 'static,
{
    warp::any().map(move || value.clone())
}

pub fn with_security(
    security: SecurityHeadersMiddleware,
) -> impl Filter<Extract = (SecurityHeadersMiddleware,), Error = Infallible> + Clone {
    warp::any().map(move || security.clone())
}
