//! HTTP middleware: CORS, security headers and rate limiting

pub mod cors;
pub mod rate_limit;
pub mod security_headers;

pub use cors::cors_policy;
pub use rate_limit::RateLimitMiddleware;
pub use security_headers::{json_response, SecurityHeadersMiddleware};
