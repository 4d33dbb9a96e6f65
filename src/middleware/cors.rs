//! CORS policy built from the security configuration

use tracing::info;

use crate::config::app_config::SecurityConfig;

/// Build the warp CORS filter. Entries are checked by `ConfigValidator` at load.
pub fn cors_policy(config: &SecurityConfig) -> warp::cors::Builder {
    let builder = if config.cors_origins.iter().any(|o| o == "*") {
        warp::cors().allow_any_origin()
    } else {
        warp::cors().allow_origins(config.cors_origins.iter().map(String::as_str))
    };

    info!(
        origins = ?config.cors_origins,
        methods = ?config.cors_methods,
        "CORS policy configured"
    );

    builder
        .allow_methods(config.cors_methods.iter().map(String::as_str))
        .allow_headers(config.cors_headers.iter().map(String::as_str))
}
