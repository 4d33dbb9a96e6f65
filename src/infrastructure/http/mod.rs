//! HTTP infrastructure module
//!
//! Server, routes, handlers and response helpers.

pub mod handlers;
pub mod responses;
pub mod routes;
pub mod server;
pub mod utils;

pub use responses::handle_rejection;
pub use server::HttpServer;
