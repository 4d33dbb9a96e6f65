//! QR Checkout - bank QR payments with settlement polling and purchase webhooks
//!
//! This library issues single-use QR payment requests through the bank's API,
//! tracks their settlement in a JSON file store and forwards one
//! `purchase.completed` event per paid payment to a downstream webhook.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod middleware;
pub mod shared;

pub use config::AppConfig;
pub use infrastructure::http::HttpServer;
pub use shared::error::{AppError, AppResult};

#[cfg(test)]
mod tests;
