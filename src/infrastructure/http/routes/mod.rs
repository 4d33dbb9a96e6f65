//! HTTP routes module

pub mod builder;
pub mod health;
pub mod pages;
pub mod payments;

pub use builder::RouteBuilder;
pub use health::HealthRoutes;
pub use pages::PageRoutes;
pub use payments::PaymentsRoutes;
