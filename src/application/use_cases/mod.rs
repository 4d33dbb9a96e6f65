//! Use cases - Application-specific business logic

pub mod health_check;

pub use health_check::HealthCheckUseCase;
