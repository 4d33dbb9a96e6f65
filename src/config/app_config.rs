//! Application configuration structures
//!
//! This module contains the main configuration structures for the application.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use validator::Validate;

use crate::shared::error::{AppError, AppResult};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Server address to bind to
    pub bind_address: IpAddr,

    /// Server port
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,

    /// Maximum request size in bytes
    #[validate(range(min = 1024, max = 10485760))] // 1KB to 10MB
    pub max_request_size: usize,
}

/// Issuing bank API configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BankConfig {
    /// Base URL of the authentication API
    #[validate(url)]
    pub auth_url: String,

    /// Base URL of the QR payment API
    #[validate(url)]
    pub qr_url: String,

    /// Static account credential
    #[validate(length(min = 1))]
    pub account_id: String,

    /// Static authorization credential
    #[validate(length(min = 1))]
    pub authorization_id: String,

    /// Timeout for authentication calls in seconds
    #[validate(range(min = 1, max = 300))]
    pub auth_timeout_seconds: u64,

    /// Timeout for QR API calls in seconds
    #[validate(range(min = 1, max = 300))]
    pub api_timeout_seconds: u64,

    /// Token lifetime quoted by the bank
    #[validate(range(min = 60, max = 86400))]
    pub token_lifetime_seconds: i64,

    /// Subtracted from the quoted lifetime before a token is considered stale
    #[validate(range(min = 0, max = 3600))]
    pub token_safety_margin_seconds: i64,
}

impl BankConfig {
    /// Effective validity window of a freshly issued token
    pub fn effective_token_validity(&self) -> chrono::Duration {
        chrono::Duration::seconds((self.token_lifetime_seconds - self.token_safety_margin_seconds).max(0))
    }
}

/// Payment creation and storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PaymentsAppConfig {
    /// Path of the JSON file holding every payment record
    #[validate(length(min = 1))]
    pub storage_path: String,

    /// Currency requested from the bank
    #[validate(length(equal = 3))]
    pub currency: String,

    /// Prefix of locally generated transaction ids
    #[validate(length(min = 1, max = 16))]
    pub transaction_prefix: String,

    /// Prefix of the human-readable gloss sent with each QR
    #[validate(length(min = 1))]
    pub gloss_prefix: String,

    /// Product name used when the caller sends none
    #[validate(length(min = 1))]
    pub default_product: String,

    /// Days until an issued QR expires
    #[validate(range(min = 1, max = 30))]
    pub expiration_days: i64,

    /// Poll the bank once right after creating a QR
    pub diagnostic_status_check: bool,

    /// Multiplier applied to incoming amounts; unset means amounts are already in `currency`
    pub exchange_rate: Option<f64>,
}

/// Downstream purchase webhook configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WebhookConfig {
    /// Destination for main-product purchases (empty = not configured)
    pub main_url: String,

    /// Destination for upsell purchases (empty = not configured)
    pub upsell_url: String,

    /// Shared secret for the HMAC-SHA256 body signature
    pub secret: Option<String>,

    /// Delivery attempts before giving up
    #[validate(range(min = 1, max = 10))]
    pub max_attempts: u32,

    /// Linear backoff step in milliseconds
    #[validate(range(max = 60000))]
    pub backoff_base_ms: u64,

    /// Per-attempt timeout in seconds
    #[validate(range(min = 1, max = 120))]
    pub timeout_seconds: u64,
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SecurityConfig {
    /// Allowed CORS origins
    pub cors_origins: Vec<String>,

    /// Allowed CORS methods
    pub cors_methods: Vec<String>,

    /// Allowed CORS headers
    pub cors_headers: Vec<String>,

    /// Enable security headers on JSON responses
    pub enable_security_headers: bool,
}

/// Rate limiting configuration for the status polling endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RateLimitConfig {
    /// Status checks per minute per payment id
    #[validate(range(min = 1, max = 10000))]
    pub status_checks_per_minute: u32,

    /// Burst size
    #[validate(range(min = 1, max = 1000))]
    pub burst_size: u32,

    /// Enable rate limiting
    pub enabled: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoggingConfig {
    /// Log level
    #[validate(length(min = 1))]
    pub level: String,

    /// Log format ("json" or "pretty")
    #[validate(length(min = 1))]
    pub format: String,

    /// Include thread ids and source locations
    pub structured: bool,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub bank: BankConfig,
    pub payments: PaymentsAppConfig,
    pub webhooks: WebhookConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            max_request_size: 1024 * 1024, // 1MB
        }
    }
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            auth_url: "https://marketapi.bnb.com.bo/ClientAuthentication.API/api/v1".to_string(),
            qr_url: "https://marketapi.bnb.com.bo/QRSimple.API/api/v1".to_string(),
            account_id: "change-me".to_string(),
            authorization_id: "change-me".to_string(),
            auth_timeout_seconds: 15,
            api_timeout_seconds: 30,
            token_lifetime_seconds: 3600,
            token_safety_margin_seconds: 300,
        }
    }
}

impl Default for PaymentsAppConfig {
    fn default() -> Self {
        Self {
            storage_path: "payments.json".to_string(),
            currency: "BOB".to_string(),
            transaction_prefix: "MENT".to_string(),
            gloss_prefix: "Mentoría".to_string(),
            default_product: "Mentoría de Cero al Millón".to_string(),
            expiration_days: 1,
            diagnostic_status_check: true,
            exchange_rate: None,
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            main_url: String::new(),
            upsell_url: String::new(),
            secret: None,
            max_attempts: 3,
            backoff_base_ms: 500,
            timeout_seconds: 15,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_origins: vec!["*".to_string()],
            cors_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "DELETE".to_string(),
            ],
            cors_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            enable_security_headers: true,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // Clients poll every 3 seconds; leave headroom for page reloads
        Self {
            status_checks_per_minute: 60,
            burst_size: 10,
            enabled: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            structured: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            bank: BankConfig::default(),
            payments: PaymentsAppConfig::default(),
            webhooks: WebhookConfig::default(),
            security: SecurityConfig::default(),
            rate_limit: RateLimitConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> AppResult<Self> {
        let defaults = config::Config::try_from(&AppConfig::default())?;

        let config = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name("Conf").required(false))
            .add_source(
                config::Environment::with_prefix("QR_CHECKOUT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build configuration: {}", e)))?;

        let config: AppConfig = config
            .try_deserialize()
            .map_err(|e| AppError::Config(format!("Failed to deserialize configuration: {}", e)))?;

        config.validate_config()?;
        crate::config::ConfigValidator::validate_config(&config)?;

        Ok(config)
    }

    /// Validate every section
    pub fn validate_config(&self) -> Result<(), validator::ValidationErrors> {
        self.server.validate()?;
        self.bank.validate()?;
        self.payments.validate()?;
        self.webhooks.validate()?;
        self.security.validate()?;
        self.rate_limit.validate()?;
        self.logging.validate()?;

        Ok(())
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }
}
