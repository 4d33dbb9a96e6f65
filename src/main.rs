use qr_checkout::shared::logging::LoggingUtils;
use qr_checkout::{AppConfig, HttpServer};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // a missing .env is normal outside development
    let _ = dotenvy::dotenv();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = LoggingUtils::initialize(
        &config.logging.level,
        &config.logging.format,
        config.logging.structured,
    ) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Configuration loaded successfully");

    let server = match HttpServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to initialize server: {}", e);
            std::process::exit(1);
        }
    };

    info!("Server starting on {}", server.config().server_address());

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
