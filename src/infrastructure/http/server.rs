//! HTTP server implementation
//!
//! Wires adapters, services and routes from one `AppConfig`.

use std::convert::Infallible;
use std::sync::Arc;

use tracing::{error, info, instrument};
use warp::{Filter, Reply};

use crate::{
    application::{
        services::{PaymentsService, StatusPoller, WebhookNotifier},
        use_cases::HealthCheckUseCase,
    },
    config::AppConfig,
    domain::provider::QrProvider,
    infrastructure::{
        adapters::{BankAuthClient, BankQrAdapter, PaymentsStore},
        http::routes::RouteBuilder,
    },
    middleware::rate_limit::RateLimitMiddleware,
    shared::{
        error::{AppError, AppResult},
        metrics::MetricsUtils,
    },
};

pub struct HttpServer {
    config: AppConfig,
    bank_auth: Arc<BankAuthClient>,
    payments_service: Arc<PaymentsService>,
    health_use_case: Arc<HealthCheckUseCase>,
    rate_limiter: Arc<RateLimitMiddleware>,
    metrics: Arc<MetricsUtils>,
}

impl HttpServer {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let metrics = Arc::new(MetricsUtils::new());

        // Infrastructure layer
        let bank_auth = Arc::new(BankAuthClient::new(&config.bank)?);
        let provider: Arc<dyn QrProvider> =
            Arc::new(BankQrAdapter::new(&config.bank, bank_auth.clone())?);
        let store = Arc::new(PaymentsStore::new(&config.payments.storage_path));

        // Application layer
        let poller = Arc::new(StatusPoller::new(provider.clone(), metrics.clone()));
        let notifier = Arc::new(WebhookNotifier::new(
            store.clone(),
            config.webhooks.clone(),
            metrics.clone(),
        )?);
        let payments_service = Arc::new(PaymentsService::new(
            config.payments.clone(),
            provider,
            store.clone(),
            poller,
            notifier,
            metrics.clone(),
        ));
        let health_use_case = Arc::new(HealthCheckUseCase::new(store));

        let rate_limiter = Arc::new(RateLimitMiddleware::new(&config.rate_limit, metrics.clone())?);

        Ok(Self {
            config,
            bank_auth,
            payments_service,
            health_use_case,
            rate_limiter,
            metrics,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn routes(&self) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
        RouteBuilder::build_routes(
            &self.config,
            self.payments_service.clone(),
            self.health_use_case.clone(),
            self.rate_limiter.clone(),
            self.metrics.clone(),
        )
    }

    /// Authenticate once in the background; failures are retried on first use
    fn warm_up_bank_token(&self) {
        let auth = self.bank_auth.clone();
        tokio::spawn(async move {
            match auth.authenticate().await {
                Ok(_) => info!("Initial bank authentication succeeded"),
                Err(e) => error!(error = %e, "Initial bank authentication failed"),
            }
        });
    }

    #[instrument(skip(self))]
    pub async fn run(self) -> AppResult<()> {
        let addr: std::net::SocketAddr = self
            .config
            .server_address()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid server address: {}", e)))?;

        self.warm_up_bank_token();

        info!(
            address = %addr,
            storage = %self.config.payments.storage_path,
            "Starting QR checkout server"
        );
        warp::serve(self.routes()).run(addr).await;

        Ok(())
    }
}
