//! Payment service orchestrating QR creation, status checks and notification

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::application::services::status_poller::StatusPoller;
use crate::application::services::webhook_notifier::{NotifyOutcome, WebhookNotifier};
use crate::config::app_config::PaymentsAppConfig;
use crate::domain::payments::{Customer, PaymentRecord, PaymentStatus};
use crate::domain::provider::{normalize_qr_image, QrIntent, QrProvider};
use crate::infrastructure::adapters::payments_store::PaymentsStore;
use crate::shared::error::{AppError, AppResult};
use crate::shared::metrics::MetricsUtils;

const REQUIRED_FIELDS_MESSAGE: &str = "Required fields: customer (name, email), amount";
const NON_POSITIVE_AMOUNT_MESSAGE: &str = "Amount must be greater than zero";
const AMOUNT_TOO_LARGE_MESSAGE: &str = "Amount exceeds the maximum allowed";
/// Upper bound on a single charge in the target currency
const MAX_AMOUNT: f64 = 1_000_000_000.0;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Body of `POST /api/create-payment`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePaymentRequest {
    pub customer: Option<CustomerInput>,
    /// Number or numeric string
    pub amount: Option<Value>,
    pub extras: Option<Vec<Value>>,
    pub product: Option<String>,
    pub product_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentCreated {
    pub success: bool,
    pub transaction_id: String,
    pub payment_id: String,
    pub qr_id: String,
    pub qr_code_image: String,
    pub qr_code_text: Option<String>,
    pub amount_bob: f64,
    pub currency: String,
    pub expires_at: String,
    pub status: PaymentStatus,
    pub gloss: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentStatusView {
    pub success: bool,
    pub payment_id: String,
    pub status: PaymentStatus,
    pub is_paid: bool,
    pub payment_date: Option<DateTime<Utc>>,
    pub amount: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Numeric reading of the incoming amount; `None` when it cannot be read
fn parse_amount(raw: &Value) -> Option<f64> {
    let amount = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    amount.filter(|n| n.is_finite())
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// `<prefix>_<unix millis>_<13 base36 chars>`
pub fn generate_transaction_id(prefix: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..13)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("{}_{}_{}", prefix, Utc::now().timestamp_millis(), suffix)
}

/// Validated creation input
struct NewPayment {
    customer: Customer,
    amount: f64,
    extras: Vec<Value>,
    product: Option<String>,
    product_type: Option<String>,
}

impl CreatePaymentRequest {
    fn validate(self) -> AppResult<NewPayment> {
        let customer = self.customer.unwrap_or_default();
        let (Some(name), Some(email)) = (non_blank(&customer.name), non_blank(&customer.email)) else {
            return Err(AppError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()));
        };

        let amount = match self.amount.as_ref() {
            None | Some(Value::Null) => return Err(AppError::Validation(REQUIRED_FIELDS_MESSAGE.to_string())),
            Some(Value::String(s)) if s.trim().is_empty() => {
                return Err(AppError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()))
            }
            Some(raw) => parse_amount(raw)
                .ok_or_else(|| AppError::Validation(NON_POSITIVE_AMOUNT_MESSAGE.to_string()))?,
        };
        if amount == 0.0 {
            return Err(AppError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()));
        }
        if amount < 0.0 {
            return Err(AppError::Validation(NON_POSITIVE_AMOUNT_MESSAGE.to_string()));
        }

        Ok(NewPayment {
            customer: Customer {
                name: Some(name.to_string()),
                email: Some(email.to_string()),
                phone: non_blank(&customer.phone).map(str::to_string),
            },
            amount,
            extras: self.extras.unwrap_or_default(),
            product: non_blank(&self.product).map(str::to_string),
            product_type: non_blank(&self.product_type).map(str::to_string),
        })
    }
}

pub struct PaymentsService {
    config: PaymentsAppConfig,
    provider: Arc<dyn QrProvider>,
    store: Arc<PaymentsStore>,
    poller: Arc<StatusPoller>,
    notifier: Arc<WebhookNotifier>,
    metrics: Arc<MetricsUtils>,
}

impl PaymentsService {
    pub fn new(
        config: PaymentsAppConfig,
        provider: Arc<dyn QrProvider>,
        store: Arc<PaymentsStore>,
        poller: Arc<StatusPoller>,
        notifier: Arc<WebhookNotifier>,
        metrics: Arc<MetricsUtils>,
    ) -> Self {
        Self { config, provider, store, poller, notifier, metrics }
    }

    /// Amount in the target currency, two decimals
    fn target_amount(&self, amount: f64) -> f64 {
        match self.config.exchange_rate {
            Some(rate) => round_cents(amount * rate),
            None => round_cents(amount),
        }
    }

    fn expiration_date(&self, now: DateTime<Utc>) -> String {
        (now + Duration::days(self.config.expiration_days))
            .format("%Y-%m-%d")
            .to_string()
    }

    /// Issue a QR with the bank and record the pending payment
    pub async fn create_payment(&self, request: CreatePaymentRequest) -> AppResult<PaymentCreated> {
        let input = request.validate()?;

        let now = Utc::now();
        let transaction_id = generate_transaction_id(&self.config.transaction_prefix);
        let amount_bob = self.target_amount(input.amount);
        if !amount_bob.is_finite() || amount_bob > MAX_AMOUNT {
            return Err(AppError::Validation(AMOUNT_TOO_LARGE_MESSAGE.to_string()));
        }
        if amount_bob <= 0.0 {
            return Err(AppError::Validation(NON_POSITIVE_AMOUNT_MESSAGE.to_string()));
        }
        let customer_name = input.customer.name.clone().unwrap_or_default();
        let gloss = format!("{} - {}", self.config.gloss_prefix, customer_name);
        let product_type = input.product_type.unwrap_or_else(|| "main".to_string());

        info!(
            transaction_id = %transaction_id,
            amount_bob,
            product_type = %product_type,
            "Creating QR payment"
        );

        let intent = QrIntent {
            currency: self.config.currency.clone(),
            gloss: gloss.clone(),
            amount: format!("{:.2}", amount_bob),
            single_use: true,
            expiration_date: self.expiration_date(now),
        };

        let issued = match self.provider.create_qr(&intent).await {
            Ok(issued) => issued,
            Err(e) => {
                self.metrics.increment_payment_creation_failures();
                error!(transaction_id = %transaction_id, error = %e, "QR creation failed");
                return Err(e);
            }
        };

        let record = PaymentRecord {
            transaction_id: transaction_id.clone(),
            payment_id: issued.qr_id.clone(),
            qr_id: issued.qr_id.clone(),
            qr_code_image: normalize_qr_image(issued.image.as_deref()),
            amount_bob,
            currency: self.config.currency.clone(),
            status: PaymentStatus::Pending,
            is_paid: false,
            expires_at: intent.expiration_date.clone(),
            customer: input.customer,
            extras: input.extras,
            product: input.product.unwrap_or_else(|| self.config.default_product.clone()),
            product_type,
            gloss: Some(gloss.clone()),
            created_at: now,
            updated_at: None,
            payment_date: None,
            provider_status_code: None,
            provider_qr_id: None,
            voucher_id: None,
            webhook_notified: false,
            webhook_notified_at: None,
        };

        if let Err(e) = self.store.put(&record).await {
            self.metrics.increment_payment_creation_failures();
            error!(payment_id = %record.payment_id, error = %e, "Issued QR could not be stored");
            return Err(e);
        }
        self.metrics.increment_payments_created();
        info!(payment_id = %record.payment_id, transaction_id = %transaction_id, "QR payment created");

        if self.config.diagnostic_status_check {
            self.spawn_diagnostic_check(record.payment_id.clone());
        }

        Ok(PaymentCreated {
            success: true,
            transaction_id,
            payment_id: record.payment_id,
            qr_id: record.qr_id,
            qr_code_image: record.qr_code_image,
            qr_code_text: None,
            amount_bob,
            currency: record.currency,
            expires_at: record.expires_at,
            status: PaymentStatus::Pending,
            gloss,
        })
    }

    /// One poll right after creation; only logged
    fn spawn_diagnostic_check(&self, payment_id: String) {
        let poller = self.poller.clone();
        tokio::spawn(async move {
            let result = poller.check_status(&payment_id).await;
            if result.is_paid() {
                warn!(payment_id = %payment_id, "Freshly issued QR already reported as paid");
            } else {
                info!(payment_id = %payment_id, status = %result.status(), "Initial status check");
            }
        });
    }

    /// Poll the bank, reconcile with the stored record and notify when paid
    pub async fn check_status(&self, payment_id: &str) -> AppResult<PaymentStatusView> {
        let poll = self.poller.check_status(payment_id).await;

        let stored = self.store.get(payment_id).await.unwrap_or_else(|e| {
            error!(payment_id = %payment_id, error = %e, "Stored payment unreadable during status check");
            None
        });
        let was_paid = stored.as_ref().is_some_and(|r| r.status.is_paid());

        let mut current = stored;
        if let Some(report) = poll.report().filter(|r| r.status != PaymentStatus::Pending) {
            match self.store.update(payment_id, &report.to_update()).await {
                Ok(Some(updated)) => current = Some(updated),
                Ok(None) => {}
                Err(e) => error!(payment_id = %payment_id, error = %e, "Failed to save polled status"),
            }
        }

        let status = match &current {
            Some(record) => record.status.reconcile(poll.status()),
            None => poll.status(),
        };

        if status.is_paid() {
            if !was_paid {
                self.metrics.increment_payments_confirmed_paid();
                info!(payment_id = %payment_id, "Payment confirmed as paid");
            }
            if let NotifyOutcome::Failed(reason) = self.notifier.notify_once(payment_id).await {
                warn!(payment_id = %payment_id, reason = %reason, "Webhook will be retried on the next paid poll");
            }
        }

        Ok(PaymentStatusView {
            success: true,
            payment_id: payment_id.to_string(),
            status,
            is_paid: status.is_paid(),
            payment_date: current.as_ref().and_then(|r| r.payment_date),
            amount: current.as_ref().map(|r| r.amount_bob),
            updated_at: Utc::now(),
        })
    }

    pub async fn get_payment(&self, payment_id: &str) -> AppResult<PaymentRecord> {
        self.store
            .get(payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))
    }
}
