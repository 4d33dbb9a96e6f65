//! Purchase webhook notifier
//!
//! Sends the `purchase.completed` event for a paid payment at most once.
//! The `webhook_notified` flag in the store is the idempotency guard; calls
//! for the same payment id are serialized so overlapping polls cannot both
//! pass the guard.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::app_config::WebhookConfig;
use crate::domain::payments::{Customer, PaymentRecord, WebhookDestination};
use crate::infrastructure::adapters::payments_store::PaymentsStore;
use crate::infrastructure::adapters::purchase_webhook::{sign_payload, WebhookClient};
use crate::shared::error::AppResult;
use crate::shared::metrics::MetricsUtils;

pub const PURCHASE_EVENT: &str = "purchase.completed";
const EVENT_VERSION: &str = "1.0";
const PROVIDER_TAG: &str = "BNB-QR-Simple";

/// Why a notification was not attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    StorageMissing,
    PaymentNotFound,
    AlreadyNotified,
    NotPaid,
    NoDestination,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::StorageMissing => "storage_missing",
            SkipReason::PaymentNotFound => "payment_not_found",
            SkipReason::AlreadyNotified => "already_notified",
            SkipReason::NotPaid => "not_paid",
            SkipReason::NoDestination => "no_destination",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotifyOutcome {
    Delivered {
        destination: WebhookDestination,
        attempts: u32,
    },
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Serialize)]
struct EventCustomer<'a> {
    name: Option<&'a str>,
    email: Option<&'a str>,
    phone: Option<&'a str>,
}

impl<'a> From<&'a Customer> for EventCustomer<'a> {
    fn from(customer: &'a Customer) -> Self {
        Self {
            name: customer.name.as_deref(),
            email: customer.email.as_deref(),
            phone: customer.phone.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct EventMeta<'a> {
    transaction_id: &'a str,
    gloss: Option<&'a str>,
    provider_status_code: Option<&'a Value>,
    provider_qr_id: Option<&'a Value>,
    voucher_id: Option<&'a Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Wire shape of the purchase event
#[derive(Debug, Serialize)]
pub struct PurchaseEvent<'a> {
    event: &'static str,
    version: &'static str,
    provider: &'static str,
    payment_id: &'a str,
    status: &'static str,
    currency: &'a str,
    amount_bob: f64,
    paid_at: DateTime<Utc>,
    product: &'a str,
    product_type: &'a str,
    customer: EventCustomer<'a>,
    extras: &'a [Value],
    meta: EventMeta<'a>,
}

impl<'a> PurchaseEvent<'a> {
    /// Missing timestamps fall back to the send time
    pub fn from_record(record: &'a PaymentRecord) -> Self {
        let now = Utc::now();
        Self {
            event: PURCHASE_EVENT,
            version: EVENT_VERSION,
            provider: PROVIDER_TAG,
            payment_id: &record.payment_id,
            status: "paid",
            currency: &record.currency,
            amount_bob: record.amount_bob,
            paid_at: record.payment_date.or(record.updated_at).unwrap_or(now),
            product: &record.product,
            product_type: &record.product_type,
            customer: EventCustomer::from(&record.customer),
            extras: &record.extras,
            meta: EventMeta {
                transaction_id: &record.transaction_id,
                gloss: record.gloss.as_deref(),
                provider_status_code: record.provider_status_code.as_ref(),
                provider_qr_id: record.provider_qr_id.as_ref(),
                voucher_id: record.voucher_id.as_ref(),
                created_at: record.created_at,
                updated_at: record.updated_at.unwrap_or(now),
            },
        }
    }
}

pub struct WebhookNotifier {
    store: Arc<PaymentsStore>,
    client: WebhookClient,
    config: WebhookConfig,
    metrics: Arc<MetricsUtils>,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl WebhookNotifier {
    pub fn new(
        store: Arc<PaymentsStore>,
        config: WebhookConfig,
        metrics: Arc<MetricsUtils>,
    ) -> AppResult<Self> {
        Ok(Self {
            client: WebhookClient::new(&config)?,
            store,
            config,
            metrics,
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    fn destination_url(&self, destination: WebhookDestination) -> Option<&str> {
        let url = match destination {
            WebhookDestination::Main => self.config.main_url.trim(),
            WebhookDestination::Upsell => self.config.upsell_url.trim(),
        };
        (!url.is_empty()).then_some(url)
    }

    async fn payment_lock(&self, payment_id: &str) -> Arc<Mutex<()>> {
        self.in_flight
            .lock()
            .await
            .entry(payment_id.to_string())
            .or_default()
            .clone()
    }

    async fn release_lock(&self, payment_id: &str) {
        let mut in_flight = self.in_flight.lock().await;
        // only the map still holds it
        if in_flight.get(payment_id).is_some_and(|l| Arc::strong_count(l) == 1) {
            in_flight.remove(payment_id);
        }
    }

    /// Deliver the purchase event for `payment_id` unless a guard says not to
    pub async fn notify_once(&self, payment_id: &str) -> NotifyOutcome {
        let lock = self.payment_lock(payment_id).await;
        let outcome = {
            let _guard = lock.lock().await;
            self.notify_locked(payment_id).await
        };
        drop(lock);
        self.release_lock(payment_id).await;

        match &outcome {
            NotifyOutcome::Delivered { .. } => self.metrics.increment_webhooks_delivered(),
            NotifyOutcome::Skipped(_) => self.metrics.increment_webhooks_skipped(),
            NotifyOutcome::Failed(_) => self.metrics.increment_webhooks_failed(),
        }
        outcome
    }

    async fn notify_locked(&self, payment_id: &str) -> NotifyOutcome {
        if !self.store.exists().await {
            return self.skip(payment_id, SkipReason::StorageMissing);
        }

        let record = match self.store.get(payment_id).await {
            Ok(Some(record)) => record,
            Ok(None) => return self.skip(payment_id, SkipReason::PaymentNotFound),
            Err(e) => {
                error!(payment_id = %payment_id, error = %e, "Payments file unreadable, webhook not sent");
                return self.skip(payment_id, SkipReason::StorageMissing);
            }
        };

        if record.webhook_notified {
            return self.skip(payment_id, SkipReason::AlreadyNotified);
        }
        if !record.status.is_paid() {
            return self.skip(payment_id, SkipReason::NotPaid);
        }

        let destination = WebhookDestination::resolve(&record.product_type, &record.product);
        let Some(url) = self.destination_url(destination) else {
            warn!(payment_id = %payment_id, destination = destination.as_str(), "No webhook URL configured");
            return self.skip(payment_id, SkipReason::NoDestination);
        };

        let body = match serde_json::to_vec(&PurchaseEvent::from_record(&record)) {
            Ok(body) => Bytes::from(body),
            Err(e) => return NotifyOutcome::Failed(e.to_string()),
        };
        let signature = match self.config.secret.as_deref() {
            Some(secret) => match sign_payload(secret, &body) {
                Ok(signature) => Some(signature),
                Err(e) => return NotifyOutcome::Failed(e.to_string()),
            },
            None => None,
        };

        let attempts = match self
            .client
            .deliver(url, body, PURCHASE_EVENT, signature.as_deref())
            .await
        {
            Ok(attempts) => attempts,
            Err(e) => {
                error!(
                    payment_id = %payment_id,
                    destination = destination.as_str(),
                    error = %e,
                    "Webhook delivery exhausted, payment left un-notified"
                );
                return NotifyOutcome::Failed(e.to_string());
            }
        };

        if let Err(e) = self.store.mark_notified(payment_id, Utc::now()).await {
            // the event went out but the flag could not be saved; a later poll may resend
            error!(payment_id = %payment_id, error = %e, "Webhook delivered but notified flag not saved");
            return NotifyOutcome::Failed(e.to_string());
        }

        info!(
            payment_id = %payment_id,
            transaction_id = %record.transaction_id,
            destination = destination.as_str(),
            attempts,
            "Purchase webhook delivered"
        );
        NotifyOutcome::Delivered { destination, attempts }
    }

    fn skip(&self, payment_id: &str, reason: SkipReason) -> NotifyOutcome {
        info!(payment_id = %payment_id, reason = reason.as_str(), "Webhook skipped");
        NotifyOutcome::Skipped(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payments::fixtures::{paid_record, pending_record};
    use tempfile::TempDir;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn webhook_config(server: &MockServer) -> WebhookConfig {
        WebhookConfig {
            main_url: format!("{}/main", server.uri()),
            upsell_url: format!("{}/upsell", server.uri()),
            secret: None,
            max_attempts: 3,
            backoff_base_ms: 5,
            timeout_seconds: 5,
        }
    }

    fn notifier(dir: &TempDir, config: WebhookConfig) -> (Arc<PaymentsStore>, WebhookNotifier) {
        let store = Arc::new(PaymentsStore::new(dir.path().join("payments.json")));
        let notifier =
            WebhookNotifier::new(store.clone(), config, Arc::new(MetricsUtils::new())).unwrap();
        (store, notifier)
    }

    #[tokio::test]
    async fn test_storage_missing() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let (_, notifier) = notifier(&dir, webhook_config(&server));

        assert_eq!(
            notifier.notify_once("qr-1").await,
            NotifyOutcome::Skipped(SkipReason::StorageMissing)
        );
    }

    #[tokio::test]
    async fn test_unreadable_store_is_storage_missing() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("payments.json"), "{\"qr-1\": [").unwrap();
        let (_, notifier) = notifier(&dir, webhook_config(&server));

        assert_eq!(
            notifier.notify_once("qr-1").await,
            NotifyOutcome::Skipped(SkipReason::StorageMissing)
        );
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn test_event_timestamps_never_null() {
        let mut record = paid_record("qr-1");
        record.payment_date = None;
        record.updated_at = None;

        let event = serde_json::to_value(PurchaseEvent::from_record(&record)).unwrap();

        assert!(event["paid_at"].is_string());
        assert!(event["meta"]["updated_at"].is_string());
        assert!(event["meta"]["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_payment_not_found() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let (store, notifier) = notifier(&dir, webhook_config(&server));
        store.put(&pending_record("qr-1")).await.unwrap();

        assert_eq!(
            notifier.notify_once("qr-2").await,
            NotifyOutcome::Skipped(SkipReason::PaymentNotFound)
        );
    }

    #[tokio::test]
    async fn test_not_paid_makes_no_network_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let (store, notifier) = notifier(&dir, webhook_config(&server));
        store.put(&pending_record("qr-1")).await.unwrap();

        assert_eq!(
            notifier.notify_once("qr-1").await,
            NotifyOutcome::Skipped(SkipReason::NotPaid)
        );
    }

    #[tokio::test]
    async fn test_second_call_is_already_notified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/main"))
            .and(body_partial_json(serde_json::json!({
                "event": "purchase.completed",
                "payment_id": "qr-1",
                "status": "paid",
                "provider": "BNB-QR-Simple"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let (store, notifier) = notifier(&dir, webhook_config(&server));
        store.put(&paid_record("qr-1")).await.unwrap();

        assert_eq!(
            notifier.notify_once("qr-1").await,
            NotifyOutcome::Delivered { destination: WebhookDestination::Main, attempts: 1 }
        );
        assert_eq!(
            notifier.notify_once("qr-1").await,
            NotifyOutcome::Skipped(SkipReason::AlreadyNotified)
        );
        assert!(store.get("qr-1").await.unwrap().unwrap().webhook_notified);
    }

    #[tokio::test]
    async fn test_concurrent_calls_deliver_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let (store, notifier) = notifier(&dir, webhook_config(&server));
        store.put(&paid_record("qr-1")).await.unwrap();
        let notifier = Arc::new(notifier);

        let a = tokio::spawn({
            let n = notifier.clone();
            async move { n.notify_once("qr-1").await }
        });
        let b = tokio::spawn({
            let n = notifier.clone();
            async move { n.notify_once("qr-1").await }
        });
        let outcomes = [a.await.unwrap(), b.await.unwrap()];

        let delivered = outcomes
            .iter()
            .filter(|o| matches!(o, NotifyOutcome::Delivered { .. }))
            .count();
        assert_eq!(delivered, 1);
        assert!(notifier.in_flight.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_upsell_routing_and_signature() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upsell"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let mut config = webhook_config(&server);
        config.secret = Some("s3cret".to_string());
        let (store, notifier) = notifier(&dir, config);
        let mut record = paid_record("qr-1");
        record.product_type = "upsell".to_string();
        store.put(&record).await.unwrap();

        assert_eq!(
            notifier.notify_once("qr-1").await,
            NotifyOutcome::Delivered { destination: WebhookDestination::Upsell, attempts: 1 }
        );

        let requests = server.received_requests().await.unwrap();
        let signature = requests[0].headers.get("x-signature").unwrap().to_str().unwrap();
        assert_eq!(signature, sign_payload("s3cret", &requests[0].body).unwrap());
    }

    #[tokio::test]
    async fn test_no_destination() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let mut config = webhook_config(&server);
        config.main_url = String::new();
        let (store, notifier) = notifier(&dir, config);
        store.put(&paid_record("qr-1")).await.unwrap();

        assert_eq!(
            notifier.notify_once("qr-1").await,
            NotifyOutcome::Skipped(SkipReason::NoDestination)
        );
    }

    #[tokio::test]
    async fn test_failed_delivery_leaves_flag_unset() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;
        let dir = TempDir::new().unwrap();
        let (store, notifier) = notifier(&dir, webhook_config(&server));
        store.put(&paid_record("qr-1")).await.unwrap();

        assert!(matches!(notifier.notify_once("qr-1").await, NotifyOutcome::Failed(_)));
        assert!(!store.get("qr-1").await.unwrap().unwrap().webhook_notified);
    }
}
