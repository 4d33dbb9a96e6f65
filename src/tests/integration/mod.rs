//! End-to-end HTTP flows
//!
//! Each test runs the full route tree against a wiremock bank, a wiremock
//! webhook receiver and a payments file in a temporary directory.

use serde_json::{json, Value};
use tempfile::TempDir;
use tokio_test::assert_ok;
use warp::http::StatusCode;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::AppConfig;
use crate::infrastructure::http::server::HttpServer;
use crate::tests::common::{mount_bank_create, mount_bank_status, mount_bank_token, requests_to};
use crate::tests::config::{init, test_config};

struct Harness {
    dir: TempDir,
    bank: MockServer,
    hooks: MockServer,
}

impl Harness {
    async fn start() -> Self {
        init();
        let harness = Self {
            dir: TempDir::new().unwrap(),
            bank: MockServer::start().await,
            hooks: MockServer::start().await,
        };
        mount_bank_token(&harness.bank).await;
        harness
    }

    fn config(&self) -> AppConfig {
        test_config(&self.dir, &self.bank, &self.hooks)
    }

    async fn accept_webhooks(&self) {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.hooks)
            .await;
    }

    fn store_path(&self) -> std::path::PathBuf {
        self.dir.path().join("payments.json")
    }
}

fn body_json(response: &warp::http::Response<bytes::Bytes>) -> Value {
    assert_ok!(serde_json::from_slice::<Value>(response.body()))
}

async fn create(server: &HttpServer, body: Value) -> warp::http::Response<bytes::Bytes> {
    warp::test::request()
        .method("POST")
        .path("/api/create-payment")
        .json(&body)
        .reply(&server.routes())
        .await
}

async fn poll(server: &HttpServer, payment_id: &str) -> warp::http::Response<bytes::Bytes> {
    warp::test::request()
        .method("GET")
        .path(&format!("/api/payment-status/{}", payment_id))
        .reply(&server.routes())
        .await
}

fn ana(product_type: &str) -> Value {
    json!({
        "customer": {"name": "Ana", "email": "ana@example.com"},
        "amount": 100,
        "product": "Mentoría 1:1",
        "product_type": product_type,
    })
}

#[tokio::test]
async fn test_create_payment_returns_pending_qr() {
    let h = Harness::start().await;
    mount_bank_create(&h.bank, "4521").await;
    let server = HttpServer::new(h.config()).unwrap();

    let response = create(&server, ana("main")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(&response);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["qr_id"], "4521");
    assert_eq!(body["amount_bob"], 100.0);
    assert_eq!(body["currency"], "BOB");
    assert!(body["qr_code_image"].as_str().unwrap().starts_with("data:image"));
    assert_eq!(body["payment_id"], "4521");
    assert!(body["transaction_id"].as_str().unwrap().starts_with("MENT_"));

    let stored: Value = serde_json::from_str(&std::fs::read_to_string(h.store_path()).unwrap()).unwrap();
    let id = body["payment_id"].as_str().unwrap();
    assert_eq!(stored[id]["status"], "pending");
    assert_eq!(stored[id]["customer"]["name"], "Ana");
}

#[tokio::test]
async fn test_paid_status_notifies_once() {
    let h = Harness::start().await;
    mount_bank_create(&h.bank, "4521").await;
    mount_bank_status(&h.bank, json!(2)).await;
    h.accept_webhooks().await;
    let server = HttpServer::new(h.config()).unwrap();

    let created = body_json(&create(&server, ana("main")).await);
    let id = created["payment_id"].as_str().unwrap();

    let first = body_json(&poll(&server, id).await);
    assert_eq!(first["status"], "paid");
    assert_eq!(first["is_paid"], true);
    assert!(first["payment_date"].is_string());

    let second = body_json(&poll(&server, id).await);
    assert_eq!(second["status"], "paid");

    let deliveries = requests_to(&h.hooks, "/main").await;
    assert_eq!(deliveries.len(), 1);
    let event: Value = serde_json::from_slice(&deliveries[0].body).unwrap();
    assert_eq!(event["payment_id"], id);
    assert_eq!(event["status"], "paid");
    assert!(requests_to(&h.hooks, "/upsell").await.is_empty());

    let stored: Value = serde_json::from_str(&std::fs::read_to_string(h.store_path()).unwrap()).unwrap();
    assert_eq!(stored[id]["webhook_notified"], true);
}

#[tokio::test]
async fn test_upsell_routes_to_upsell_hook() {
    let h = Harness::start().await;
    mount_bank_create(&h.bank, "4522").await;
    mount_bank_status(&h.bank, json!("PAID")).await;
    h.accept_webhooks().await;
    let server = HttpServer::new(h.config()).unwrap();

    let created = body_json(&create(&server, ana("upsell")).await);
    let id = created["payment_id"].as_str().unwrap();
    assert_eq!(body_json(&poll(&server, id).await)["status"], "paid");

    assert_eq!(requests_to(&h.hooks, "/upsell").await.len(), 1);
    assert!(requests_to(&h.hooks, "/main").await.is_empty());
}

#[tokio::test]
async fn test_pending_status_sends_nothing() {
    let h = Harness::start().await;
    mount_bank_create(&h.bank, "4523").await;
    mount_bank_status(&h.bank, json!(1)).await;
    h.accept_webhooks().await;
    let server = HttpServer::new(h.config()).unwrap();

    let created = body_json(&create(&server, ana("main")).await);
    let view = body_json(&poll(&server, created["payment_id"].as_str().unwrap()).await);

    assert_eq!(view["status"], "pending");
    assert_eq!(view["is_paid"], false);
    assert!(h.hooks.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bank_failure_reports_pending() {
    let h = Harness::start().await;
    mount_bank_create(&h.bank, "4524").await;
    Mock::given(method("POST"))
        .and(path("/main/getQRStatusAsync"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&h.bank)
        .await;
    let server = HttpServer::new(h.config()).unwrap();

    let created = body_json(&create(&server, ana("main")).await);
    let response = poll(&server, created["payment_id"].as_str().unwrap()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(&response)["status"], "pending");
}

#[tokio::test]
async fn test_non_positive_amount_rejected_before_bank() {
    let h = Harness::start().await;
    let server = HttpServer::new(h.config()).unwrap();

    let response = create(
        &server,
        json!({"customer": {"name": "Ana", "email": "ana@example.com"}, "amount": -5}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(&response)["error"], "Amount must be greater than zero");
    assert!(requests_to(&h.bank, "/main/getQRWithImageAsync").await.is_empty());
    assert!(!h.store_path().exists());
}

#[tokio::test]
async fn test_oversized_amount_rejected_before_bank() {
    let h = Harness::start().await;
    let server = HttpServer::new(h.config()).unwrap();

    let response = create(
        &server,
        json!({"customer": {"name": "Ana", "email": "ana@example.com"}, "amount": 1e307}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(&response)["error"], "Amount exceeds the maximum allowed");
    assert!(requests_to(&h.bank, "/main/getQRWithImageAsync").await.is_empty());
    assert!(!h.store_path().exists());
}

#[tokio::test]
async fn test_missing_customer_rejected() {
    let h = Harness::start().await;
    let server = HttpServer::new(h.config()).unwrap();

    let response = create(&server, json!({"amount": 10})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(&response)["error"],
        "Required fields: customer (name, email), amount"
    );
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let h = Harness::start().await;
    let server = HttpServer::new(h.config()).unwrap();

    let response = warp::test::request()
        .method("POST")
        .path("/api/create-payment")
        .header("content-type", "application/json")
        .body("{\"customer\":")
        .reply(&server.routes())
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(&response)["success"], false);
}

#[tokio::test]
async fn test_bank_rejection_is_server_error() {
    let h = Harness::start().await;
    Mock::given(method("POST"))
        .and(path("/main/getQRWithImageAsync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Cuenta inactiva"
        })))
        .mount(&h.bank)
        .await;
    let server = HttpServer::new(h.config()).unwrap();

    let response = create(&server, ana("main")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(&response);
    assert_eq!(body["error"], "Failed to create QR payment");
    assert!(body["details"].as_str().unwrap().contains("Cuenta inactiva"));
    assert!(!h.store_path().exists());
}

#[tokio::test]
async fn test_get_payment_record() {
    let h = Harness::start().await;
    mount_bank_create(&h.bank, "4525").await;
    let server = HttpServer::new(h.config()).unwrap();

    let created = body_json(&create(&server, ana("main")).await);
    let id = created["payment_id"].as_str().unwrap();

    let response = warp::test::request()
        .path(&format!("/api/payment/{}", id))
        .reply(&server.routes())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(&response);
    assert_eq!(body["success"], true);
    assert_eq!(body["payment"]["payment_id"], id);
    assert_eq!(body["payment"]["qr_id"], "4525");

    let missing = warp::test::request()
        .path("/api/payment/MP_unknown")
        .reply(&server.routes())
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(&missing)["error"], "Payment not found");
}

#[tokio::test]
async fn test_status_rate_limited_per_payment() {
    let h = Harness::start().await;
    mount_bank_status(&h.bank, json!(1)).await;
    let mut config = h.config();
    config.rate_limit.enabled = true;
    config.rate_limit.burst_size = 1;
    let server = HttpServer::new(config).unwrap();

    assert_eq!(poll(&server, "MP_a").await.status(), StatusCode::OK);
    let limited = poll(&server, "MP_a").await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(poll(&server, "MP_b").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let h = Harness::start().await;
    mount_bank_create(&h.bank, "4526").await;
    let server = HttpServer::new(h.config()).unwrap();
    create(&server, ana("main")).await;

    let health = warp::test::request().path("/health").reply(&server.routes()).await;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(body_json(&health)["details"]["storage"]["payments"], 1);

    let metrics = warp::test::request().path("/metrics").reply(&server.routes()).await;
    assert_eq!(metrics.status(), StatusCode::OK);
    assert_eq!(body_json(&metrics)["payments_created"], 1);
}

#[tokio::test]
async fn test_pages_and_unknown_routes() {
    let h = Harness::start().await;
    let server = HttpServer::new(h.config()).unwrap();

    let index = warp::test::request().path("/").reply(&server.routes()).await;
    assert_eq!(index.status(), StatusCode::OK);
    assert!(String::from_utf8_lossy(index.body()).contains("create-payment"));

    let success = warp::test::request().path("/success").reply(&server.routes()).await;
    assert_eq!(success.status(), StatusCode::OK);

    let unknown = warp::test::request().path("/api/nope").reply(&server.routes()).await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(&unknown)["success"], false);
}

#[tokio::test]
async fn test_bank_callback_acknowledged() {
    let h = Harness::start().await;
    let server = HttpServer::new(h.config()).unwrap();

    let response = warp::test::request()
        .method("POST")
        .path("/webhook/payment")
        .json(&json!({"qrId": "4521", "statusId": 2}))
        .reply(&server.routes())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(&response), json!({"received": true}));
}
