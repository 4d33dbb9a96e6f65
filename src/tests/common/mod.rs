//! Common test utilities and fakes

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::domain::provider::{IssuedQr, ProviderStatus, QrIntent, QrProvider};
use crate::shared::error::{AppError, AppResult};

/// In-process stand-in for the bank QR API
#[derive(Default)]
pub struct FakeProvider {
    status: Mutex<Option<AppResult<Value>>>,
    create_error: Mutex<Option<AppError>>,
    last_intent: Mutex<Option<QrIntent>>,
    create_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

impl FakeProvider {
    /// Raw status value returned by every following poll
    pub fn set_status(&self, raw: Value) {
        *self.status.lock().unwrap() = Some(Ok(raw));
    }

    pub fn fail_status_with(&self, error: AppError) {
        *self.status.lock().unwrap() = Some(Err(error));
    }

    pub fn fail_create_with(&self, error: AppError) {
        *self.create_error.lock().unwrap() = Some(error);
    }

    pub fn last_intent(&self) -> Option<QrIntent> {
        self.last_intent.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QrProvider for FakeProvider {
    async fn create_qr(&self, intent: &QrIntent) -> AppResult<IssuedQr> {
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(error) = self.create_error.lock().unwrap().clone() {
            return Err(error);
        }
        *self.last_intent.lock().unwrap() = Some(intent.clone());

        Ok(IssuedQr {
            qr_id: format!("qr-{}", n),
            image: Some("iVBORw0KGgo=".to_string()),
        })
    }

    async fn qr_status(&self, _qr_id: &str) -> AppResult<ProviderStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        match self.status.lock().unwrap().clone() {
            None => Ok(ProviderStatus {
                status_code: Some(json!(1)),
                ..ProviderStatus::default()
            }),
            Some(Ok(raw)) => Ok(ProviderStatus {
                status_code: Some(raw),
                ..ProviderStatus::default()
            }),
            Some(Err(e)) => Err(e),
        }
    }
}

/// Stub the bank token endpoint
pub async fn mount_bank_token(bank: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "test-token"
        })))
        .mount(bank)
        .await;
}

/// Stub QR creation; every QR gets `qr_id`
pub async fn mount_bank_create(bank: &MockServer, qr_id: &str) {
    Mock::given(method("POST"))
        .and(path("/main/getQRWithImageAsync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "qrId": qr_id,
            "qr": "iVBORw0KGgo="
        })))
        .mount(bank)
        .await;
}

/// Stub the status endpoint with a fixed `statusId`
pub async fn mount_bank_status(bank: &MockServer, status_id: Value) {
    Mock::given(method("POST"))
        .and(path("/main/getQRStatusAsync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "statusId": status_id,
            "id": 4521,
            "voucherId": "V-1",
            "expirationDate": "2026-10-20"
        })))
        .mount(bank)
        .await;
}

/// Requests the stub received on `route`
pub async fn requests_to(server: &MockServer, route: &str) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == route)
        .collect()
}
