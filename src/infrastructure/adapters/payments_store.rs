//! File-backed payments store
//!
//! All records live in one JSON object keyed by payment id. The whole file is
//! read before every operation and rewritten after every mutation through a
//! temp file + rename, so on disk it is always complete JSON or absent.
//! Read-modify-write cycles are serialized inside the process.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::payments::{PaymentRecord, PaymentUpdate};
use crate::shared::error::{AppError, AppResult};

type PaymentMap = BTreeMap<String, PaymentRecord>;

/// Durable key-value store of payment records
pub struct PaymentsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl PaymentsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file has been created yet
    pub async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Load every record. A missing file is an empty store; an unreadable
    /// or malformed file is an error.
    async fn load(&self) -> AppResult<PaymentMap> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(PaymentMap::new()),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if raw.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(PaymentMap::new());
        }

        serde_json::from_slice(&raw).map_err(|e| {
            AppError::Storage(format!("Malformed payments file {}: {}", self.path.display(), e))
        })
    }

    async fn persist(&self, payments: &PaymentMap) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {}", e)))?;
        }

        let serialized = serde_json::to_vec_pretty(payments)
            .map_err(|e| AppError::Storage(format!("Failed to serialize payments: {}", e)))?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &serialized)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write temp file: {}", e)))?;
        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to rename temp file: {}", e)))?;

        Ok(())
    }

    /// Insert or replace a record
    pub async fn put(&self, record: &PaymentRecord) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut payments = self.load().await?;

        if payments.contains_key(&record.payment_id) {
            warn!(payment_id = %record.payment_id, "Overwriting existing payment record");
        }
        payments.insert(record.payment_id.clone(), record.clone());

        self.persist(&payments).await?;
        debug!(payment_id = %record.payment_id, "Payment record saved");
        Ok(())
    }

    pub async fn get(&self, payment_id: &str) -> AppResult<Option<PaymentRecord>> {
        Ok(self.load().await?.remove(payment_id))
    }

    /// Apply a status observation. Returns the updated record, or `None`
    /// without touching the file when the id is unknown.
    pub async fn update(
        &self,
        payment_id: &str,
        update: &PaymentUpdate,
    ) -> AppResult<Option<PaymentRecord>> {
        let _guard = self.write_lock.lock().await;
        let mut payments = self.load().await?;

        let Some(record) = payments.get_mut(payment_id) else {
            debug!(payment_id = %payment_id, "Update for unknown payment ignored");
            return Ok(None);
        };
        record.apply_update(update, Utc::now());
        let updated = record.clone();

        self.persist(&payments).await?;
        debug!(payment_id = %payment_id, status = %updated.status, "Payment status saved");
        Ok(Some(updated))
    }

    /// Set `webhook_notified` if it is still false. Returns whether this call
    /// flipped the flag.
    pub async fn mark_notified(&self, payment_id: &str, at: DateTime<Utc>) -> AppResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut payments = self.load().await?;

        let record = payments
            .get_mut(payment_id)
            .ok_or_else(|| AppError::NotFound(format!("payment {} not found", payment_id)))?;
        if record.webhook_notified {
            return Ok(false);
        }
        record.webhook_notified = true;
        record.webhook_notified_at = Some(at);
        record.updated_at = Some(at);

        self.persist(&payments).await?;
        Ok(true)
    }

    /// Number of stored records
    pub async fn count(&self) -> AppResult<usize> {
        Ok(self.load().await?.len())
    }
}
