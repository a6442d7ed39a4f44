use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    models::{DeliveryPayload, DeliveryRecord},
    repositories::DeliveryRecordRepository,
    value_objects::Recipient,
};

/// Writes the audit trail of notification decisions.
pub struct DeliveryRecorder {
    repo: Arc<dyn DeliveryRecordRepository>,
}

impl DeliveryRecorder {
    pub fn new(repo: Arc<dyn DeliveryRecordRepository>) -> Self {
        Self { repo }
    }

    /// Builds the record for one recipient, snapshotting the device the
    /// recipient is bound to right now.
    pub fn record(
        sender_id: Option<Uuid>,
        receiver: &Recipient,
        payload: &DeliveryPayload,
        created_at: DateTime<Utc>,
    ) -> DeliveryRecord {
        DeliveryRecord::new(
            sender_id,
            receiver.user_id,
            payload,
            receiver.device_id.as_ref(),
            created_at,
        )
    }

    /// Persists every record of one event. Errors mean the store is
    /// unavailable and are returned as-is.
    pub async fn persist(&self, records: &[DeliveryRecord]) -> anyhow::Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.repo.save_all(records).await?;
        debug!(count = records.len(), "delivery records persisted");
        Ok(())
    }
}
