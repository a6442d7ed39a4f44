use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::value_objects::DeviceId;

const DEFAULT_OFFLINE_TTL: Duration = Duration::from_secs(24 * 3600);

/// Delivery options applied to every unit of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushOptions {
    pub offline_ttl: Duration,
    pub allow_offline: bool,
}

impl Default for PushOptions {
    fn default() -> Self {
        Self {
            offline_ttl: DEFAULT_OFFLINE_TTL,
            allow_offline: true,
        }
    }
}

/// One entry of a transport batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub device_id: DeviceId,
    pub payload: String,
    pub offline_ttl: Duration,
    pub allow_offline: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushAck {
    pub result: String,
    #[serde(default)]
    pub task_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("push transport i/o failure: {0}")]
    Io(String),
    #[error("invalid push unit: {0}")]
    InvalidUnit(String),
    #[error("push provider rejected the batch: {0}")]
    Rejected(String),
}

impl TransportError {
    /// Only network-level failures are worth resubmitting the same batch.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Io(_))
    }
}

/// External push provider with a batch-submit contract.
#[async_trait]
pub trait PushTransport: Send + Sync {
    fn name(&self) -> &'static str;

    /// Checks that a unit can be placed in a batch.
    fn validate(&self, message: &PushMessage) -> Result<(), TransportError>;

    /// Submits the whole batch in one call.
    async fn submit(&self, batch: &[PushMessage]) -> Result<PushAck, TransportError>;
}
