use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::application::services::push::{PushAck, PushMessage, PushTransport, TransportError};

/// Transport for environments without push credentials: logs every unit and
/// acknowledges the batch.
pub struct LoggingPushTransport;

impl LoggingPushTransport {
    pub fn new() -> Arc<dyn PushTransport> {
        Arc::new(Self) as Arc<dyn PushTransport>
    }
}

#[async_trait]
impl PushTransport for LoggingPushTransport {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn validate(&self, _message: &PushMessage) -> Result<(), TransportError> {
        Ok(())
    }

    async fn submit(&self, batch: &[PushMessage]) -> Result<PushAck, TransportError> {
        for message in batch {
            info!(
                device_id = %message.device_id,
                offline = message.allow_offline,
                ttl_secs = message.offline_ttl.as_secs(),
                payload = %message.payload,
                "[push] would deliver"
            );
        }
        Ok(PushAck {
            result: "logged".to_string(),
            task_id: None,
        })
    }
}
