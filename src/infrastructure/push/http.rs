use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::debug;

use crate::application::services::push::{PushAck, PushMessage, PushTransport, TransportError};

const MAX_DEVICE_ID_LEN: usize = 64;
/// Largest serialized payload the provider accepts per unit. Larger units are
/// skipped at submit time, so a big `add_group_members` card batch never
/// reaches the device; raise it through `PUSH_MAX_PAYLOAD_BYTES` when the
/// provider allows more.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 4096;

/// Credentials and endpoint of the push provider.
#[derive(Debug, Clone)]
pub struct HttpPushConfig {
    pub host: String,
    pub app_id: String,
    pub app_key: String,
    pub master_secret: String,
    pub timeout: Duration,
    pub max_payload_bytes: usize,
}

/// Submits batches to the provider's HTTP batch endpoint.
pub struct HttpPushTransport {
    http: Client,
    config: HttpPushConfig,
}

impl HttpPushTransport {
    pub fn new(config: HttpPushConfig) -> Arc<dyn PushTransport> {
        Arc::new(Self {
            http: Client::builder()
                .user_agent("push-fanout/http")
                .timeout(config.timeout)
                .build()
                .expect("failed to build push client"),
            config,
        }) as Arc<dyn PushTransport>
    }

    fn batch_url(&self) -> String {
        format!("{}/batch", self.config.host.trim_end_matches('/'))
    }

    fn request<'a>(&'a self, batch: &'a [PushMessage]) -> BatchRequest<'a> {
        BatchRequest {
            app_id: &self.config.app_id,
            messages: batch
                .iter()
                .map(|message| BatchEntry {
                    client_id: message.device_id.as_str(),
                    transmission_content: &message.payload,
                    transmission_type: 0,
                    offline: message.allow_offline,
                    offline_expire_time: message.offline_ttl.as_millis() as u64,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    fn validate(&self, message: &PushMessage) -> Result<(), TransportError> {
        let device = message.device_id.as_str();
        if device.len() > MAX_DEVICE_ID_LEN
            || !device
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(TransportError::InvalidUnit(format!(
                "malformed client id {device:?}"
            )));
        }
        if message.payload.len() > self.config.max_payload_bytes {
            return Err(TransportError::InvalidUnit(format!(
                "payload of {} bytes exceeds {}",
                message.payload.len(),
                self.config.max_payload_bytes
            )));
        }
        Ok(())
    }

    async fn submit(&self, batch: &[PushMessage]) -> Result<PushAck, TransportError> {
        debug!(units = batch.len(), url = %self.batch_url(), "submitting push batch");

        let response = self
            .http
            .post(self.batch_url())
            .header("X-App-Key", &self.config.app_key)
            .bearer_auth(&self.config.master_secret)
            .json(&self.request(batch))
            .send()
            .await
            .map_err(|err| TransportError::Io(err.to_string()))?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::Io(format!("provider answered {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Rejected(format!("status={status}, body={body}")));
        }

        response
            .json::<PushAck>()
            .await
            .map_err(|err| TransportError::Rejected(format!("undecodable acknowledgement: {err}")))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchRequest<'a> {
    app_id: &'a str,
    messages: Vec<BatchEntry<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchEntry<'a> {
    client_id: &'a str,
    transmission_content: &'a str,
    transmission_type: u8,
    offline: bool,
    offline_expire_time: u64,
}
