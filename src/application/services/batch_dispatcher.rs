use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    application::services::push::{PushAck, PushMessage, PushOptions, PushTransport},
    domain::value_objects::DeviceId,
};

/// A (device, serialized payload) pair waiting for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchUnit {
    pub receiver_id: Uuid,
    pub device_id: Option<DeviceId>,
    pub payload: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    Accumulating,
}

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// No unit survived validation; the transport was not called.
    NothingToSend,
    Completed {
        ack: PushAck,
        sent: usize,
        attempts: u32,
    },
    /// The batch went out but some units were rejected while building it.
    PartialFailure {
        ack: PushAck,
        sent: usize,
        skipped: usize,
        attempts: u32,
    },
    Failed {
        reason: String,
        attempts: u32,
    },
}

impl SubmitOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(
            self,
            SubmitOutcome::Completed { .. } | SubmitOutcome::PartialFailure { .. }
        )
    }

    pub fn attempts(&self) -> u32 {
        match self {
            SubmitOutcome::NothingToSend => 0,
            SubmitOutcome::Completed { attempts, .. }
            | SubmitOutcome::PartialFailure { attempts, .. }
            | SubmitOutcome::Failed { attempts, .. } => *attempts,
        }
    }
}

/// Collects the units of one event and submits them as a single batch.
///
/// A dispatcher serves exactly one event: `submit` consumes it.
pub struct BatchDispatcher {
    transport: Arc<dyn PushTransport>,
    options: PushOptions,
    queued: Vec<PushMessage>,
    dropped: usize,
}

impl BatchDispatcher {
    pub fn new(transport: Arc<dyn PushTransport>, options: PushOptions) -> Self {
        Self {
            transport,
            options,
            queued: Vec::new(),
            dropped: 0,
        }
    }

    pub fn state(&self) -> DispatcherState {
        if self.queued.is_empty() {
            DispatcherState::Idle
        } else {
            DispatcherState::Accumulating
        }
    }

    pub fn queued(&self) -> usize {
        self.queued.len()
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Queues a unit. Units without a device or with an empty payload are
    /// dropped and `false` is returned.
    pub fn add(&mut self, unit: BatchUnit) -> bool {
        let Some(device_id) = unit.device_id else {
            debug!(receiver = %unit.receiver_id, "receiver has no bound device, push skipped");
            self.dropped += 1;
            return false;
        };
        if unit.payload.trim().is_empty() {
            debug!(receiver = %unit.receiver_id, "empty push payload, push skipped");
            self.dropped += 1;
            return false;
        }

        self.queued.push(PushMessage {
            device_id,
            payload: unit.payload,
            offline_ttl: self.options.offline_ttl,
            allow_offline: self.options.allow_offline,
        });
        true
    }

    pub async fn submit(self) -> SubmitOutcome {
        let transport = self.transport;
        let mut batch = Vec::with_capacity(self.queued.len());
        let mut skipped = 0;

        for message in self.queued {
            match transport.validate(&message) {
                Ok(()) => batch.push(message),
                Err(err) => {
                    skipped += 1;
                    warn!(
                        transport = transport.name(),
                        device_id = %message.device_id,
                        error = %err,
                        "push unit rejected while building batch"
                    );
                }
            }
        }

        if batch.is_empty() {
            debug!(transport = transport.name(), skipped, "nothing to send");
            return SubmitOutcome::NothingToSend;
        }

        let mut attempts = 1;
        let result = match transport.submit(&batch).await {
            Err(err) if err.is_retryable() => {
                warn!(
                    transport = transport.name(),
                    error = %err,
                    "push batch submission failed, retrying once"
                );
                attempts += 1;
                transport.submit(&batch).await
            }
            other => other,
        };

        match result {
            Ok(ack) => {
                info!(
                    transport = transport.name(),
                    result = %ack.result,
                    task_id = ?ack.task_id,
                    sent = batch.len(),
                    skipped,
                    attempts,
                    "push batch acknowledged"
                );
                if skipped == 0 {
                    SubmitOutcome::Completed {
                        ack,
                        sent: batch.len(),
                        attempts,
                    }
                } else {
                    SubmitOutcome::PartialFailure {
                        ack,
                        sent: batch.len(),
                        skipped,
                        attempts,
                    }
                }
            }
            Err(err) => {
                warn!(
                    transport = transport.name(),
                    error = %err,
                    attempts,
                    units = batch.len(),
                    "push batch failed"
                );
                SubmitOutcome::Failed {
                    reason: err.to_string(),
                    attempts,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::application::services::push::TransportError;

    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<PushAck, TransportError>>>,
        submitted: Mutex<Vec<Vec<PushMessage>>>,
        reject_device: Option<String>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<PushAck, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                submitted: Mutex::new(Vec::new()),
                reject_device: None,
            })
        }

        fn rejecting(device: &str, responses: Vec<Result<PushAck, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                submitted: Mutex::new(Vec::new()),
                reject_device: Some(device.to_string()),
            })
        }

        fn calls(&self) -> usize {
            self.submitted.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PushTransport for ScriptedTransport {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn validate(&self, message: &PushMessage) -> Result<(), TransportError> {
            match &self.reject_device {
                Some(device) if message.device_id.matches(device) => {
                    Err(TransportError::InvalidUnit(device.clone()))
                }
                _ => Ok(()),
            }
        }

        async fn submit(&self, batch: &[PushMessage]) -> Result<PushAck, TransportError> {
            self.submitted.lock().unwrap().push(batch.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Io("script exhausted".to_string())))
        }
    }

    fn ack() -> PushAck {
        PushAck {
            result: "ok".to_string(),
            task_id: Some("task-1".to_string()),
        }
    }

    fn unit(device: Option<&str>, payload: &str) -> BatchUnit {
        BatchUnit {
            receiver_id: Uuid::new_v4(),
            device_id: device.and_then(DeviceId::parse),
            payload: payload.to_string(),
        }
    }

    #[test]
    fn add_drops_units_without_device_or_payload() {
        let transport = ScriptedTransport::new(vec![]);
        let mut dispatcher = BatchDispatcher::new(transport, PushOptions::default());
        assert_eq!(dispatcher.state(), DispatcherState::Idle);

        assert!(!dispatcher.add(unit(None, "[]")));
        assert!(!dispatcher.add(unit(Some("device"), "  ")));
        assert!(dispatcher.add(unit(Some("device"), "[{}]")));

        assert_eq!(dispatcher.queued(), 1);
        assert_eq!(dispatcher.dropped(), 2);
        assert_eq!(dispatcher.state(), DispatcherState::Accumulating);
    }

    #[test]
    fn queued_units_carry_batch_options() {
        let transport = ScriptedTransport::new(vec![]);
        let options = PushOptions {
            offline_ttl: std::time::Duration::from_secs(60),
            allow_offline: false,
        };
        let mut dispatcher = BatchDispatcher::new(transport, options);
        dispatcher.add(unit(Some("device"), "payload"));

        assert_eq!(dispatcher.queued[0].offline_ttl.as_secs(), 60);
        assert!(!dispatcher.queued[0].allow_offline);
    }

    #[tokio::test]
    async fn empty_batch_never_calls_transport() {
        let transport = ScriptedTransport::new(vec![Ok(ack())]);
        let mut dispatcher = BatchDispatcher::new(transport.clone(), PushOptions::default());
        dispatcher.add(unit(None, "payload"));

        let outcome = dispatcher.submit().await;

        assert!(matches!(outcome, SubmitOutcome::NothingToSend));
        assert!(!outcome.is_delivered());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn successful_batch_is_submitted_once() {
        let transport = ScriptedTransport::new(vec![Ok(ack())]);
        let mut dispatcher = BatchDispatcher::new(transport.clone(), PushOptions::default());
        dispatcher.add(unit(Some("a"), "one"));
        dispatcher.add(unit(Some("b"), "two"));

        let outcome = dispatcher.submit().await;

        assert!(outcome.is_delivered());
        assert!(matches!(outcome, SubmitOutcome::Completed { sent: 2, attempts: 1, .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn io_failure_is_retried_exactly_once() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Io("connection reset".to_string())),
            Ok(ack()),
        ]);
        let mut dispatcher = BatchDispatcher::new(transport.clone(), PushOptions::default());
        dispatcher.add(unit(Some("a"), "one"));

        let outcome = dispatcher.submit().await;

        assert!(outcome.is_delivered());
        assert_eq!(outcome.attempts(), 2);
        assert_eq!(transport.calls(), 2);
        let submitted = transport.submitted.lock().unwrap();
        assert_eq!(submitted[0], submitted[1]);
    }

    #[tokio::test]
    async fn second_io_failure_gives_up() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Io("timeout".to_string())),
            Err(TransportError::Io("timeout".to_string())),
            Ok(ack()),
        ]);
        let mut dispatcher = BatchDispatcher::new(transport.clone(), PushOptions::default());
        dispatcher.add(unit(Some("a"), "one"));

        let outcome = dispatcher.submit().await;

        assert!(!outcome.is_delivered());
        assert!(matches!(outcome, SubmitOutcome::Failed { attempts: 2, .. }));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn rejection_is_not_retried() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Rejected("bad credentials".to_string())),
            Ok(ack()),
        ]);
        let mut dispatcher = BatchDispatcher::new(transport.clone(), PushOptions::default());
        dispatcher.add(unit(Some("a"), "one"));

        let outcome = dispatcher.submit().await;

        assert!(matches!(outcome, SubmitOutcome::Failed { attempts: 1, .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn invalid_unit_is_skipped_and_rest_is_sent() {
        let transport = ScriptedTransport::rejecting("broken", vec![Ok(ack())]);
        let mut dispatcher = BatchDispatcher::new(transport.clone(), PushOptions::default());
        dispatcher.add(unit(Some("broken"), "one"));
        dispatcher.add(unit(Some("fine"), "two"));

        let outcome = dispatcher.submit().await;

        assert!(matches!(
            outcome,
            SubmitOutcome::PartialFailure { sent: 1, skipped: 1, .. }
        ));
        let submitted = transport.submitted.lock().unwrap();
        assert_eq!(submitted[0].len(), 1);
        assert_eq!(submitted[0][0].device_id.as_str(), "fine");
    }

    #[tokio::test]
    async fn all_units_invalid_means_nothing_to_send() {
        let transport = ScriptedTransport::rejecting("broken", vec![Ok(ack())]);
        let mut dispatcher = BatchDispatcher::new(transport.clone(), PushOptions::default());
        dispatcher.add(unit(Some("broken"), "one"));

        let outcome = dispatcher.submit().await;

        assert!(matches!(outcome, SubmitOutcome::NothingToSend));
        assert_eq!(transport.calls(), 0);
    }
}
