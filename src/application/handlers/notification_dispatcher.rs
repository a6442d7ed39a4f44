use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use crate::{
    application::services::{
        batch_dispatcher::{BatchDispatcher, BatchUnit, SubmitOutcome},
        delivery_recorder::DeliveryRecorder,
        payload_builder::{self, PayloadError},
        push::{PushOptions, PushTransport},
        recipient_resolver::{RecipientResolver, Resolution},
    },
    domain::{
        events::NotificationEvent,
        models::{DeliveryRecord, GroupMember, GroupMemberCard, MessageCard, User, UserCard},
        repositories::{DeliveryRecordRepository, GroupRepository, UserRepository},
        value_objects::{DeviceId, RecipientSet},
    },
};

/// Everything one event produces before any side effect happens.
#[derive(Debug, Clone)]
pub struct PreparedDispatch {
    pub event: &'static str,
    pub records: Vec<DeliveryRecord>,
    pub units: Vec<BatchUnit>,
}

impl PreparedDispatch {
    /// One record and one unit per recipient.
    pub fn build(
        event: &NotificationEvent,
        recipients: &RecipientSet,
        now: DateTime<Utc>,
    ) -> Result<Self, PayloadError> {
        let sender_id = event.sender_id();
        let mut records = Vec::with_capacity(recipients.len());
        let mut units = Vec::with_capacity(recipients.len());

        for recipient in recipients {
            let payload = payload_builder::build(event, recipient)?;
            let record = DeliveryRecorder::record(sender_id, recipient, &payload, now);
            units.push(BatchUnit {
                receiver_id: recipient.user_id,
                device_id: recipient.device_id.clone(),
                payload: payload.push_string(record.created_at)?,
            });
            records.push(record);
        }

        Ok(Self {
            event: event.kind(),
            records,
            units,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub records: usize,
    pub queued: usize,
    pub dropped: usize,
    pub submit: SubmitOutcome,
}

impl DispatchOutcome {
    fn unresolved() -> Self {
        Self {
            records: 0,
            queued: 0,
            dropped: 0,
            submit: SubmitOutcome::NothingToSend,
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.submit.is_delivered()
    }
}

/// Turns domain events into persisted delivery records and one push batch.
pub struct NotificationDispatcher {
    resolver: RecipientResolver,
    recorder: DeliveryRecorder,
    transport: Arc<dyn PushTransport>,
    options: PushOptions,
}

impl NotificationDispatcher {
    pub fn new(
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn GroupRepository>,
        records: Arc<dyn DeliveryRecordRepository>,
        transport: Arc<dyn PushTransport>,
        options: PushOptions,
    ) -> Self {
        Self {
            resolver: RecipientResolver::new(users, groups),
            recorder: DeliveryRecorder::new(records),
            transport,
            options,
        }
    }

    /// Resolves the audience and builds records and units. Returns `None`
    /// when a referenced user or group no longer exists.
    pub async fn prepare(
        &self,
        event: &NotificationEvent,
    ) -> anyhow::Result<Option<PreparedDispatch>> {
        let recipients = match self.resolver.resolve(event).await? {
            Resolution::NotFound => return Ok(None),
            Resolution::Resolved(recipients) => recipients,
        };
        Ok(Some(PreparedDispatch::build(event, &recipients, Utc::now())?))
    }

    /// Persists all records, then submits the batch. Persistence errors are
    /// returned; transport failures only show up in the outcome.
    pub async fn commit(&self, prepared: PreparedDispatch) -> anyhow::Result<DispatchOutcome> {
        self.recorder.persist(&prepared.records).await?;

        let mut batch = BatchDispatcher::new(self.transport.clone(), self.options);
        for unit in prepared.units {
            batch.add(unit);
        }
        let queued = batch.queued();
        let dropped = batch.dropped();
        let submit = batch.submit().await;

        debug!(
            event = prepared.event,
            records = prepared.records.len(),
            queued,
            dropped,
            delivered = submit.is_delivered(),
            "notification dispatched"
        );

        Ok(DispatchOutcome {
            records: prepared.records.len(),
            queued,
            dropped,
            submit,
        })
    }

    pub async fn dispatch(&self, event: NotificationEvent) -> anyhow::Result<DispatchOutcome> {
        match self.prepare(&event).await? {
            Some(prepared) => self.commit(prepared).await,
            None => Ok(DispatchOutcome::unresolved()),
        }
    }

    pub async fn dispatch_direct_message(&self, sender: &User, message: MessageCard) {
        self.fire_and_forget(NotificationEvent::DirectMessage {
            sender: sender.clone(),
            message,
        })
        .await
    }

    pub async fn dispatch_group_message(&self, sender: &User, message: MessageCard) {
        self.fire_and_forget(NotificationEvent::GroupMessage {
            sender: sender.clone(),
            message,
        })
        .await
    }

    pub async fn dispatch_group_join(&self, new_members: Vec<GroupMember>) {
        self.fire_and_forget(NotificationEvent::GroupJoinNotice {
            members: new_members,
        })
        .await
    }

    pub async fn dispatch_member_added(
        &self,
        old_members: Vec<GroupMember>,
        new_member_cards: Vec<GroupMemberCard>,
    ) {
        self.fire_and_forget(NotificationEvent::GroupMemberAdded {
            old_members,
            new_member_cards,
        })
        .await
    }

    pub async fn dispatch_forced_logout(&self, user: &User, device_id: Option<DeviceId>) {
        self.fire_and_forget(NotificationEvent::ForcedLogout {
            user: user.clone(),
            device_id,
        })
        .await
    }

    pub async fn dispatch_follow(&self, target: &User, follower: UserCard) {
        self.fire_and_forget(NotificationEvent::FollowNotice {
            target: target.clone(),
            follower,
        })
        .await
    }

    pub async fn dispatch_join_request(&self, group_id: uuid::Uuid, applicant: UserCard) {
        self.fire_and_forget(NotificationEvent::GroupJoinRequest {
            group_id,
            applicant,
        })
        .await
    }

    pub async fn dispatch_generic_push(
        &self,
        sender: Option<&User>,
        receiver_id: uuid::Uuid,
        text: impl Into<String>,
    ) {
        self.fire_and_forget(NotificationEvent::GenericPush {
            sender: sender.cloned(),
            receiver_id,
            text: text.into(),
        })
        .await
    }

    /// The triggering request never learns whether its notification went out.
    async fn fire_and_forget(&self, event: NotificationEvent) {
        let kind = event.kind();
        if let Err(err) = self.dispatch(event).await {
            error!(event = kind, error = ?err, "notification dispatch aborted");
        }
    }
}
