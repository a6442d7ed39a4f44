use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::DeviceId;

/// Tells the client how to interpret a payload's entity content.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Logout,
    GenericPush,
    Message,
    AddFriend,
    AddGroup,
    AddGroupMembers,
    JoinRequest,
}

impl EntityType {
    /// Numeric code carried in the push envelope.
    pub fn code(&self) -> i32 {
        match self {
            EntityType::Logout => -1,
            EntityType::GenericPush => 0,
            EntityType::Message => 200,
            EntityType::AddFriend => 1001,
            EntityType::AddGroup => 1002,
            EntityType::AddGroupMembers => 1003,
            EntityType::JoinRequest => 1004,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Logout => "logout",
            EntityType::GenericPush => "generic_push",
            EntityType::Message => "message",
            EntityType::AddFriend => "add_friend",
            EntityType::AddGroup => "add_group",
            EntityType::AddGroupMembers => "add_group_members",
            EntityType::JoinRequest => "join_request",
        }
    }
}

impl FromStr for EntityType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "logout" => Ok(EntityType::Logout),
            "generic_push" => Ok(EntityType::GenericPush),
            "message" => Ok(EntityType::Message),
            "add_friend" => Ok(EntityType::AddFriend),
            "add_group" => Ok(EntityType::AddGroup),
            "add_group_members" => Ok(EntityType::AddGroupMembers),
            "join_request" => Ok(EntityType::JoinRequest),
            other => Err(anyhow::anyhow!("unknown entity type {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPayload {
    pub entity_type: EntityType,
    pub entity_content: String,
}

impl DeliveryPayload {
    pub fn new(entity_type: EntityType, entity_content: impl Into<String>) -> Self {
        Self {
            entity_type,
            entity_content: entity_content.into(),
        }
    }

    /// Serialized form handed to the push transport: a JSON array holding
    /// this single entity.
    pub fn push_string(&self, create_at: DateTime<Utc>) -> serde_json::Result<String> {
        let entities = [PushEntity {
            entity_type: self.entity_type.code(),
            content: &self.entity_content,
            create_at,
        }];
        serde_json::to_string(&entities)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PushEntity<'a> {
    #[serde(rename = "type")]
    entity_type: i32,
    content: &'a str,
    create_at: DateTime<Utc>,
}

/// Audit row proving the system decided to notify `receiver_id`.
///
/// `receiver_push_id` is the receiver's device binding at the time the record
/// was created. It is never rewritten when the receiver later rebinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub id: Uuid,
    pub entity_type: EntityType,
    pub entity_content: String,
    pub sender_id: Option<Uuid>,
    pub receiver_id: Uuid,
    pub receiver_push_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DeliveryRecord {
    pub fn new(
        sender_id: Option<Uuid>,
        receiver_id: Uuid,
        payload: &DeliveryPayload,
        device_snapshot: Option<&DeviceId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_type: payload.entity_type,
            entity_content: payload.entity_content.clone(),
            sender_id,
            receiver_id,
            receiver_push_id: device_snapshot.map(|device| device.as_str().to_string()),
            created_at,
        }
    }

    pub fn payload(&self) -> DeliveryPayload {
        DeliveryPayload::new(self.entity_type, self.entity_content.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_string_wraps_single_entity_with_code() {
        let payload = DeliveryPayload::new(EntityType::AddFriend, "{\"id\":1}");
        let at = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let raw = payload.push_string(at).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(parsed[0]["type"], 1001);
        assert_eq!(parsed[0]["content"], "{\"id\":1}");
        assert_eq!(parsed[0]["createAt"], "2024-05-01T10:00:00Z");
        assert_eq!(parsed.as_array().unwrap().len(), 1);
    }

    #[test]
    fn unknown_entity_type_is_rejected() {
        assert!("add-friend".parse::<EntityType>().is_err());
    }

    #[test]
    fn record_copies_device_snapshot() {
        let device = DeviceId::parse("device-1").unwrap();
        let payload = DeliveryPayload::new(EntityType::Message, "hi");
        let record = DeliveryRecord::new(None, Uuid::new_v4(), &payload, Some(&device), Utc::now());

        assert_eq!(record.receiver_push_id.as_deref(), Some("device-1"));
        assert_eq!(record.payload(), payload);
    }

    #[test]
    fn entity_type_names_are_stable() {
        for entity_type in [
            EntityType::Logout,
            EntityType::GenericPush,
            EntityType::Message,
            EntityType::AddFriend,
            EntityType::AddGroup,
            EntityType::AddGroupMembers,
            EntityType::JoinRequest,
        ] {
            assert_eq!(entity_type.as_str().parse::<EntityType>().unwrap(), entity_type);
        }
    }
}
