//! Client-facing snapshots of domain entities. A card's JSON form is what a
//! delivery payload carries as its entity content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::group::{GroupMember, MemberPermission};
use super::user::User;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Picture,
    File,
    Audio,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCard {
    pub id: Uuid,
    pub content: String,
    pub attach: Option<String>,
    pub kind: MessageKind,
    pub sender_id: Uuid,
    /// Set for one-to-one messages.
    pub receiver_id: Option<Uuid>,
    /// Set for group messages.
    pub group_id: Option<Uuid>,
    pub create_at: DateTime<Utc>,
}

impl MessageCard {
    pub fn direct(sender_id: Uuid, receiver_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            attach: None,
            kind: MessageKind::Text,
            sender_id,
            receiver_id: Some(receiver_id),
            group_id: None,
            create_at: Utc::now(),
        }
    }

    pub fn group(sender_id: Uuid, group_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            attach: None,
            kind: MessageKind::Text,
            sender_id,
            receiver_id: None,
            group_id: Some(group_id),
            create_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberCard {
    pub id: Uuid,
    pub alias: Option<String>,
    pub is_admin: bool,
    pub is_owner: bool,
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub modify_at: DateTime<Utc>,
}

impl From<&GroupMember> for GroupMemberCard {
    fn from(member: &GroupMember) -> Self {
        Self {
            id: member.id,
            alias: member.alias.clone(),
            is_admin: member.permission == MemberPermission::Admin,
            is_owner: member.permission == MemberPermission::Owner,
            user_id: member.user.id,
            group_id: member.group_id,
            modify_at: member.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCard {
    pub id: Uuid,
    pub name: String,
    pub portrait: Option<String>,
    pub is_follow: bool,
    pub modify_at: DateTime<Utc>,
}

impl UserCard {
    pub fn new(user: &User, is_follow: bool) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            portrait: user.portrait.clone(),
            is_follow,
            modify_at: user.updated_at,
        }
    }
}
