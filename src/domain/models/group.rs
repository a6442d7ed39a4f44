use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Group {
    pub fn new(name: impl Into<String>, owner_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemberPermission {
    None,
    Admin,
    Owner,
}

impl MemberPermission {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberPermission::None => "none",
            MemberPermission::Admin => "admin",
            MemberPermission::Owner => "owner",
        }
    }
}

impl FromStr for MemberPermission {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(MemberPermission::None),
            "admin" => Ok(MemberPermission::Admin),
            "owner" => Ok(MemberPermission::Owner),
            other => Err(anyhow::anyhow!("unknown member permission {other}")),
        }
    }
}

/// Membership row with the member's user eagerly attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user: User,
    pub alias: Option<String>,
    pub permission: MemberPermission,
    pub updated_at: DateTime<Utc>,
}

impl GroupMember {
    pub fn new(group_id: Uuid, user: User, permission: MemberPermission) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            user,
            alias: None,
            permission,
            updated_at: Utc::now(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.permission != MemberPermission::None
    }
}
