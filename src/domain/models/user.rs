use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::DeviceId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub portrait: Option<String>,
    /// Push identifier of the device the account is currently bound to.
    pub push_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            portrait: None,
            push_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_push_id(mut self, push_id: impl Into<String>) -> Self {
        self.push_id = Some(push_id.into());
        self
    }

    pub fn device_id(&self) -> Option<DeviceId> {
        self.push_id.as_deref().and_then(DeviceId::parse)
    }
}
