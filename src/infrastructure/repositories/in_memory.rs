use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    models::{DeliveryRecord, Group, GroupMember, MemberPermission, User},
    repositories::{DeliveryRecordRepository, GroupRepository, UserRepository},
    value_objects::DeviceId,
};

use super::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, id: &Uuid) -> anyhow::Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(id).cloned())
    }

    async fn upsert(&self, user: &User) -> anyhow::Result<()> {
        let mut users = self.users.write().await;
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn set_device(
        &self,
        user_id: &Uuid,
        device_id: Option<&DeviceId>,
    ) -> anyhow::Result<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(user_id).map(|user| {
            user.push_id = device_id.map(|d| d.as_str().to_string());
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn release_device(&self, device_id: &DeviceId, keep: &Uuid) -> anyhow::Result<u64> {
        let mut users = self.users.write().await;
        let mut released = 0;
        for user in users.values_mut() {
            let bound = user
                .push_id
                .as_deref()
                .is_some_and(|current| device_id.matches(current));
            if bound && &user.id != keep {
                user.push_id = None;
                user.updated_at = Utc::now();
                released += 1;
            }
        }
        Ok(released)
    }
}

/// Membership row; the user is resolved against the user store on read.
#[derive(Clone)]
struct MembershipRow {
    id: Uuid,
    group_id: Uuid,
    user_id: Uuid,
    alias: Option<String>,
    permission: MemberPermission,
    updated_at: DateTime<Utc>,
}

pub struct InMemoryGroupRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
    groups: Arc<RwLock<HashMap<Uuid, Group>>>,
    members: Arc<RwLock<Vec<MembershipRow>>>,
}

impl InMemoryGroupRepository {
    /// Shares the user store of `users`, so members always carry their
    /// current device binding.
    pub fn new(users: &InMemoryUserRepository) -> Self {
        Self {
            users: users.users.clone(),
            groups: Arc::default(),
            members: Arc::default(),
        }
    }

    pub async fn insert_group(&self, group: Group) {
        self.groups.write().await.insert(group.id, group);
    }

    /// Adds a membership. The member's user row is created when missing; an
    /// existing row is left untouched.
    pub async fn add_member(&self, member: GroupMember) {
        let user_id = member.user.id;
        self.users
            .write()
            .await
            .entry(user_id)
            .or_insert(member.user);
        self.members.write().await.push(MembershipRow {
            id: member.id,
            group_id: member.group_id,
            user_id,
            alias: member.alias,
            permission: member.permission,
            updated_at: member.updated_at,
        });
    }

    pub async fn remove_member(&self, group_id: &Uuid, user_id: &Uuid) {
        self.members
            .write()
            .await
            .retain(|m| !(&m.group_id == group_id && &m.user_id == user_id));
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn get(&self, id: &Uuid) -> anyhow::Result<Option<Group>> {
        let groups = self.groups.read().await;
        Ok(groups.get(id).cloned())
    }

    async fn list_members(&self, group: &Group) -> anyhow::Result<Vec<GroupMember>> {
        let members = self.members.read().await;
        let users = self.users.read().await;
        // Rows whose user is gone are skipped, like the inner join in postgres.
        Ok(members
            .iter()
            .filter(|m| m.group_id == group.id)
            .filter_map(|m| {
                users.get(&m.user_id).map(|user| GroupMember {
                    id: m.id,
                    group_id: m.group_id,
                    user: user.clone(),
                    alias: m.alias.clone(),
                    permission: m.permission,
                    updated_at: m.updated_at,
                })
            })
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryDeliveryRecordRepository {
    records: Arc<RwLock<DeliveryLog>>,
}

#[derive(Default)]
struct DeliveryLog {
    by_id: HashMap<Uuid, DeliveryRecord>,
    order: Vec<Uuid>,
}

impl DeliveryLog {
    fn iter(&self) -> impl Iterator<Item = &DeliveryRecord> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }
}

impl InMemoryDeliveryRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored record in insertion order.
    pub async fn all(&self) -> Vec<DeliveryRecord> {
        self.records.read().await.iter().cloned().collect()
    }
}

#[async_trait]
impl DeliveryRecordRepository for InMemoryDeliveryRecordRepository {
    async fn save_all(&self, records: &[DeliveryRecord]) -> anyhow::Result<()> {
        let mut stored = self.records.write().await;
        for record in records {
            if !stored.by_id.contains_key(&record.id) {
                stored.order.push(record.id);
                stored.by_id.insert(record.id, record.clone());
            }
        }
        Ok(())
    }

    async fn list_by_receiver(
        &self,
        receiver_id: Uuid,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> anyhow::Result<(Vec<DeliveryRecord>, bool)> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE) as usize;
        let offset = offset.unwrap_or(0) as usize;

        let stored = self.records.read().await;
        let mut matching: Vec<&DeliveryRecord> = stored
            .iter()
            .filter(|r| r.receiver_id == receiver_id)
            .collect();
        // Newest first; insertion order breaks ties.
        matching.reverse();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let has_more = matching.len() > offset + limit;
        let page = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((page, has_more))
    }
}
