use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    models::{DeliveryRecord, Group, GroupMember, User},
    value_objects::DeviceId,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, id: &Uuid) -> anyhow::Result<Option<User>>;
    async fn upsert(&self, user: &User) -> anyhow::Result<()>;
    /// Replaces the user's device binding and returns the updated user.
    async fn set_device(
        &self,
        user_id: &Uuid,
        device_id: Option<&DeviceId>,
    ) -> anyhow::Result<Option<User>>;
    /// Unbinds `device_id` from every user except `keep`. Returns how many
    /// users lost the binding.
    async fn release_device(&self, device_id: &DeviceId, keep: &Uuid) -> anyhow::Result<u64>;
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn get(&self, id: &Uuid) -> anyhow::Result<Option<Group>>;
    async fn list_members(&self, group: &Group) -> anyhow::Result<Vec<GroupMember>>;
}

#[async_trait]
pub trait DeliveryRecordRepository: Send + Sync {
    /// Saves records keyed by their id. Saving a record whose id already
    /// exists is a no-op, never a duplicate-key failure.
    async fn save_all(&self, records: &[DeliveryRecord]) -> anyhow::Result<()>;

    async fn list_by_receiver(
        &self,
        receiver_id: Uuid,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> anyhow::Result<(Vec<DeliveryRecord>, bool)>;
}
