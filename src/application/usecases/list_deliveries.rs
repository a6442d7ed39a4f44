use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{models::DeliveryRecord, repositories::DeliveryRecordRepository};

pub struct ListDeliveriesUseCase {
    repo: Arc<dyn DeliveryRecordRepository>,
}

pub struct ListDeliveriesResult {
    pub records: Vec<DeliveryRecord>,
    pub has_more: bool,
    pub next_offset: Option<u32>,
}

impl ListDeliveriesUseCase {
    pub fn new(repo: Arc<dyn DeliveryRecordRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        receiver_id: Uuid,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> anyhow::Result<ListDeliveriesResult> {
        let (records, has_more) = self.repo.list_by_receiver(receiver_id, limit, offset).await?;
        let next_offset = has_more.then(|| offset.unwrap_or(0) + records.len() as u32);
        Ok(ListDeliveriesResult {
            records,
            has_more,
            next_offset,
        })
    }
}
