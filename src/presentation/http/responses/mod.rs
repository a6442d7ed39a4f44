use poem_openapi::Object;
use uuid::Uuid;

use crate::presentation::models::EntityTypeKind;

#[derive(Object)]
pub struct DeliveryRecordDto {
    pub id: Uuid,
    pub entity_type: EntityTypeKind,
    pub entity_content: String,
    pub sender_id: Option<Uuid>,
    pub receiver_id: Uuid,
    pub receiver_push_id: Option<String>,
    pub created_at: String,
}

#[derive(Object)]
pub struct PaginatedDeliveriesDto {
    pub deliveries: Vec<DeliveryRecordDto>,
    pub has_more: bool,
    pub next_offset: Option<u32>,
}

#[derive(Object)]
pub struct UserDeviceDto {
    pub user_id: Uuid,
    pub push_id: Option<String>,
    pub updated_at: String,
}
