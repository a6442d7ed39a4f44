use crate::{
    domain::models::{DeliveryRecord, User},
    presentation::http::responses::{DeliveryRecordDto, UserDeviceDto},
};

pub fn map_delivery(record: &DeliveryRecord) -> DeliveryRecordDto {
    DeliveryRecordDto {
        id: record.id,
        entity_type: record.entity_type.into(),
        entity_content: record.entity_content.clone(),
        sender_id: record.sender_id,
        receiver_id: record.receiver_id,
        receiver_push_id: record.receiver_push_id.clone(),
        created_at: record.created_at.to_rfc3339(),
    }
}

pub fn map_user_device(user: &User) -> UserDeviceDto {
    UserDeviceDto {
        user_id: user.id,
        push_id: user.push_id.clone(),
        updated_at: user.updated_at.to_rfc3339(),
    }
}
