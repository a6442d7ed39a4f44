use poem_openapi::Enum;

use crate::domain::models::EntityType;

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum EntityTypeKind {
    #[oai(rename = "logout")]
    Logout,
    #[oai(rename = "generic_push")]
    GenericPush,
    #[oai(rename = "message")]
    Message,
    #[oai(rename = "add_friend")]
    AddFriend,
    #[oai(rename = "add_group")]
    AddGroup,
    #[oai(rename = "add_group_members")]
    AddGroupMembers,
    #[oai(rename = "join_request")]
    JoinRequest,
}

impl From<EntityType> for EntityTypeKind {
    fn from(value: EntityType) -> Self {
        match value {
            EntityType::Logout => EntityTypeKind::Logout,
            EntityType::GenericPush => EntityTypeKind::GenericPush,
            EntityType::Message => EntityTypeKind::Message,
            EntityType::AddFriend => EntityTypeKind::AddFriend,
            EntityType::AddGroup => EntityTypeKind::AddGroup,
            EntityType::AddGroupMembers => EntityTypeKind::AddGroupMembers,
            EntityType::JoinRequest => EntityTypeKind::JoinRequest,
        }
    }
}
