pub mod card;
pub mod delivery;
pub mod group;
pub mod user;

pub use card::{GroupMemberCard, MessageCard, MessageKind, UserCard};
pub use delivery::{DeliveryPayload, DeliveryRecord, EntityType};
pub use group::{Group, GroupMember, MemberPermission};
pub use user::User;
