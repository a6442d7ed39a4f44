use uuid::Uuid;

use crate::domain::models::{GroupMember, GroupMemberCard, MessageCard, User, UserCard};
use crate::domain::value_objects::DeviceId;

/// Something that happened in the chat backend and that users should be
/// notified about. Built by the request layer after its own write succeeded.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    /// One-to-one message; the target is `message.receiver_id`.
    DirectMessage { sender: User, message: MessageCard },
    /// Group message; the target is `message.group_id`.
    GroupMessage { sender: User, message: MessageCard },
    /// New members are told they were added to a group.
    GroupJoinNotice { members: Vec<GroupMember> },
    /// Existing members are told about a batch of new members.
    GroupMemberAdded {
        old_members: Vec<GroupMember>,
        new_member_cards: Vec<GroupMemberCard>,
    },
    /// The session bound to `device_id` was superseded.
    ForcedLogout {
        user: User,
        device_id: Option<DeviceId>,
    },
    /// `follower` now follows `target`.
    FollowNotice { target: User, follower: UserCard },
    /// Group administrators are told someone applied to join.
    GroupJoinRequest { group_id: Uuid, applicant: UserCard },
    /// Free-form text push to a single user.
    GenericPush {
        sender: Option<User>,
        receiver_id: Uuid,
        text: String,
    },
}

impl NotificationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::DirectMessage { .. } => "direct_message",
            NotificationEvent::GroupMessage { .. } => "group_message",
            NotificationEvent::GroupJoinNotice { .. } => "group_join_notice",
            NotificationEvent::GroupMemberAdded { .. } => "group_member_added",
            NotificationEvent::ForcedLogout { .. } => "forced_logout",
            NotificationEvent::FollowNotice { .. } => "follow_notice",
            NotificationEvent::GroupJoinRequest { .. } => "group_join_request",
            NotificationEvent::GenericPush { .. } => "generic_push",
        }
    }

    /// Originating actor, absent for system events.
    pub fn sender_id(&self) -> Option<Uuid> {
        match self {
            NotificationEvent::DirectMessage { sender, .. }
            | NotificationEvent::GroupMessage { sender, .. } => Some(sender.id),
            NotificationEvent::FollowNotice { follower, .. } => Some(follower.id),
            NotificationEvent::GroupJoinRequest { applicant, .. } => Some(applicant.id),
            NotificationEvent::GenericPush { sender, .. } => sender.as_ref().map(|s| s.id),
            NotificationEvent::GroupJoinNotice { .. }
            | NotificationEvent::GroupMemberAdded { .. }
            | NotificationEvent::ForcedLogout { .. } => None,
        }
    }
}
