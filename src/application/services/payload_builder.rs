use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    events::NotificationEvent,
    models::{DeliveryPayload, EntityType, GroupMemberCard},
    value_objects::Recipient,
};

pub const LOGOUT_NOTICE: &str = "Account signed in on another device";

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("failed to serialize entity: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("recipient {0} is not addressed by the event")]
    UnknownRecipient(Uuid),
}

/// Builds the payload `recipient` receives for `event`. Pure: the same
/// inputs always produce the same payload.
pub fn build(
    event: &NotificationEvent,
    recipient: &Recipient,
) -> Result<DeliveryPayload, PayloadError> {
    let payload = match event {
        NotificationEvent::DirectMessage { message, .. }
        | NotificationEvent::GroupMessage { message, .. } => {
            DeliveryPayload::new(EntityType::Message, serde_json::to_string(message)?)
        }
        NotificationEvent::GroupJoinNotice { members } => {
            let member = members
                .iter()
                .find(|member| member.user.id == recipient.user_id)
                .ok_or(PayloadError::UnknownRecipient(recipient.user_id))?;
            let card = GroupMemberCard::from(member);
            DeliveryPayload::new(EntityType::AddGroup, serde_json::to_string(&card)?)
        }
        NotificationEvent::GroupMemberAdded {
            new_member_cards, ..
        } => DeliveryPayload::new(
            EntityType::AddGroupMembers,
            serde_json::to_string(new_member_cards)?,
        ),
        NotificationEvent::ForcedLogout { .. } => {
            DeliveryPayload::new(EntityType::Logout, LOGOUT_NOTICE)
        }
        NotificationEvent::FollowNotice { follower, .. } => {
            // Following is always mutual.
            let mut card = follower.clone();
            card.is_follow = true;
            DeliveryPayload::new(EntityType::AddFriend, serde_json::to_string(&card)?)
        }
        NotificationEvent::GroupJoinRequest { applicant, .. } => {
            DeliveryPayload::new(EntityType::JoinRequest, serde_json::to_string(applicant)?)
        }
        NotificationEvent::GenericPush { text, .. } => {
            DeliveryPayload::new(EntityType::GenericPush, text.clone())
        }
    };
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{GroupMember, MemberPermission, MessageCard, User, UserCard};

    #[test]
    fn follow_notice_forces_mutual_flag() {
        let target = User::new("target");
        let follower = User::new("follower");
        let event = NotificationEvent::FollowNotice {
            target: target.clone(),
            follower: UserCard::new(&follower, false),
        };

        let payload = build(&event, &Recipient::from(&target)).unwrap();
        let card: UserCard = serde_json::from_str(&payload.entity_content).unwrap();

        assert_eq!(payload.entity_type, EntityType::AddFriend);
        assert!(card.is_follow);
        assert_eq!(card.id, follower.id);
    }

    #[test]
    fn message_payload_is_deterministic() {
        let sender = User::new("a");
        let receiver = User::new("b");
        let event = NotificationEvent::DirectMessage {
            message: MessageCard::direct(sender.id, receiver.id, "hello"),
            sender,
        };
        let recipient = Recipient::from(&receiver);

        let first = build(&event, &recipient).unwrap();
        let second = build(&event, &recipient).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.entity_type, EntityType::Message);
        let card: MessageCard = serde_json::from_str(&first.entity_content).unwrap();
        assert_eq!(card.content, "hello");
    }

    #[test]
    fn join_notice_carries_each_members_own_card() {
        let group_id = Uuid::new_v4();
        let a = GroupMember::new(group_id, User::new("a"), MemberPermission::None);
        let b = GroupMember::new(group_id, User::new("b"), MemberPermission::Admin);
        let event = NotificationEvent::GroupJoinNotice {
            members: vec![a.clone(), b.clone()],
        };

        let payload = build(&event, &Recipient::from(&b.user)).unwrap();
        let card: GroupMemberCard = serde_json::from_str(&payload.entity_content).unwrap();

        assert_eq!(payload.entity_type, EntityType::AddGroup);
        assert_eq!(card.id, b.id);
        assert!(card.is_admin);
    }

    #[test]
    fn join_notice_for_stranger_is_an_error() {
        let event = NotificationEvent::GroupJoinNotice { members: vec![] };
        let stranger = Recipient::new(Uuid::new_v4(), None);

        assert!(matches!(
            build(&event, &stranger),
            Err(PayloadError::UnknownRecipient(id)) if id == stranger.user_id
        ));
    }

    #[test]
    fn member_added_sends_whole_card_batch() {
        let group_id = Uuid::new_v4();
        let old = GroupMember::new(group_id, User::new("old"), MemberPermission::Owner);
        let joined = [
            GroupMember::new(group_id, User::new("n1"), MemberPermission::None),
            GroupMember::new(group_id, User::new("n2"), MemberPermission::None),
        ];
        let event = NotificationEvent::GroupMemberAdded {
            old_members: vec![old.clone()],
            new_member_cards: joined.iter().map(GroupMemberCard::from).collect(),
        };

        let payload = build(&event, &Recipient::from(&old.user)).unwrap();
        let cards: Vec<GroupMemberCard> = serde_json::from_str(&payload.entity_content).unwrap();

        assert_eq!(payload.entity_type, EntityType::AddGroupMembers);
        assert_eq!(cards.len(), 2);
    }

    #[test]
    fn forced_logout_uses_fixed_notice() {
        let user = User::new("x");
        let event = NotificationEvent::ForcedLogout {
            user: user.clone(),
            device_id: None,
        };

        let payload = build(&event, &Recipient::from(&user)).unwrap();

        assert_eq!(payload, DeliveryPayload::new(EntityType::Logout, LOGOUT_NOTICE));
    }
}
