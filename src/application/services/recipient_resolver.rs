use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    events::NotificationEvent,
    models::GroupMember,
    repositories::{GroupRepository, UserRepository},
    value_objects::{Recipient, RecipientSet},
};

/// Result of resolving an event's audience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A referenced user or group does not exist; the event is dropped.
    NotFound,
    /// The audience, possibly empty.
    Resolved(RecipientSet),
}

impl Resolution {
    pub fn recipients(&self) -> Option<&RecipientSet> {
        match self {
            Resolution::NotFound => None,
            Resolution::Resolved(set) => Some(set),
        }
    }
}

pub struct RecipientResolver {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
}

impl RecipientResolver {
    pub fn new(users: Arc<dyn UserRepository>, groups: Arc<dyn GroupRepository>) -> Self {
        Self { users, groups }
    }

    pub async fn resolve(&self, event: &NotificationEvent) -> anyhow::Result<Resolution> {
        let resolution = match event {
            NotificationEvent::DirectMessage { message, .. } => match message.receiver_id {
                Some(receiver_id) => self.single_user(&receiver_id).await?,
                None => Resolution::NotFound,
            },
            NotificationEvent::GroupMessage { sender, message } => match message.group_id {
                Some(group_id) => self
                    .group_members(&group_id, |_| true)
                    .await?
                    .without_user(&sender.id),
                None => Resolution::NotFound,
            },
            NotificationEvent::GroupJoinNotice { members } => {
                Resolution::Resolved(members_to_recipients(members))
            }
            NotificationEvent::GroupMemberAdded { old_members, .. } => {
                Resolution::Resolved(members_to_recipients(old_members))
            }
            NotificationEvent::ForcedLogout { user, device_id } => Resolution::Resolved(
                RecipientSet::single(Recipient::new(user.id, device_id.clone())),
            ),
            NotificationEvent::FollowNotice { target, .. } => {
                Resolution::Resolved(RecipientSet::single(Recipient::from(target)))
            }
            NotificationEvent::GroupJoinRequest {
                group_id,
                applicant,
            } => self
                .group_members(group_id, GroupMember::is_admin)
                .await?
                .without_user(&applicant.id),
            NotificationEvent::GenericPush { receiver_id, .. } => {
                self.single_user(receiver_id).await?
            }
        };

        if resolution == Resolution::NotFound {
            debug!(event = event.kind(), "notification target not found");
        }
        Ok(resolution)
    }

    async fn single_user(&self, user_id: &Uuid) -> anyhow::Result<Resolution> {
        Ok(match self.users.get(user_id).await? {
            Some(user) => Resolution::Resolved(RecipientSet::single(Recipient::from(&user))),
            None => Resolution::NotFound,
        })
    }

    /// Reads the group's current membership.
    async fn group_members(
        &self,
        group_id: &Uuid,
        keep: impl Fn(&GroupMember) -> bool,
    ) -> anyhow::Result<Resolution> {
        let Some(group) = self.groups.get(group_id).await? else {
            return Ok(Resolution::NotFound);
        };
        let members = self.groups.list_members(&group).await?;
        Ok(Resolution::Resolved(
            members
                .iter()
                .filter(|member| keep(*member))
                .map(|member| Recipient::from(&member.user))
                .collect(),
        ))
    }
}

impl Resolution {
    fn without_user(self, user_id: &Uuid) -> Self {
        match self {
            Resolution::Resolved(set) => Resolution::Resolved(set.without(user_id)),
            Resolution::NotFound => Resolution::NotFound,
        }
    }
}

fn members_to_recipients(members: &[GroupMember]) -> RecipientSet {
    members
        .iter()
        .map(|member| Recipient::from(&member.user))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Group, MemberPermission, MessageCard, User, UserCard};
    use crate::domain::value_objects::DeviceId;
    use crate::infrastructure::repositories::in_memory::{
        InMemoryGroupRepository, InMemoryUserRepository,
    };

    struct Fixture {
        users: Arc<InMemoryUserRepository>,
        groups: Arc<InMemoryGroupRepository>,
        resolver: RecipientResolver,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new());
        let groups = Arc::new(InMemoryGroupRepository::new(&users));
        let resolver = RecipientResolver::new(users.clone(), groups.clone());
        Fixture {
            users,
            groups,
            resolver,
        }
    }

    #[tokio::test]
    async fn direct_message_resolves_receiver() {
        let fx = fixture();
        let sender = User::new("alice");
        let receiver = User::new("bob").with_push_id("bob-device");
        fx.users.upsert(&receiver).await.unwrap();

        let event = NotificationEvent::DirectMessage {
            message: MessageCard::direct(sender.id, receiver.id, "hi"),
            sender,
        };
        let resolution = fx.resolver.resolve(&event).await.unwrap();

        let recipients = resolution.recipients().unwrap();
        assert_eq!(recipients.user_ids(), vec![receiver.id]);
        assert_eq!(
            recipients.iter().next().unwrap().device_id,
            DeviceId::parse("bob-device")
        );
    }

    #[tokio::test]
    async fn direct_message_to_unknown_user_is_not_found() {
        let fx = fixture();
        let sender = User::new("alice");
        let event = NotificationEvent::DirectMessage {
            message: MessageCard::direct(sender.id, Uuid::new_v4(), "hi"),
            sender,
        };

        assert_eq!(
            fx.resolver.resolve(&event).await.unwrap(),
            Resolution::NotFound
        );
    }

    #[tokio::test]
    async fn group_message_excludes_sender() {
        let fx = fixture();
        let a = User::new("a").with_push_id("da");
        let b = User::new("b").with_push_id("db");
        let c = User::new("c");
        let group = Group::new("g", a.id);
        fx.groups.insert_group(group.clone()).await;
        fx.groups
            .add_member(GroupMember::new(group.id, a.clone(), MemberPermission::Owner))
            .await;
        fx.groups
            .add_member(GroupMember::new(group.id, b.clone(), MemberPermission::None))
            .await;
        fx.groups
            .add_member(GroupMember::new(group.id, c.clone(), MemberPermission::None))
            .await;

        let event = NotificationEvent::GroupMessage {
            message: MessageCard::group(a.id, group.id, "hello"),
            sender: a.clone(),
        };
        let resolution = fx.resolver.resolve(&event).await.unwrap();
        let recipients = resolution.recipients().unwrap();

        assert_eq!(recipients.len(), 2);
        assert!(!recipients.contains(&a.id));
        assert!(recipients.contains(&b.id));
        assert!(recipients.contains(&c.id));
    }

    #[tokio::test]
    async fn group_message_to_missing_group_is_not_found() {
        let fx = fixture();
        let sender = User::new("a");
        let event = NotificationEvent::GroupMessage {
            message: MessageCard::group(sender.id, Uuid::new_v4(), "hello"),
            sender,
        };

        assert_eq!(
            fx.resolver.resolve(&event).await.unwrap(),
            Resolution::NotFound
        );
    }

    #[tokio::test]
    async fn group_with_only_sender_resolves_empty() {
        let fx = fixture();
        let a = User::new("a");
        let group = Group::new("solo", a.id);
        fx.groups.insert_group(group.clone()).await;
        fx.groups
            .add_member(GroupMember::new(group.id, a.clone(), MemberPermission::Owner))
            .await;

        let event = NotificationEvent::GroupMessage {
            message: MessageCard::group(a.id, group.id, "echo"),
            sender: a,
        };

        assert_eq!(
            fx.resolver.resolve(&event).await.unwrap(),
            Resolution::Resolved(RecipientSet::empty())
        );
    }

    #[tokio::test]
    async fn forced_logout_uses_supplied_device() {
        let fx = fixture();
        let user = User::new("x").with_push_id("new-device");
        let event = NotificationEvent::ForcedLogout {
            user: user.clone(),
            device_id: DeviceId::parse("old-device"),
        };

        let resolution = fx.resolver.resolve(&event).await.unwrap();
        let recipient = resolution.recipients().unwrap().iter().next().unwrap().clone();

        assert_eq!(recipient.user_id, user.id);
        assert_eq!(recipient.device_id, DeviceId::parse("old-device"));
    }

    #[tokio::test]
    async fn join_request_reaches_admins_only() {
        let fx = fixture();
        let owner = User::new("owner");
        let admin = User::new("admin");
        let plain = User::new("plain");
        let applicant = User::new("applicant");
        let group = Group::new("g", owner.id);
        fx.groups.insert_group(group.clone()).await;
        for (user, permission) in [
            (owner.clone(), MemberPermission::Owner),
            (admin.clone(), MemberPermission::Admin),
            (plain.clone(), MemberPermission::None),
        ] {
            fx.groups
                .add_member(GroupMember::new(group.id, user, permission))
                .await;
        }

        let event = NotificationEvent::GroupJoinRequest {
            group_id: group.id,
            applicant: UserCard::new(&applicant, false),
        };
        let resolution = fx.resolver.resolve(&event).await.unwrap();

        assert_eq!(
            resolution.recipients().unwrap().user_ids(),
            vec![owner.id, admin.id]
        );
    }
}
