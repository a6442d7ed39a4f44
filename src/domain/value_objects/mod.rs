use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::User;

/// Opaque identifier of the device a user is bound to for push delivery.
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Push providers treat client ids case-insensitively.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub user_id: Uuid,
    pub device_id: Option<DeviceId>,
}

impl Recipient {
    pub fn new(user_id: Uuid, device_id: Option<DeviceId>) -> Self {
        Self { user_id, device_id }
    }
}

impl From<&User> for Recipient {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.device_id())
    }
}

/// Immutable recipient list, ordered by first appearance and deduplicated by
/// user id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientSet {
    recipients: Vec<Recipient>,
}

impl RecipientSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(recipient: Recipient) -> Self {
        Self {
            recipients: vec![recipient],
        }
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn contains(&self, user_id: &Uuid) -> bool {
        self.recipients.iter().any(|r| &r.user_id == user_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipient> {
        self.recipients.iter()
    }

    pub fn user_ids(&self) -> Vec<Uuid> {
        self.recipients.iter().map(|r| r.user_id).collect()
    }

    /// Set difference by user id.
    pub fn without(&self, user_id: &Uuid) -> Self {
        self.filter(|r| &r.user_id != user_id)
    }

    pub fn filter(&self, predicate: impl Fn(&Recipient) -> bool) -> Self {
        Self {
            recipients: self
                .recipients
                .iter()
                .filter(|r| predicate(r))
                .cloned()
                .collect(),
        }
    }
}

impl FromIterator<Recipient> for RecipientSet {
    fn from_iter<I: IntoIterator<Item = Recipient>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let recipients = iter
            .into_iter()
            .filter(|r| seen.insert(r.user_id))
            .collect();
        Self { recipients }
    }
}

impl<'a> IntoIterator for &'a RecipientSet {
    type Item = &'a Recipient;
    type IntoIter = std::slice::Iter<'a, Recipient>;

    fn into_iter(self) -> Self::IntoIter {
        self.recipients.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient(device: Option<&str>) -> Recipient {
        Recipient::new(Uuid::new_v4(), device.and_then(DeviceId::parse))
    }

    #[test]
    fn device_id_rejects_blank_values() {
        assert!(DeviceId::parse("").is_none());
        assert!(DeviceId::parse("   ").is_none());
        assert_eq!(DeviceId::parse(" abc ").unwrap().as_str(), "abc");
    }

    #[test]
    fn device_id_matches_case_insensitively() {
        let device = DeviceId::parse("AbC123").unwrap();
        assert!(device.matches("abc123"));
        assert!(!device.matches("abc124"));
    }

    #[test]
    fn collecting_keeps_first_occurrence_order() {
        let a = recipient(Some("a"));
        let b = recipient(None);
        let duplicate_a = Recipient::new(a.user_id, DeviceId::parse("other"));

        let set: RecipientSet = vec![a.clone(), b.clone(), duplicate_a].into_iter().collect();

        assert_eq!(set.len(), 2);
        assert_eq!(set.user_ids(), vec![a.user_id, b.user_id]);
        assert_eq!(set.iter().next().unwrap().device_id, a.device_id);
    }

    #[test]
    fn without_removes_only_the_given_user() {
        let a = recipient(Some("a"));
        let b = recipient(Some("b"));
        let set: RecipientSet = vec![a.clone(), b.clone()].into_iter().collect();

        let rest = set.without(&a.user_id);

        assert!(!rest.contains(&a.user_id));
        assert!(rest.contains(&b.user_id));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn without_unknown_user_is_identity() {
        let set: RecipientSet = vec![recipient(None), recipient(Some("x"))]
            .into_iter()
            .collect();
        assert_eq!(set.without(&Uuid::new_v4()), set);
    }
}
