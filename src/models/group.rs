//! User group models.
//!
//! Groups exist within a realm and come in two flavours:
//! - **System groups** represent a role level (`role:administrators`,
//!   `role:members`, ...). There is exactly one per role tag per realm.
//! - **Custom groups** are user-defined. Their members are the direct members
//!   plus the members of every transitively contained subgroup.
//!
//! A group may also point at another group through `can_mention_group`. That
//! reference is a capability setting, not a containment edge, and never
//! confers membership.
//!
//! # Example
//!
//! ```rust,ignore
//! use groupgate::models::{Group, RealmId, SystemRoleTag};
//!
//! let realm = RealmId::new("zulip");
//! let admins = Group::system(realm.clone(), SystemRoleTag::Administrators);
//! let team = Group::custom(realm, "backend-team");
//! assert!(admins.is_system_group);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::RealmId;

/// Name prefix shared by every system group.
pub const SYSTEM_GROUP_PREFIX: &str = "role:";

/// Unique identifier for a group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    /// Creates a new group ID from the given string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a new random group ID using UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string()[..12].to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for GroupId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for GroupId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Role level represented by a system group.
///
/// Ordered from the widest audience to the narrowest; `Nobody` is satisfied
/// by no one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemRoleTag {
    /// Everyone, including unauthenticated visitors of web-public streams.
    Internet,
    /// Every user of the realm, guests included.
    Everyone,
    /// Every non-guest user.
    Members,
    /// Members past the realm's new-member waiting period.
    FullMembers,
    /// Moderators and above.
    Moderators,
    /// Administrators and owners.
    Administrators,
    /// Owners only.
    Owners,
    /// Nobody.
    Nobody,
}

impl SystemRoleTag {
    /// Returns every role tag.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Internet,
            Self::Everyone,
            Self::Members,
            Self::FullMembers,
            Self::Moderators,
            Self::Administrators,
            Self::Owners,
            Self::Nobody,
        ]
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Internet => "internet",
            Self::Everyone => "everyone",
            Self::Members => "members",
            Self::FullMembers => "fullmembers",
            Self::Moderators => "moderators",
            Self::Administrators => "administrators",
            Self::Owners => "owners",
            Self::Nobody => "nobody",
        }
    }

    /// Parses a tag from a string.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// assert_eq!(SystemRoleTag::parse("administrators"), Some(SystemRoleTag::Administrators));
    /// assert_eq!(SystemRoleTag::parse("MEMBERS"), Some(SystemRoleTag::Members));
    /// assert_eq!(SystemRoleTag::parse("admins"), None);
    /// ```
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "internet" => Some(Self::Internet),
            "everyone" => Some(Self::Everyone),
            "members" => Some(Self::Members),
            "fullmembers" => Some(Self::FullMembers),
            "moderators" => Some(Self::Moderators),
            "administrators" => Some(Self::Administrators),
            "owners" => Some(Self::Owners),
            "nobody" => Some(Self::Nobody),
            _ => None,
        }
    }

    /// Parses the tag out of a system group name such as `role:nobody`.
    ///
    /// The legacy `@role:` spelling is accepted as well.
    #[must_use]
    pub fn from_group_name(name: &str) -> Option<Self> {
        name.trim_start_matches('@')
            .strip_prefix(SYSTEM_GROUP_PREFIX)
            .and_then(Self::parse)
    }

    /// Returns the canonical system group name for this tag.
    #[must_use]
    pub fn group_name(&self) -> String {
        format!("{SYSTEM_GROUP_PREFIX}{}", self.as_str())
    }

    /// Returns the next wider role tag, used to lay out the built-in
    /// subgroup hierarchy (`role:owners` is a subgroup of
    /// `role:administrators`, and so on).
    #[must_use]
    pub const fn parent(&self) -> Option<Self> {
        match self {
            Self::Owners => Some(Self::Administrators),
            Self::Administrators => Some(Self::Moderators),
            Self::Moderators => Some(Self::FullMembers),
            Self::FullMembers => Some(Self::Members),
            Self::Members => Some(Self::Everyone),
            Self::Everyone => Some(Self::Internet),
            Self::Internet | Self::Nobody => None,
        }
    }
}

impl fmt::Display for SystemRoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SystemRoleTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown system role tag: {s}"))
    }
}

/// A user group within a realm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier for the group.
    pub id: GroupId,

    /// Realm this group belongs to.
    pub realm_id: RealmId,

    /// Group name, unique within the realm.
    pub name: String,

    /// Optional description of the group's purpose.
    pub description: String,

    /// Whether this is a built-in role group.
    pub is_system_group: bool,

    /// Group whose members may mention this group.
    ///
    /// Capability setting only. Not a membership edge.
    pub can_mention_group: Option<GroupId>,
}

impl Group {
    /// Creates a new custom group with a generated ID.
    #[must_use]
    pub fn custom(realm_id: RealmId, name: impl Into<String>) -> Self {
        Self {
            id: GroupId::generate(),
            realm_id,
            name: name.into(),
            description: String::new(),
            is_system_group: false,
            can_mention_group: None,
        }
    }

    /// Creates the system group for `tag` with a generated ID.
    #[must_use]
    pub fn system(realm_id: RealmId, tag: SystemRoleTag) -> Self {
        Self {
            id: GroupId::generate(),
            realm_id,
            name: tag.group_name(),
            description: String::new(),
            is_system_group: true,
            can_mention_group: None,
        }
    }

    /// Replaces the generated ID.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<GroupId>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the `can_mention_group` capability reference.
    #[must_use]
    pub fn with_can_mention_group(mut self, group_id: GroupId) -> Self {
        self.can_mention_group = Some(group_id);
        self
    }
}

/// A reference to a proposed subscribers group.
///
/// Callers either already hold the group record or only know its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupRef {
    /// An already materialized group.
    Group(Group),
    /// A raw identifier still to be looked up.
    Id(GroupId),
}

impl GroupRef {
    /// Returns the referenced group's identifier.
    #[must_use]
    pub const fn id(&self) -> &GroupId {
        match self {
            Self::Group(group) => &group.id,
            Self::Id(id) => id,
        }
    }
}

impl From<Group> for GroupRef {
    fn from(group: Group) -> Self {
        Self::Group(group)
    }
}

impl From<GroupId> for GroupRef {
    fn from(id: GroupId) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for GroupRef {
    fn from(id: &str) -> Self {
        Self::Id(GroupId::from(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_id_generate_unique() {
        let a = GroupId::generate();
        let b = GroupId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 12);
    }

    #[test]
    fn test_role_tag_parse() {
        assert_eq!(
            SystemRoleTag::parse("administrators"),
            Some(SystemRoleTag::Administrators)
        );
        assert_eq!(SystemRoleTag::parse("MEMBERS"), Some(SystemRoleTag::Members));
        assert_eq!(SystemRoleTag::parse("admins"), None);
    }

    #[test]
    fn test_role_tag_from_group_name() {
        assert_eq!(
            SystemRoleTag::from_group_name("role:nobody"),
            Some(SystemRoleTag::Nobody)
        );
        assert_eq!(
            SystemRoleTag::from_group_name("@role:nobody"),
            Some(SystemRoleTag::Nobody)
        );
        assert_eq!(SystemRoleTag::from_group_name("nobody"), None);
        assert_eq!(SystemRoleTag::from_group_name("role:superusers"), None);
    }

    #[test]
    fn test_group_name_roundtrips_for_every_tag() {
        for tag in SystemRoleTag::all() {
            assert_eq!(SystemRoleTag::from_group_name(&tag.group_name()), Some(*tag));
        }
    }

    #[test]
    fn test_role_hierarchy_ends_at_internet() {
        let mut tag = SystemRoleTag::Owners;
        let mut steps = 0;
        while let Some(parent) = tag.parent() {
            tag = parent;
            steps += 1;
        }
        assert_eq!(tag, SystemRoleTag::Internet);
        assert_eq!(steps, 6);
        assert_eq!(SystemRoleTag::Nobody.parent(), None);
    }

    #[test]
    fn test_system_group_constructor() {
        let group = Group::system(RealmId::new("zulip"), SystemRoleTag::Administrators);
        assert!(group.is_system_group);
        assert_eq!(group.name, "role:administrators");
        assert!(group.can_mention_group.is_none());
    }

    #[test]
    fn test_group_ref_id() {
        let group = Group::custom(RealmId::new("zulip"), "backend").with_id("g1");
        assert_eq!(GroupRef::from(group).id().as_str(), "g1");
        assert_eq!(GroupRef::from("g2").id().as_str(), "g2");
    }

    #[test]
    fn test_role_tag_serialization() {
        let json = serde_json::to_string(&SystemRoleTag::FullMembers).unwrap_or_default();
        assert_eq!(json, "\"fullmembers\"");
    }
}
