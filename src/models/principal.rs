//! Acting users and their role levels.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::RealmId;

/// Unique identifier for a user within a realm.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a new user ID from the given string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Role level of a user within a realm.
///
/// Each role carries a numeric level; lower levels are more privileged
/// (owner 100, guest 600).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Realm owner.
    Owner,
    /// Realm administrator.
    Administrator,
    /// Moderator.
    Moderator,
    /// Regular member.
    Member,
    /// Guest with restricted access.
    Guest,
}

impl UserRole {
    /// Returns all roles from most to least privileged.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Owner,
            Self::Administrator,
            Self::Moderator,
            Self::Member,
            Self::Guest,
        ]
    }

    /// Returns the numeric role level.
    #[must_use]
    pub const fn level(&self) -> u16 {
        match self {
            Self::Owner => 100,
            Self::Administrator => 200,
            Self::Moderator => 300,
            Self::Member => 400,
            Self::Guest => 600,
        }
    }

    /// Maps a stored numeric level back to a role.
    #[must_use]
    pub const fn from_level(level: u16) -> Option<Self> {
        match level {
            100 => Some(Self::Owner),
            200 => Some(Self::Administrator),
            300 => Some(Self::Moderator),
            400 => Some(Self::Member),
            600 => Some(Self::Guest),
            _ => None,
        }
    }

    /// Returns the role as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Administrator => "administrator",
            Self::Moderator => "moderator",
            Self::Member => "member",
            Self::Guest => "guest",
        }
    }

    /// Parses a role from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "owner" => Some(Self::Owner),
            "administrator" | "admin" => Some(Self::Administrator),
            "moderator" => Some(Self::Moderator),
            "member" => Some(Self::Member),
            "guest" => Some(Self::Guest),
            _ => None,
        }
    }

    /// Returns `true` if this role is at least as privileged as `other`.
    #[must_use]
    pub const fn is_at_least(&self, other: Self) -> bool {
        self.level() <= other.level()
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown user role: {s}"))
    }
}

/// The user on whose behalf a group assignment is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// User identifier.
    pub id: UserId,

    /// Realm the user belongs to.
    pub realm_id: RealmId,

    /// Role level within the realm.
    pub role: UserRole,

    /// Deactivated users only satisfy the unconditional role tags.
    pub is_active: bool,

    /// Whether the user has passed the realm's new-member waiting period.
    pub is_full_member: bool,
}

impl Principal {
    /// Creates an active, full-member principal.
    #[must_use]
    pub fn new(id: impl Into<UserId>, realm_id: RealmId, role: UserRole) -> Self {
        Self {
            id: id.into(),
            realm_id,
            role,
            is_active: true,
            is_full_member: true,
        }
    }

    /// Sets whether the user is a full member.
    #[must_use]
    pub const fn with_full_member(mut self, is_full_member: bool) -> Self {
        self.is_full_member = is_full_member;
        self
    }

    /// Marks the user as deactivated.
    #[must_use]
    pub const fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_roundtrip() {
        for role in UserRole::all() {
            assert_eq!(UserRole::from_level(role.level()), Some(*role));
        }
        assert_eq!(UserRole::from_level(500), None);
    }

    #[test]
    fn test_is_at_least() {
        assert!(UserRole::Owner.is_at_least(UserRole::Administrator));
        assert!(UserRole::Administrator.is_at_least(UserRole::Administrator));
        assert!(!UserRole::Moderator.is_at_least(UserRole::Administrator));
        assert!(!UserRole::Guest.is_at_least(UserRole::Member));
    }

    #[test]
    fn test_parse_accepts_admin_alias() {
        assert_eq!(UserRole::parse("admin"), Some(UserRole::Administrator));
        assert_eq!(UserRole::parse("Guest"), Some(UserRole::Guest));
        assert_eq!(UserRole::parse("superuser"), None);
    }

    #[test]
    fn test_principal_builders() {
        let user = Principal::new("hamlet", RealmId::new("zulip"), UserRole::Member)
            .with_full_member(false)
            .deactivated();
        assert!(!user.is_active);
        assert!(!user.is_full_member);
        assert_eq!(user.id.as_str(), "hamlet");
    }
}
