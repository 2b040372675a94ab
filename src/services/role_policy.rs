//! Role requirements for system groups.
//!
//! Each system group stands for a role level. Assigning it as a subscribers
//! group requires the acting user to hold that level.
//!
//! | Role tag | Satisfied by |
//! |----------|--------------|
//! | `internet`, `everyone` | anyone |
//! | `members` | active non-guests |
//! | `fullmembers` | active moderators and above, or active full members |
//! | `moderators` | active moderators, administrators, owners |
//! | `administrators` | active administrators and owners |
//! | `owners` | active owners |
//! | `nobody` | no one |
//!
//! # Example
//!
//! ```rust
//! use groupgate::models::{Principal, RealmId, SystemRoleTag, UserRole};
//! use groupgate::services::SystemGroupPolicy;
//!
//! let policy = SystemGroupPolicy::new();
//! let iago = Principal::new("iago", RealmId::new("zulip"), UserRole::Administrator);
//! assert!(policy.principal_satisfies(SystemRoleTag::Administrators, &iago));
//! assert!(!policy.principal_satisfies(SystemRoleTag::Owners, &iago));
//! ```

use crate::models::{Principal, SystemRoleTag, UserRole};

/// Pure mapping from system role tags to the principals that satisfy them.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemGroupPolicy;

impl SystemGroupPolicy {
    /// Creates the policy.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns `true` if `principal` may assign the system group for `tag`.
    #[must_use]
    pub const fn principal_satisfies(&self, tag: SystemRoleTag, principal: &Principal) -> bool {
        match tag {
            SystemRoleTag::Internet | SystemRoleTag::Everyone => true,
            SystemRoleTag::Nobody => false,
            SystemRoleTag::FullMembers => {
                principal.is_active
                    && (principal.role.is_at_least(UserRole::Moderator)
                        || (principal.role.is_at_least(UserRole::Member)
                            && principal.is_full_member))
            },
            SystemRoleTag::Members => Self::active_at_least(principal, UserRole::Member),
            SystemRoleTag::Moderators => Self::active_at_least(principal, UserRole::Moderator),
            SystemRoleTag::Administrators => {
                Self::active_at_least(principal, UserRole::Administrator)
            },
            SystemRoleTag::Owners => Self::active_at_least(principal, UserRole::Owner),
        }
    }

    const fn active_at_least(principal: &Principal, required: UserRole) -> bool {
        principal.is_active && principal.role.is_at_least(required)
    }

    /// Returns the least privileged role that satisfies `tag` on its own.
    ///
    /// `None` for tags that do not reduce to a single role threshold.
    #[must_use]
    pub const fn minimum_role(tag: SystemRoleTag) -> Option<UserRole> {
        match tag {
            SystemRoleTag::Members => Some(UserRole::Member),
            SystemRoleTag::Moderators => Some(UserRole::Moderator),
            SystemRoleTag::Administrators => Some(UserRole::Administrator),
            SystemRoleTag::Owners => Some(UserRole::Owner),
            SystemRoleTag::Internet
            | SystemRoleTag::Everyone
            | SystemRoleTag::FullMembers
            | SystemRoleTag::Nobody => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RealmId;
    use test_case::test_case;

    fn principal(role: UserRole) -> Principal {
        Principal::new("user", RealmId::new("zulip"), role)
    }

    #[test_case(SystemRoleTag::Administrators, UserRole::Owner => true)]
    #[test_case(SystemRoleTag::Administrators, UserRole::Administrator => true)]
    #[test_case(SystemRoleTag::Administrators, UserRole::Moderator => false)]
    #[test_case(SystemRoleTag::Administrators, UserRole::Member => false)]
    #[test_case(SystemRoleTag::Administrators, UserRole::Guest => false)]
    #[test_case(SystemRoleTag::Owners, UserRole::Owner => true)]
    #[test_case(SystemRoleTag::Owners, UserRole::Administrator => false)]
    #[test_case(SystemRoleTag::Moderators, UserRole::Moderator => true)]
    #[test_case(SystemRoleTag::Moderators, UserRole::Member => false)]
    #[test_case(SystemRoleTag::Members, UserRole::Member => true)]
    #[test_case(SystemRoleTag::Members, UserRole::Guest => false)]
    #[test_case(SystemRoleTag::FullMembers, UserRole::Member => true)]
    #[test_case(SystemRoleTag::FullMembers, UserRole::Guest => false)]
    #[test_case(SystemRoleTag::Everyone, UserRole::Guest => true)]
    #[test_case(SystemRoleTag::Internet, UserRole::Guest => true)]
    #[test_case(SystemRoleTag::Nobody, UserRole::Owner => false)]
    fn test_policy_table(tag: SystemRoleTag, role: UserRole) -> bool {
        SystemGroupPolicy::new().principal_satisfies(tag, &principal(role))
    }

    #[test]
    fn test_nobody_is_satisfied_by_no_role() {
        let policy = SystemGroupPolicy::new();
        for role in UserRole::all() {
            assert!(!policy.principal_satisfies(SystemRoleTag::Nobody, &principal(*role)));
        }
    }

    #[test]
    fn test_everyone_is_unconditional() {
        let policy = SystemGroupPolicy::new();
        let deactivated = principal(UserRole::Guest).deactivated();
        assert!(policy.principal_satisfies(SystemRoleTag::Everyone, &deactivated));
        assert!(policy.principal_satisfies(SystemRoleTag::Internet, &deactivated));
    }

    #[test]
    fn test_deactivated_admin_fails_role_checks() {
        let policy = SystemGroupPolicy::new();
        let admin = principal(UserRole::Administrator).deactivated();
        assert!(!policy.principal_satisfies(SystemRoleTag::Administrators, &admin));
        assert!(!policy.principal_satisfies(SystemRoleTag::Members, &admin));
    }

    #[test]
    fn test_full_members_waiting_period() {
        let policy = SystemGroupPolicy::new();
        let new_member = principal(UserRole::Member).with_full_member(false);
        assert!(!policy.principal_satisfies(SystemRoleTag::FullMembers, &new_member));
        assert!(policy.principal_satisfies(SystemRoleTag::Members, &new_member));

        // Moderators count as full members regardless of account age.
        let new_moderator = principal(UserRole::Moderator).with_full_member(false);
        assert!(policy.principal_satisfies(SystemRoleTag::FullMembers, &new_moderator));
    }

    #[test]
    fn test_role_ordering_is_monotonic() {
        let policy = SystemGroupPolicy::new();
        for tag in SystemRoleTag::all() {
            let satisfied: Vec<bool> = UserRole::all()
                .iter()
                .map(|role| policy.principal_satisfies(*tag, &principal(*role)))
                .collect();
            // Once a less privileged role is accepted, every more privileged one is too.
            for pair in satisfied.windows(2) {
                assert!(pair[0] || !pair[1], "non-monotonic policy for {tag}");
            }
        }
    }

    #[test]
    fn test_minimum_role() {
        assert_eq!(
            SystemGroupPolicy::minimum_role(SystemRoleTag::Administrators),
            Some(UserRole::Administrator)
        );
        assert_eq!(SystemGroupPolicy::minimum_role(SystemRoleTag::Nobody), None);
    }

    #[test]
    fn test_threshold_tags_match_minimum_role() {
        let policy = SystemGroupPolicy::new();
        for tag in SystemRoleTag::all() {
            let Some(required) = SystemGroupPolicy::minimum_role(*tag) else {
                continue;
            };
            for role in UserRole::all() {
                assert_eq!(
                    policy.principal_satisfies(*tag, &principal(*role)),
                    role.is_at_least(required),
                    "{tag} disagrees with its minimum role for {role}"
                );
            }
        }
    }
}
