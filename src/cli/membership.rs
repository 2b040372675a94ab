//! Membership CLI commands: `is-member`, `members` and `system-group`.

use std::fmt::Write as _;
use std::sync::Arc;

use super::{CommandOutput, require_user, resolve_group_arg};
use crate::models::{Group, GroupRef, RealmId, SystemRoleTag, UserId};
use crate::services::{MembershipResolver, SystemGroupPolicy};
use crate::storage::GroupStoreAdmin;
use crate::{Error, Result};

/// Membership command handler.
pub struct MembershipCommand<S> {
    store: Arc<S>,
    resolver: MembershipResolver,
}

impl<S: GroupStoreAdmin + 'static> MembershipCommand<S> {
    /// Creates a new membership command over `store`.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        let resolver = MembershipResolver::new(store.clone());
        Self { store, resolver }
    }

    /// Prints `true` or `false`.
    ///
    /// System groups are answered by role, custom groups by nested
    /// membership.
    ///
    /// # Errors
    ///
    /// Returns an error if the user or group is unknown or the store fails.
    pub fn is_member(&self, realm: &RealmId, user: &UserId, group: &str) -> Result<CommandOutput> {
        let group = self.require_group(realm, group)?;
        let member = if group.is_system_group {
            let principal = require_user(self.store.as_ref(), realm, user)?;
            let tag = self.store.system_role_tag(&group)?;
            SystemGroupPolicy::new().principal_satisfies(tag, &principal)
        } else {
            self.resolver.is_member(user, &group.id)?
        };
        Ok(CommandOutput::success(member.to_string()))
    }

    /// Lists every group whose direct members count as members of `group`,
    /// one `id<TAB>name` line each.
    ///
    /// # Errors
    ///
    /// Returns an error if the group is unknown or the store fails.
    pub fn members(&self, realm: &RealmId, group: &str) -> Result<CommandOutput> {
        let group = self.require_group(realm, group)?;
        let mut text = String::new();
        for id in self.resolver.reachable_groups(&group.id)? {
            let name = self
                .store
                .get_group(realm, &id)?
                .map_or_else(|| "?".to_string(), |g| g.name);
            let _ = writeln!(text, "{id}\t{name}");
        }
        Ok(CommandOutput::success(text.trim_end().to_string()))
    }

    /// Shows the system group for `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag is unknown or the realm has no such group.
    pub fn system_group(&self, realm: &RealmId, tag: &str, json: bool) -> Result<CommandOutput> {
        let parsed = SystemRoleTag::parse(tag)
            .or_else(|| SystemRoleTag::from_group_name(tag))
            .ok_or_else(|| Error::PolicyConfiguration(format!("unknown role tag '{tag}'")))?;
        let group = self.store.system_group(realm, parsed)?.ok_or_else(|| {
            Error::InvalidInput(format!("realm '{realm}' has no {} group", parsed.group_name()))
        })?;

        let text = if json {
            serde_json::to_string(&group).map_err(|e| Error::OperationFailed {
                operation: "serialize_group".to_string(),
                cause: e.to_string(),
            })?
        } else {
            format!("{}\t{}", group.id, group.name)
        };
        Ok(CommandOutput::success(text))
    }

    fn require_group(&self, realm: &RealmId, arg: &str) -> Result<Group> {
        let group_ref: GroupRef = resolve_group_arg(self.store.as_ref(), realm, arg)?;
        self.store
            .resolve(group_ref, realm)?
            .ok_or_else(|| Error::InvalidInput(format!("unknown group '{arg}' in realm '{realm}'")))
    }
}
