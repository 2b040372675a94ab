//! Seeding commands for realms, groups and users.

use std::sync::Arc;

use super::{CommandOutput, resolve_group_arg};
use crate::models::{GroupId, Principal, RealmId, UserId, UserRole};
use crate::storage::{GroupStore, GroupStoreAdmin};
use crate::{Error, Result};

/// Admin command handler.
pub struct AdminCommand<S> {
    store: Arc<S>,
}

impl<S: GroupStoreAdmin> AdminCommand<S> {
    /// Creates a new admin command over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Creates the system groups of `realm`.
    ///
    /// # Errors
    ///
    /// Returns an error if the realm already has system groups.
    pub fn init_realm(&self, realm: &RealmId) -> Result<CommandOutput> {
        let groups = self.store.create_system_groups(realm)?;
        Ok(CommandOutput::success(format!(
            "created {} system groups in realm '{realm}'",
            groups.len()
        )))
    }

    /// Creates a custom group and prints its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or taken.
    pub fn create_group(
        &self,
        realm: &RealmId,
        name: &str,
        description: &str,
    ) -> Result<CommandOutput> {
        let group = self.store.create_group(realm, name, description)?;
        Ok(CommandOutput::success(group.id.to_string()))
    }

    /// Adds `user` as a direct member of `group`.
    ///
    /// # Errors
    ///
    /// Returns an error if the group is unknown.
    pub fn add_member(&self, realm: &RealmId, group: &str, user: &UserId) -> Result<CommandOutput> {
        let group_id = self.group_in_realm(realm, group)?;
        self.store.add_direct_member(&group_id, user)?;
        Ok(CommandOutput::success(format!("added {user} to {group_id}")))
    }

    /// Nests `subgroup` inside `group`.
    ///
    /// # Errors
    ///
    /// Returns an error if either group is unknown in `realm`.
    pub fn add_subgroup(&self, realm: &RealmId, group: &str, subgroup: &str) -> Result<CommandOutput> {
        let group_id = self.group_in_realm(realm, group)?;
        let subgroup_id = self.group_in_realm(realm, subgroup)?;
        self.store.add_subgroup(&group_id, &subgroup_id)?;
        Ok(CommandOutput::success(format!(
            "nested {subgroup_id} inside {group_id}"
        )))
    }

    fn group_in_realm(&self, realm: &RealmId, arg: &str) -> Result<GroupId> {
        let group_ref = resolve_group_arg(self.store.as_ref(), realm, arg)?;
        self.store
            .resolve(group_ref, realm)?
            .map(|group| group.id)
            .ok_or_else(|| {
                Error::InvalidInput(format!("unknown group '{arg}' in realm '{realm}'"))
            })
    }

    /// Creates or updates a user profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the role name is unknown.
    pub fn set_user(
        &self,
        realm: &RealmId,
        user: &UserId,
        role: &str,
        active: bool,
        full_member: bool,
    ) -> Result<CommandOutput> {
        let role = UserRole::parse(role)
            .ok_or_else(|| Error::InvalidInput(format!("unknown role '{role}'")))?;
        let mut principal =
            Principal::new(user.clone(), realm.clone(), role).with_full_member(full_member);
        if !active {
            principal = principal.deactivated();
        }
        self.store.upsert_user(&principal)?;
        Ok(CommandOutput::success(format!("{user}: {role}")))
    }
}
