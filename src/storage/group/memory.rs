//! In-memory group store.
//!
//! Keeps groups, memberships and containment edges in hash maps behind a
//! `RwLock`. Intended for tests and for embedding groupgate where the caller
//! already holds the group graph in memory.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::{Group, GroupId, Principal, RealmId, SystemRoleTag, UserId};
use crate::{Error, Result};

use super::traits::{GroupStore, GroupStoreAdmin};

#[derive(Debug, Default)]
struct MemoryState {
    groups: HashMap<GroupId, Group>,
    members: HashMap<GroupId, HashSet<UserId>>,
    subgroups: HashMap<GroupId, BTreeSet<GroupId>>,
    users: HashMap<(RealmId, UserId), Principal>,
}

impl MemoryState {
    fn require_group(&self, group_id: &GroupId) -> Result<&Group> {
        self.groups
            .get(group_id)
            .ok_or_else(|| Error::InvalidInput(format!("Group '{group_id}' does not exist")))
    }
}

/// Group store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryGroupStore {
    state: RwLock<MemoryState>,
}

fn poisoned<T>(err: &PoisonError<T>) -> Error {
    Error::OperationFailed {
        operation: "lock_group_store".to_string(),
        cause: err.to_string(),
    }
}

impl MemoryGroupStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>> {
        self.state.read().map_err(|e| poisoned(&e))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>> {
        self.state.write().map_err(|e| poisoned(&e))
    }
}

impl GroupStore for MemoryGroupStore {
    fn get_group(&self, realm_id: &RealmId, group_id: &GroupId) -> Result<Option<Group>> {
        let state = self.read()?;
        Ok(state
            .groups
            .get(group_id)
            .filter(|group| group.realm_id == *realm_id)
            .cloned())
    }

    fn is_direct_member(&self, user_id: &UserId, group_id: &GroupId) -> Result<bool> {
        let state = self.read()?;
        Ok(state
            .members
            .get(group_id)
            .is_some_and(|members| members.contains(user_id)))
    }

    fn direct_subgroups(&self, group_id: &GroupId) -> Result<Vec<GroupId>> {
        let state = self.read()?;
        Ok(state
            .subgroups
            .get(group_id)
            .map(|subgroups| subgroups.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn system_group(&self, realm_id: &RealmId, tag: SystemRoleTag) -> Result<Option<Group>> {
        let state = self.read()?;
        let name = tag.group_name();
        Ok(state
            .groups
            .values()
            .find(|g| g.is_system_group && g.realm_id == *realm_id && g.name == name)
            .cloned())
    }
}

impl GroupStoreAdmin for MemoryGroupStore {
    fn insert_group(&self, group: &Group) -> Result<()> {
        let mut state = self.write()?;

        if state.groups.contains_key(&group.id) {
            return Err(Error::InvalidInput(format!(
                "Group '{}' already exists",
                group.id
            )));
        }
        if state
            .groups
            .values()
            .any(|g| g.realm_id == group.realm_id && g.name == group.name)
        {
            return Err(Error::InvalidInput(format!(
                "Group '{}' already exists in realm '{}'",
                group.name, group.realm_id
            )));
        }
        if let Some(target) = &group.can_mention_group
            && *target != group.id
        {
            state.require_group(target)?;
        }

        state.groups.insert(group.id.clone(), group.clone());
        Ok(())
    }

    fn add_direct_member(&self, group_id: &GroupId, user_id: &UserId) -> Result<()> {
        let mut state = self.write()?;
        state.require_group(group_id)?;
        state
            .members
            .entry(group_id.clone())
            .or_default()
            .insert(user_id.clone());
        Ok(())
    }

    fn add_subgroup(&self, supergroup_id: &GroupId, subgroup_id: &GroupId) -> Result<()> {
        let mut state = self.write()?;
        let supergroup_realm = &state.require_group(supergroup_id)?.realm_id;
        let subgroup_realm = &state.require_group(subgroup_id)?.realm_id;
        if supergroup_realm != subgroup_realm {
            return Err(Error::InvalidInput(format!(
                "Group '{subgroup_id}' (realm '{subgroup_realm}') cannot be nested inside \
                 group '{supergroup_id}' (realm '{supergroup_realm}')"
            )));
        }
        state
            .subgroups
            .entry(supergroup_id.clone())
            .or_default()
            .insert(subgroup_id.clone());
        Ok(())
    }

    fn set_can_mention_group(&self, group_id: &GroupId, target_id: &GroupId) -> Result<()> {
        let mut state = self.write()?;
        state.require_group(target_id)?;
        let group = state
            .groups
            .get_mut(group_id)
            .ok_or_else(|| Error::InvalidInput(format!("Group '{group_id}' does not exist")))?;
        group.can_mention_group = Some(target_id.clone());
        Ok(())
    }

    fn upsert_user(&self, principal: &Principal) -> Result<()> {
        let mut state = self.write()?;
        state.users.insert(
            (principal.realm_id.clone(), principal.id.clone()),
            principal.clone(),
        );
        Ok(())
    }

    fn get_user(&self, realm_id: &RealmId, user_id: &UserId) -> Result<Option<Principal>> {
        let state = self.read()?;
        Ok(state
            .users
            .get(&(realm_id.clone(), user_id.clone()))
            .cloned())
    }
}
