//! Group store trait definitions.
//!
//! [`GroupStore`] is the read-only interface the subscribers-group check
//! consumes. [`GroupStoreAdmin`] adds the write side the reference backends
//! expose for seeding and tooling; the decision core never calls it.

use crate::models::{
    Group, GroupId, GroupRef, Principal, RealmId, SystemRoleTag, UserId,
};
use crate::{Error, Result};

/// Read-only access to groups and memberships.
///
/// Implementations must be thread-safe (`Send + Sync`); every method is an
/// independent read.
pub trait GroupStore: Send + Sync {
    /// Gets a group by ID within a realm.
    ///
    /// # Returns
    ///
    /// The group if it exists in `realm_id`, None otherwise. A group with the
    /// same ID in another realm is reported as missing.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    fn get_group(&self, realm_id: &RealmId, group_id: &GroupId) -> Result<Option<Group>>;

    /// Resolves a group reference within a realm.
    ///
    /// Materialized groups are accepted as-is when they belong to `realm_id`.
    /// Identifiers are looked up through [`get_group`](Self::get_group).
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    fn resolve(&self, group_ref: GroupRef, realm_id: &RealmId) -> Result<Option<Group>> {
        match group_ref {
            GroupRef::Group(group) => Ok((group.realm_id == *realm_id).then_some(group)),
            GroupRef::Id(id) => self.get_group(realm_id, &id),
        }
    }

    /// Returns the role tag a system group represents.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PolicyConfiguration`] if the group is not a system
    /// group or its name carries no known role tag.
    fn system_role_tag(&self, group: &Group) -> Result<SystemRoleTag> {
        if !group.is_system_group {
            return Err(Error::PolicyConfiguration(format!(
                "group '{}' is not a system group",
                group.id
            )));
        }

        SystemRoleTag::from_group_name(&group.name).ok_or_else(|| {
            Error::PolicyConfiguration(format!(
                "system group '{}' has unrecognized role tag '{}'",
                group.id, group.name
            ))
        })
    }

    /// Returns `true` if the user is a direct member of the group.
    ///
    /// Subgroups are not consulted.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    fn is_direct_member(&self, user_id: &UserId, group_id: &GroupId) -> Result<bool>;

    /// Lists the groups directly contained in a group.
    ///
    /// Only containment edges are returned; capability references such as
    /// `can_mention_group` are not.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    fn direct_subgroups(&self, group_id: &GroupId) -> Result<Vec<GroupId>>;

    /// Gets the system group for a role tag within a realm.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    fn system_group(&self, realm_id: &RealmId, tag: SystemRoleTag) -> Result<Option<Group>>;
}

/// Write access for the reference backends.
pub trait GroupStoreAdmin: GroupStore {
    /// Inserts a group record.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A group with the same name already exists in the realm
    /// - Storage cannot be accessed
    fn insert_group(&self, group: &Group) -> Result<()>;

    /// Adds a user as a direct member of a group. Adding twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the group doesn't exist or storage cannot be accessed.
    fn add_direct_member(&self, group_id: &GroupId, user_id: &UserId) -> Result<()>;

    /// Adds a containment edge: members of `subgroup_id` count as members of
    /// `supergroup_id`.
    ///
    /// Cycles are accepted. Both groups must belong to the same realm.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Either group doesn't exist
    /// - The groups belong to different realms ([`Error::InvalidInput`])
    /// - Storage cannot be accessed
    fn add_subgroup(&self, supergroup_id: &GroupId, subgroup_id: &GroupId) -> Result<()>;

    /// Points a group's `can_mention_group` capability at another group.
    ///
    /// # Errors
    ///
    /// Returns an error if either group doesn't exist or storage cannot be accessed.
    fn set_can_mention_group(&self, group_id: &GroupId, target_id: &GroupId) -> Result<()>;

    /// Inserts or replaces a user record.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    fn upsert_user(&self, principal: &Principal) -> Result<()>;

    /// Gets a user by ID within a realm.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be accessed.
    fn get_user(&self, realm_id: &RealmId, user_id: &UserId) -> Result<Option<Principal>>;

    /// Creates a custom group with a generated ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or storage cannot be accessed.
    fn create_group(&self, realm_id: &RealmId, name: &str, description: &str) -> Result<Group> {
        if name.is_empty() {
            return Err(Error::InvalidInput("Group name cannot be empty".to_string()));
        }

        let group = Group::custom(realm_id.clone(), name).with_description(description);
        self.insert_group(&group)?;
        Ok(group)
    }

    /// Creates the full set of system groups for a realm.
    ///
    /// `role:nobody` is created first and every system group's
    /// `can_mention_group` points at it, including `role:nobody` itself.
    /// Each role group is then laid out as a subgroup of the next wider one.
    ///
    /// # Errors
    ///
    /// Returns an error if any system group already exists in the realm or
    /// storage cannot be accessed.
    fn create_system_groups(&self, realm_id: &RealmId) -> Result<Vec<Group>> {
        let nobody = Group::system(realm_id.clone(), SystemRoleTag::Nobody);
        self.insert_group(&nobody)?;
        self.set_can_mention_group(&nobody.id, &nobody.id)?;

        let mut created = vec![nobody.clone().with_can_mention_group(nobody.id.clone())];
        for tag in SystemRoleTag::all() {
            if *tag == SystemRoleTag::Nobody {
                continue;
            }
            let group =
                Group::system(realm_id.clone(), *tag).with_can_mention_group(nobody.id.clone());
            self.insert_group(&group)?;
            created.push(group);
        }

        for tag in SystemRoleTag::all() {
            let Some(parent) = tag.parent() else {
                continue;
            };
            let find = |t: SystemRoleTag| {
                created
                    .iter()
                    .find(|g| g.name == t.group_name())
                    .map(|g| g.id.clone())
            };
            if let (Some(parent_id), Some(child_id)) = (find(parent), find(*tag)) {
                self.add_subgroup(&parent_id, &child_id)?;
            }
        }

        tracing::info!(
            realm_id = %realm_id,
            count = created.len(),
            "System groups created"
        );

        Ok(created)
    }
}
