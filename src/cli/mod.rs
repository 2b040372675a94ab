//! CLI command implementations.
//!
//! Each submodule implements one group of `groupgate` commands. Handlers
//! return their output as a [`CommandOutput`] instead of printing, so the
//! binary decides where text goes and which exit code to use.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `validate` | Check whether a user may assign a subscribers group |
//! | `is-member` | Check whether a user belongs to a group |
//! | `members` | List the groups whose members count toward a group |
//! | `system-group` | Show the system group for a role tag |
//! | `init-realm` | Create the system groups of a realm |
//! | `create-group` | Create a custom group |
//! | `add-member` | Add a user to a group |
//! | `add-subgroup` | Nest one group inside another |
//! | `set-user` | Create or update a user profile |
//!
//! # Example Usage
//!
//! ```bash
//! groupgate init-realm --realm zulip
//! groupgate set-user --realm zulip --user iago --role administrator
//! groupgate validate --realm zulip --user iago --group role:administrators
//! ```

mod admin;
mod membership;
mod validate;

pub use admin::AdminCommand;
pub use membership::MembershipCommand;
pub use validate::{ValidateCommand, ValidateRequest};

use crate::models::{GroupId, GroupRef, Principal, RealmId, SystemRoleTag, UserId};
use crate::storage::GroupStoreAdmin;
use crate::{Error, Result};

/// How a command finished, independent of its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// The command succeeded.
    Success,
    /// The request was well formed but refused.
    Denied,
}

/// Text produced by a command plus its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Text for stdout.
    pub text: String,
    /// Outcome.
    pub status: CommandStatus,
}

impl CommandOutput {
    /// Creates a successful output.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: CommandStatus::Success,
        }
    }

    /// Creates a denied output.
    #[must_use]
    pub fn denied(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: CommandStatus::Denied,
        }
    }
}

/// Turns a `--group` argument into a group reference.
///
/// `role:<tag>` (or `@role:<tag>`) names a system group and is looked up in
/// `realm_id`. Anything else is treated as a group id.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn resolve_group_arg<S>(store: &S, realm_id: &RealmId, arg: &str) -> Result<GroupRef>
where
    S: GroupStoreAdmin + ?Sized,
{
    if let Some(tag) = SystemRoleTag::from_group_name(arg)
        && let Some(group) = store.system_group(realm_id, tag)?
    {
        return Ok(GroupRef::Group(group));
    }
    Ok(GroupRef::Id(GroupId::new(arg)))
}

/// Loads the profile of `user_id`, failing if the user is unknown.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if no profile exists.
pub fn require_user<S>(store: &S, realm_id: &RealmId, user_id: &UserId) -> Result<Principal>
where
    S: GroupStoreAdmin + ?Sized,
{
    store.get_user(realm_id, user_id)?.ok_or_else(|| {
        Error::InvalidInput(format!("unknown user '{user_id}' in realm '{realm_id}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryGroupStore;

    #[test]
    fn test_resolve_system_group_name() {
        let store = MemoryGroupStore::new();
        let realm = RealmId::new("zulip");
        store
            .create_system_groups(&realm)
            .expect("Failed to create system groups");

        let group_ref =
            resolve_group_arg(&store, &realm, "@role:members").expect("Failed to resolve");
        assert!(matches!(group_ref, GroupRef::Group(ref g) if g.name == "role:members"));
    }

    #[test]
    fn test_resolve_plain_id() {
        let store = MemoryGroupStore::new();
        let group_ref = resolve_group_arg(&store, &RealmId::new("zulip"), "9999")
            .expect("Failed to resolve");
        assert_eq!(group_ref, GroupRef::Id(GroupId::new("9999")));
    }

    #[test]
    fn test_require_unknown_user() {
        let store = MemoryGroupStore::new();
        let result = require_user(&store, &RealmId::new("zulip"), &UserId::new("nobody"));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
