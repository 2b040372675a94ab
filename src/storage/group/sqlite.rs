//! `SQLite` backend for group storage.
//!
//! Stores groups, direct memberships, containment edges and user records in a
//! single database. The `can_mention_group_id` column is a capability
//! reference kept on the group row; containment lives in its own table so the
//! two can never be confused during membership traversal.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::models::{Group, GroupId, Principal, RealmId, SystemRoleTag, UserId, UserRole};
use crate::{Error, Result};

use super::traits::{GroupStore, GroupStoreAdmin};

const GROUP_COLUMNS: &str = "id, realm_id, name, description, is_system_group, can_mention_group_id";

/// SQLite-based group store.
pub struct SqliteGroupStore {
    /// Database connection (mutex for interior mutability).
    conn: Mutex<Connection>,
}

impl SqliteGroupStore {
    /// Opens (or creates) a group database at the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(|e| Error::OperationFailed {
            operation: "open_group_database".to_string(),
            cause: e.to_string(),
        })?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Creates an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::OperationFailed {
            operation: "open_group_database_memory".to_string(),
            cause: e.to_string(),
        })?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Returns the default database path, `<data dir>/groupgate/groups.db`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|d| d.data_dir().join("groupgate").join("groups.db"))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| Error::OperationFailed {
            operation: "lock_connection".to_string(),
            cause: e.to_string(),
        })
    }

    /// Initializes the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS user_groups (
                id TEXT PRIMARY KEY,
                realm_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                is_system_group INTEGER NOT NULL DEFAULT 0,
                can_mention_group_id TEXT REFERENCES user_groups(id) ON DELETE SET NULL,
                UNIQUE(realm_id, name)
            );

            CREATE INDEX IF NOT EXISTS idx_user_groups_realm ON user_groups(realm_id);

            CREATE TABLE IF NOT EXISTS group_direct_members (
                group_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                PRIMARY KEY (group_id, user_id),
                FOREIGN KEY (group_id) REFERENCES user_groups(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_group_direct_members_user ON group_direct_members(user_id);

            CREATE TABLE IF NOT EXISTS group_subgroups (
                supergroup_id TEXT NOT NULL,
                subgroup_id TEXT NOT NULL,
                PRIMARY KEY (supergroup_id, subgroup_id),
                FOREIGN KEY (supergroup_id) REFERENCES user_groups(id) ON DELETE CASCADE,
                FOREIGN KEY (subgroup_id) REFERENCES user_groups(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS user_profiles (
                id TEXT NOT NULL,
                realm_id TEXT NOT NULL,
                role INTEGER NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                is_full_member INTEGER NOT NULL DEFAULT 1,
                PRIMARY KEY (realm_id, id)
            );
            ",
        )
        .map_err(|e| Error::OperationFailed {
            operation: "initialize_group_schema".to_string(),
            cause: e.to_string(),
        })?;

        Ok(())
    }

    fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
        Ok(Group {
            id: GroupId::new(row.get::<_, String>(0)?),
            realm_id: RealmId::new(row.get::<_, String>(1)?),
            name: row.get(2)?,
            description: row.get(3)?,
            is_system_group: row.get(4)?,
            can_mention_group: row.get::<_, Option<String>>(5)?.map(GroupId::new),
        })
    }

    fn query_group(
        &self,
        operation: &str,
        sql: &str,
        args: impl rusqlite::Params,
    ) -> Result<Option<Group>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(sql).map_err(|e| Error::OperationFailed {
            operation: format!("prepare_{operation}"),
            cause: e.to_string(),
        })?;

        stmt.query_row(args, Self::group_from_row)
            .optional()
            .map_err(|e| Error::OperationFailed {
                operation: operation.to_string(),
                cause: e.to_string(),
            })
    }

    fn ensure_group_exists(conn: &Connection, group_id: &GroupId) -> Result<()> {
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM user_groups WHERE id = ?1)",
                params![group_id.as_str()],
                |row| row.get(0),
            )
            .map_err(|e| Error::OperationFailed {
                operation: "check_group_exists".to_string(),
                cause: e.to_string(),
            })?;

        if exists {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "Group '{group_id}' does not exist"
            )))
        }
    }

    fn group_realm(conn: &Connection, group_id: &GroupId) -> Result<RealmId> {
        conn.query_row(
            "SELECT realm_id FROM user_groups WHERE id = ?1",
            params![group_id.as_str()],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| Error::OperationFailed {
            operation: "get_group_realm".to_string(),
            cause: e.to_string(),
        })?
        .map(RealmId::new)
        .ok_or_else(|| Error::InvalidInput(format!("Group '{group_id}' does not exist")))
    }
}

impl GroupStore for SqliteGroupStore {
    fn get_group(&self, realm_id: &RealmId, group_id: &GroupId) -> Result<Option<Group>> {
        self.query_group(
            "get_group",
            &format!("SELECT {GROUP_COLUMNS} FROM user_groups WHERE id = ?1 AND realm_id = ?2"),
            params![group_id.as_str(), realm_id.as_str()],
        )
    }

    fn is_direct_member(&self, user_id: &UserId, group_id: &GroupId) -> Result<bool> {
        let conn = self.lock()?;

        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM group_direct_members WHERE group_id = ?1 AND user_id = ?2)",
            params![group_id.as_str(), user_id.as_str()],
            |row| row.get(0),
        )
        .map_err(|e| Error::OperationFailed {
            operation: "is_direct_member".to_string(),
            cause: e.to_string(),
        })
    }

    fn direct_subgroups(&self, group_id: &GroupId) -> Result<Vec<GroupId>> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                "SELECT subgroup_id FROM group_subgroups
                 WHERE supergroup_id = ?1 ORDER BY subgroup_id",
            )
            .map_err(|e| Error::OperationFailed {
                operation: "prepare_direct_subgroups".to_string(),
                cause: e.to_string(),
            })?;

        let subgroups = stmt
            .query_map(params![group_id.as_str()], |row| {
                row.get::<_, String>(0).map(GroupId::new)
            })
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| Error::OperationFailed {
                operation: "direct_subgroups".to_string(),
                cause: e.to_string(),
            })?;

        Ok(subgroups)
    }

    fn system_group(&self, realm_id: &RealmId, tag: SystemRoleTag) -> Result<Option<Group>> {
        self.query_group(
            "system_group",
            &format!(
                "SELECT {GROUP_COLUMNS} FROM user_groups
                 WHERE realm_id = ?1 AND name = ?2 AND is_system_group = 1"
            ),
            params![realm_id.as_str(), tag.group_name()],
        )
    }
}

impl GroupStoreAdmin for SqliteGroupStore {
    fn insert_group(&self, group: &Group) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(|e| Error::OperationFailed {
            operation: "begin_insert_group".to_string(),
            cause: e.to_string(),
        })?;

        // A self-referencing capability is written after the row exists.
        let self_reference = group.can_mention_group.as_ref() == Some(&group.id);
        let can_mention = if self_reference {
            None
        } else {
            group.can_mention_group.as_ref().map(GroupId::as_str)
        };
        if let Some(target) = &group.can_mention_group
            && !self_reference
        {
            Self::ensure_group_exists(&tx, target)?;
        }

        tx.execute(
            "INSERT INTO user_groups (id, realm_id, name, description, is_system_group, can_mention_group_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                group.id.as_str(),
                group.realm_id.as_str(),
                group.name,
                group.description,
                group.is_system_group,
                can_mention,
            ],
        )
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                Error::InvalidInput(format!(
                    "Group '{}' already exists in realm '{}'",
                    group.name, group.realm_id
                ))
            } else {
                Error::OperationFailed {
                    operation: "insert_group".to_string(),
                    cause: e.to_string(),
                }
            }
        })?;

        if self_reference {
            tx.execute(
                "UPDATE user_groups SET can_mention_group_id = id WHERE id = ?1",
                params![group.id.as_str()],
            )
            .map_err(|e| Error::OperationFailed {
                operation: "insert_group_self_reference".to_string(),
                cause: e.to_string(),
            })?;
        }

        tx.commit().map_err(|e| Error::OperationFailed {
            operation: "commit_insert_group".to_string(),
            cause: e.to_string(),
        })
    }

    fn add_direct_member(&self, group_id: &GroupId, user_id: &UserId) -> Result<()> {
        let conn = self.lock()?;
        Self::ensure_group_exists(&conn, group_id)?;

        conn.execute(
            "INSERT OR IGNORE INTO group_direct_members (group_id, user_id) VALUES (?1, ?2)",
            params![group_id.as_str(), user_id.as_str()],
        )
        .map_err(|e| Error::OperationFailed {
            operation: "add_direct_member".to_string(),
            cause: e.to_string(),
        })?;

        Ok(())
    }

    fn add_subgroup(&self, supergroup_id: &GroupId, subgroup_id: &GroupId) -> Result<()> {
        let conn = self.lock()?;
        let supergroup_realm = Self::group_realm(&conn, supergroup_id)?;
        let subgroup_realm = Self::group_realm(&conn, subgroup_id)?;
        if supergroup_realm != subgroup_realm {
            return Err(Error::InvalidInput(format!(
                "Group '{subgroup_id}' (realm '{subgroup_realm}') cannot be nested inside \
                 group '{supergroup_id}' (realm '{supergroup_realm}')"
            )));
        }

        conn.execute(
            "INSERT OR IGNORE INTO group_subgroups (supergroup_id, subgroup_id) VALUES (?1, ?2)",
            params![supergroup_id.as_str(), subgroup_id.as_str()],
        )
        .map_err(|e| Error::OperationFailed {
            operation: "add_subgroup".to_string(),
            cause: e.to_string(),
        })?;

        Ok(())
    }

    fn set_can_mention_group(&self, group_id: &GroupId, target_id: &GroupId) -> Result<()> {
        let conn = self.lock()?;
        Self::ensure_group_exists(&conn, group_id)?;
        Self::ensure_group_exists(&conn, target_id)?;

        conn.execute(
            "UPDATE user_groups SET can_mention_group_id = ?2 WHERE id = ?1",
            params![group_id.as_str(), target_id.as_str()],
        )
        .map_err(|e| Error::OperationFailed {
            operation: "set_can_mention_group".to_string(),
            cause: e.to_string(),
        })?;

        Ok(())
    }

    fn upsert_user(&self, principal: &Principal) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO user_profiles (id, realm_id, role, is_active, is_full_member)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(realm_id, id) DO UPDATE SET
                role = excluded.role,
                is_active = excluded.is_active,
                is_full_member = excluded.is_full_member",
            params![
                principal.id.as_str(),
                principal.realm_id.as_str(),
                principal.role.level(),
                principal.is_active,
                principal.is_full_member,
            ],
        )
        .map_err(|e| Error::OperationFailed {
            operation: "upsert_user".to_string(),
            cause: e.to_string(),
        })?;

        Ok(())
    }

    fn get_user(&self, realm_id: &RealmId, user_id: &UserId) -> Result<Option<Principal>> {
        let conn = self.lock()?;

        let row = conn
            .query_row(
                "SELECT role, is_active, is_full_member FROM user_profiles
                 WHERE realm_id = ?1 AND id = ?2",
                params![realm_id.as_str(), user_id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, u16>(0)?,
                        row.get::<_, bool>(1)?,
                        row.get::<_, bool>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| Error::OperationFailed {
                operation: "get_user".to_string(),
                cause: e.to_string(),
            })?;

        let Some((level, is_active, is_full_member)) = row else {
            return Ok(None);
        };

        let role = UserRole::from_level(level).ok_or_else(|| Error::OperationFailed {
            operation: "get_user".to_string(),
            cause: format!("user '{user_id}' has unknown role level {level}"),
        })?;

        Ok(Some(Principal {
            id: user_id.clone(),
            realm_id: realm_id.clone(),
            role,
            is_active,
            is_full_member,
        }))
    }
}
