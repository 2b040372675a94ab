//! Group store backends.
//!
//! Realm-scoped storage for groups, direct memberships and subgroup
//! containment edges.
//!
//! # Backends
//!
//! - [`MemoryGroupStore`]: hash maps behind a lock, for tests and embedding
//! - [`SqliteGroupStore`]: `SQLite` database, the default for the CLI
//!
//! # Relations
//!
//! | Relation | Table | Traversed for membership |
//! |----------|-------|--------------------------|
//! | Direct member | `group_direct_members` | yes |
//! | Subgroup containment | `group_subgroups` | yes |
//! | `can_mention_group` capability | `user_groups.can_mention_group_id` | no |

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryGroupStore;
pub use sqlite::SqliteGroupStore;
pub use traits::{GroupStore, GroupStoreAdmin};

use crate::config::GroupGateConfig;
use crate::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// Factory for creating group stores from configuration.
pub struct GroupStoreFactory;

impl GroupStoreFactory {
    /// Creates the store selected by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No database path is configured and none can be derived
    /// - The `SQLite` database cannot be opened
    pub fn from_config(config: &GroupGateConfig) -> Result<Arc<SqliteGroupStore>> {
        let path = config
            .database_path
            .clone()
            .or_else(SqliteGroupStore::default_path)
            .ok_or_else(|| Error::OperationFailed {
                operation: "create_group_store".to_string(),
                cause: "Could not determine database path".to_string(),
            })?;

        Self::create_with_path(path)
    }

    /// Opens a `SQLite` store at an explicit path, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or database cannot be created.
    pub fn create_with_path(path: PathBuf) -> Result<Arc<SqliteGroupStore>> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_group_store_dir".to_string(),
                cause: e.to_string(),
            })?;
        }

        tracing::debug!(path = %path.display(), "Opening group store");
        Ok(Arc::new(SqliteGroupStore::new(path)?))
    }

    /// Creates an in-memory `SQLite` store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn create_in_memory() -> Result<Arc<SqliteGroupStore>> {
        Ok(Arc::new(SqliteGroupStore::in_memory()?))
    }
}
