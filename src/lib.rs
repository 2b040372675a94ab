//! # Groupgate
//!
//! Subscribers-group authorization checks for streams.
//!
//! Given a proposed subscribers group, the stream it would apply to, the
//! request parameters, and the acting user, groupgate decides whether the
//! user may assign that group. Two permission models sit behind the single
//! [`SubscribersGroupValidator::validate`] entry point:
//!
//! - **System groups** (`role:administrators`, `role:members`, ...) are
//!   checked against the acting user's role level.
//! - **Custom groups** are checked by membership: direct membership or
//!   membership of any transitively contained subgroup.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use groupgate::{GroupRef, Principal, RequestParams, Stream, SubscribersGroupValidator};
//! use groupgate::storage::MemoryGroupStore;
//!
//! let store = Arc::new(MemoryGroupStore::new());
//! let validator = SubscribersGroupValidator::new(store);
//! let group = validator.validate(GroupRef::from("engineering"), &stream, &RequestParams::new(), &user)?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cli;
pub mod config;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::GroupGateConfig;
pub use models::{
    Group, GroupId, GroupRef, Principal, RealmId, RequestParams, Stream, SystemRoleTag, UserId,
    UserRole,
};
pub use services::{MembershipResolver, SubscribersGroupValidator, SystemGroupPolicy};
pub use storage::{GroupStore, GroupStoreAdmin, MemoryGroupStore, SqliteGroupStore};

/// Error type for groupgate store and configuration operations.
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Malformed identifiers, unknown users, duplicate system groups |
/// | `OperationFailed` | `SQLite` queries fail, lock poisoning, config I/O |
/// | `PolicyConfiguration` | Unknown role tag, role tag requested for a custom group |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` database operations fail
    /// - A store lock is poisoned
    /// - The configuration file cannot be read or parsed
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Internal invariant violation in the group policy data.
    ///
    /// Never expected in a correct deployment. Callers must not map this onto
    /// a user-facing denial.
    #[error("policy configuration error: {0}")]
    PolicyConfiguration(String),
}

/// Result type alias for groupgate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of a failed subscribers-group validation.
///
/// Only [`InvalidGroupConfiguration`](Self::InvalidGroupConfiguration) and
/// [`InsufficientPermission`](Self::InsufficientPermission) are part of the
/// stable, user-facing taxonomy. The remaining variants are fatal and carry the
/// underlying cause unchanged.
#[derive(Debug, ThisError)]
pub enum ValidationError {
    /// The group reference does not resolve inside the acting user's realm.
    #[error("Invalid group configuration")]
    InvalidGroupConfiguration,

    /// The group resolved but the acting user may not assign it.
    #[error("Insufficient permission")]
    InsufficientPermission,

    /// A system group carried a role tag the policy does not know.
    #[error("policy configuration error: {0}")]
    PolicyConfiguration(String),

    /// The group store failed.
    #[error(transparent)]
    Store(Error),
}

impl ValidationError {
    /// Returns `true` for the two stable, user-facing failures.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::InvalidGroupConfiguration | Self::InsufficientPermission
        )
    }

    /// Short label used for metrics and structured logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidGroupConfiguration => "invalid_group",
            Self::InsufficientPermission => "insufficient_permission",
            Self::PolicyConfiguration(_) => "policy_error",
            Self::Store(_) => "store_error",
        }
    }
}

impl From<Error> for ValidationError {
    fn from(err: Error) -> Self {
        match err {
            Error::PolicyConfiguration(reason) => Self::PolicyConfiguration(reason),
            other => Self::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("test error".to_string());
        assert_eq!(err.to_string(), "invalid input: test error");

        let err = Error::OperationFailed {
            operation: "get_group".to_string(),
            cause: "disk I/O error".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'get_group' failed: disk I/O error");
    }

    #[test]
    fn test_validation_error_messages_are_stable() {
        assert_eq!(
            ValidationError::InvalidGroupConfiguration.to_string(),
            "Invalid group configuration"
        );
        assert_eq!(
            ValidationError::InsufficientPermission.to_string(),
            "Insufficient permission"
        );
    }

    #[test]
    fn test_policy_error_is_not_user_facing() {
        let err = ValidationError::from(Error::PolicyConfiguration("role:bogus".to_string()));
        assert!(matches!(err, ValidationError::PolicyConfiguration(_)));
        assert!(!err.is_user_facing());
        assert_eq!(err.kind(), "policy_error");
    }

    #[test]
    fn test_store_error_passes_through() {
        let err = ValidationError::from(Error::OperationFailed {
            operation: "direct_subgroups".to_string(),
            cause: "locked".to_string(),
        });
        assert!(matches!(err, ValidationError::Store(_)));
        assert!(!err.is_user_facing());
        assert_eq!(err.to_string(), "operation 'direct_subgroups' failed: locked");
    }
}
