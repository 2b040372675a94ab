//! Data models for groupgate.
//!
//! Groups, users, realms and streams as seen by the subscribers-group check.
//! All of them are read-only from the validator's point of view.

pub mod group;
mod principal;
mod realm;
mod stream;

pub use group::{Group, GroupId, GroupRef, SYSTEM_GROUP_PREFIX, SystemRoleTag};
pub use principal::{Principal, UserId, UserRole};
pub use realm::RealmId;
pub use stream::{RequestParams, Stream};
