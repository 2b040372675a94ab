//! Storage layer.
//!
//! The subscribers-group check reads groups through the [`GroupStore`] trait.
//! Production deployments plug in their own store; the crate ships an
//! in-memory and a `SQLite` backend.

// Allow significant_drop_tightening - holding the connection guard for the
// whole method keeps each store call a single critical section.
#![allow(clippy::significant_drop_tightening)]

pub mod group;

pub use group::{GroupStore, GroupStoreAdmin, GroupStoreFactory, MemoryGroupStore, SqliteGroupStore};
