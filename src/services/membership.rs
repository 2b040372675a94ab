//! Transitive group membership.
//!
//! A user is a member of a group if they are a direct member of it or of any
//! group reachable through subgroup containment edges. The containment graph
//! may contain cycles; traversal keeps a visited set so every group is
//! expanded at most once.

use std::collections::{HashSet, VecDeque};
use std::ops::ControlFlow;
use std::sync::Arc;

use tracing::instrument;

use crate::Result;
use crate::models::{GroupId, UserId};
use crate::storage::GroupStore;

/// Resolves membership through direct members and nested subgroups.
#[derive(Clone)]
pub struct MembershipResolver {
    store: Arc<dyn GroupStore>,
}

impl MembershipResolver {
    /// Creates a resolver reading from the given store.
    #[must_use]
    pub fn new(store: Arc<dyn GroupStore>) -> Self {
        Self { store }
    }

    /// Returns `true` if the user is a member of the group, directly or
    /// through any transitively contained subgroup.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    #[instrument(skip_all, fields(user_id = %user_id, group_id = %group_id))]
    pub fn is_member(&self, user_id: &UserId, group_id: &GroupId) -> Result<bool> {
        let (found, visited) = self.walk(group_id, |current| {
            if self.store.is_direct_member(user_id, current)? {
                Ok(ControlFlow::Break(()))
            } else {
                Ok(ControlFlow::Continue(()))
            }
        })?;

        #[allow(clippy::cast_precision_loss)]
        let visited_count = visited as f64;
        metrics::histogram!("groupgate_membership_groups_visited").record(visited_count);
        tracing::debug!(found, visited, "Membership resolved");

        Ok(found)
    }

    /// Lists every group whose direct members count as members of `group_id`,
    /// in breadth-first order starting with `group_id` itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn reachable_groups(&self, group_id: &GroupId) -> Result<Vec<GroupId>> {
        let mut order = Vec::new();
        self.walk(group_id, |current| {
            order.push(current.clone());
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(order)
    }

    /// Breadth-first walk over containment edges.
    ///
    /// Returns whether `visit` broke out early and how many groups were
    /// examined.
    fn walk<F>(&self, start: &GroupId, mut visit: F) -> Result<(bool, usize)>
    where
        F: FnMut(&GroupId) -> Result<ControlFlow<()>>,
    {
        let mut seen: HashSet<GroupId> = HashSet::from([start.clone()]);
        let mut queue: VecDeque<GroupId> = VecDeque::from([start.clone()]);
        let mut examined = 0;

        while let Some(current) = queue.pop_front() {
            examined += 1;
            if visit(&current)?.is_break() {
                return Ok((true, examined));
            }

            for subgroup in self.store.direct_subgroups(&current)? {
                if seen.insert(subgroup.clone()) {
                    queue.push_back(subgroup);
                }
            }
        }

        Ok((false, examined))
    }
}
