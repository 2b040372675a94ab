//! Subscribers-group validation.
//!
//! Decides whether an acting user may assign a group as the subscribers group
//! of a stream.
//!
//! # Decision
//!
//! | Group | Allowed when |
//! |-------|--------------|
//! | Unknown in the user's realm | never, `InvalidGroupConfiguration` |
//! | System group | the user satisfies the group's role tag |
//! | Custom group | the user is a direct or nested member |
//!
//! Denials are reported as `InsufficientPermission`. The stream and request
//! parameters are carried on the tracing span but do not change the outcome.

use std::sync::Arc;
use std::time::Instant;

use tracing::instrument;

use crate::models::{Group, GroupRef, Principal, RequestParams, Stream};
use crate::services::{MembershipResolver, SystemGroupPolicy};
use crate::storage::GroupStore;
use crate::ValidationError;

/// Validates proposed subscribers groups.
///
/// Holds no mutable state; a single instance can serve concurrent requests.
#[derive(Clone)]
pub struct SubscribersGroupValidator {
    store: Arc<dyn GroupStore>,
    membership: MembershipResolver,
    policy: SystemGroupPolicy,
}

impl SubscribersGroupValidator {
    /// Creates a validator reading from the given store.
    #[must_use]
    pub fn new(store: Arc<dyn GroupStore>) -> Self {
        Self {
            membership: MembershipResolver::new(Arc::clone(&store)),
            store,
            policy: SystemGroupPolicy::new(),
        }
    }

    /// Checks that `acting_user` may assign `group_ref` as the subscribers
    /// group of `stream`, returning the resolved group.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::InvalidGroupConfiguration`] if the reference does
    ///   not resolve within the acting user's realm
    /// - [`ValidationError::InsufficientPermission`] if the user does not hold
    ///   the system group's role or is not a member of the custom group
    /// - [`ValidationError::PolicyConfiguration`] if a system group carries an
    ///   unknown role tag
    /// - [`ValidationError::Store`] if the group store fails
    #[instrument(
        skip_all,
        fields(
            stream_id = stream.id,
            realm_id = %acting_user.realm_id,
            user_id = %acting_user.id,
            params = params.len(),
        )
    )]
    pub fn validate(
        &self,
        group_ref: impl Into<GroupRef>,
        stream: &Stream,
        params: &RequestParams,
        acting_user: &Principal,
    ) -> Result<Group, ValidationError> {
        let start = Instant::now();
        let outcome = self.decide(group_ref.into(), acting_user);

        let label = match &outcome {
            Ok(_) => "granted",
            Err(err) => err.kind(),
        };
        metrics::counter!("groupgate_validations_total", "outcome" => label).increment(1);
        metrics::histogram!("groupgate_validation_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);

        match &outcome {
            Ok(group) => tracing::debug!(group_id = %group.id, "Subscribers group accepted"),
            Err(err) if err.is_user_facing() => {
                tracing::debug!(outcome = label, "Subscribers group rejected");
            },
            Err(err) => tracing::error!(error = %err, "Subscribers group validation failed"),
        }

        outcome
    }

    fn decide(&self, group_ref: GroupRef, acting_user: &Principal) -> Result<Group, ValidationError> {
        let Some(group) = self.store.resolve(group_ref, &acting_user.realm_id)? else {
            return Err(ValidationError::InvalidGroupConfiguration);
        };

        let permitted = if group.is_system_group {
            let tag = self.store.system_role_tag(&group)?;
            self.policy.principal_satisfies(tag, acting_user)
        } else {
            self.membership.is_member(&acting_user.id, &group.id)?
        };

        if permitted {
            Ok(group)
        } else {
            Err(ValidationError::InsufficientPermission)
        }
    }
}
