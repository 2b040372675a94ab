//! Validate CLI command.

use std::sync::Arc;

use serde_json::json;

use super::{CommandOutput, require_user, resolve_group_arg};
use crate::models::{RealmId, RequestParams, Stream, UserId};
use crate::services::SubscribersGroupValidator;
use crate::storage::GroupStoreAdmin;
use crate::{Error, Result, ValidationError};

/// Arguments of a `validate` invocation.
#[derive(Debug, Clone)]
pub struct ValidateRequest {
    /// Realm of the acting user.
    pub realm: RealmId,
    /// Acting user.
    pub user: UserId,
    /// Group id or `role:<tag>`.
    pub group: String,
    /// Stream name.
    pub stream: String,
    /// Raw `key=value` request parameters.
    pub params: Vec<String>,
    /// Emit JSON instead of text.
    pub json: bool,
}

/// Validate command handler.
pub struct ValidateCommand<S> {
    store: Arc<S>,
    validator: SubscribersGroupValidator,
}

impl<S: GroupStoreAdmin + 'static> ValidateCommand<S> {
    /// Creates a new validate command over `store`.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        let validator = SubscribersGroupValidator::new(store.clone());
        Self { store, validator }
    }

    /// Runs the validation.
    ///
    /// User-facing rejections are reported as [`super::CommandStatus::Denied`];
    /// policy and store failures are returned as errors.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed parameters, unknown users, policy
    /// misconfiguration, or store failures.
    pub fn run(&self, request: &ValidateRequest) -> Result<CommandOutput> {
        let params = request
            .params
            .iter()
            .map(|pair| RequestParams::parse_pair(pair))
            .collect::<Result<RequestParams>>()?;
        let user = require_user(self.store.as_ref(), &request.realm, &request.user)?;
        let group_ref = resolve_group_arg(self.store.as_ref(), &request.realm, &request.group)?;
        let stream = Stream::new(0, request.realm.clone(), request.stream.clone());

        match self.validator.validate(group_ref, &stream, &params, &user) {
            Ok(group) => {
                let text = if request.json {
                    json!({ "allowed": true, "group": group }).to_string()
                } else {
                    format!("allowed: {} ({})", group.name, group.id)
                };
                Ok(CommandOutput::success(text))
            },
            Err(err) if err.is_user_facing() => {
                let text = if request.json {
                    json!({
                        "allowed": false,
                        "error": err.kind(),
                        "message": err.to_string(),
                    })
                    .to_string()
                } else {
                    format!("denied: {err}")
                };
                Ok(CommandOutput::denied(text))
            },
            Err(ValidationError::PolicyConfiguration(reason)) => {
                Err(Error::PolicyConfiguration(reason))
            },
            Err(ValidationError::Store(err)) => Err(err),
            Err(err) => Err(Error::OperationFailed {
                operation: "validate".to_string(),
                cause: err.to_string(),
            }),
        }
    }
}
