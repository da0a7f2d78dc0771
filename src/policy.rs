// src/policy.rs - Authorization decisions
//!
//! Every mutating ledger operation asks [`authorize`] before touching the
//! store. The function is pure: the same identity, resource, action and owner
//! always produce the same decision.

use crate::auth::Identity;
use crate::error::{ApiError, ApiResult};
use crate::models::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Chemical,
    Experiment,
    SafetyProtocol,
    User,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Chemical => "chemical",
            Resource::Experiment => "experiment",
            Resource::SafetyProtocol => "safety protocol",
            Resource::User => "user",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(String),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> ApiResult<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(ApiError::Forbidden(reason)),
        }
    }
}

fn deny(role: UserRole, resource: Resource, action: Action) -> Decision {
    Decision::Deny(format!(
        "Role '{}' may not {} {} records",
        role.as_str(),
        action.as_str(),
        resource.as_str()
    ))
}

/// `owner_id` is only consulted for experiments.
pub fn authorize(identity: &Identity, resource: Resource, action: Action, owner_id: Option<&str>) -> Decision {
    let role = identity.role;

    if role.is_admin() || action == Action::View {
        return Decision::Allow;
    }

    let allowed = match (resource, action) {
        (Resource::Chemical, Action::Create | Action::Edit) => true,
        (Resource::Chemical, Action::Delete) => false,
        (Resource::SafetyProtocol, _) => false,
        (Resource::Experiment, Action::Create) => true,
        (Resource::Experiment, Action::Edit | Action::Delete) => {
            owner_id.map(|owner| owner == identity.user_id).unwrap_or(false)
        }
        (Resource::User, _) => false,
        (_, Action::View) => true,
    };

    if allowed {
        Decision::Allow
    } else if resource == Resource::Experiment {
        Decision::Deny("Only the owner or an administrator may modify this experiment".to_string())
    } else {
        deny(role, resource, action)
    }
}
