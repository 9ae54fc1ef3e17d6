use serde::Serialize;
use thiserror::Error;

use crate::permissions::role_permissions;
use crate::{Identity, Permission, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("not signed in")]
    Anonymous,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(Permission),
}

/// Check a single permission for an optional identity.
///
/// - No IO
/// - No panics
pub fn authorize(identity: Option<&Identity>, required: Permission) -> Result<(), AuthzError> {
    let identity = identity.ok_or(AuthzError::Anonymous)?;
    if identity.can(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required))
    }
}

/// Why a permission check came out the way it did.
///
/// Rendered by the admin screens next to disabled actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationExplanation {
    pub required_permission: Permission,
    pub granted: bool,
    pub reason: String,
    /// Roles whose baseline would grant the permission.
    pub granting_roles: Vec<Role>,
}

/// Explain an authorization decision for `identity`.
pub fn explain_authorization(
    identity: Option<&Identity>,
    required: Permission,
) -> AuthorizationExplanation {
    let granting_roles: Vec<Role> = Role::ALL
        .into_iter()
        .filter(|r| role_permissions(*r).contains(&required))
        .collect();

    let (granted, reason) = match identity {
        None => (false, "Not signed in".to_string()),
        Some(id) if id.can(required) => {
            if role_permissions(id.role).contains(&required) {
                (true, format!("Role {} grants '{}'", id.role, required))
            } else {
                (true, format!("'{}' was granted explicitly to this account", required))
            }
        }
        Some(id) => (
            false,
            format!("Role {} does not grant '{}' and no override exists", id.role, required),
        ),
    };

    AuthorizationExplanation {
        required_permission: required,
        granted,
        reason,
        granting_roles,
    }
}
