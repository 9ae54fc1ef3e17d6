use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ridebook_core::UserId;

use crate::permissions::baseline;
use crate::{Identity, Permission, Role};

/// User payload as the backend sends it (login, refresh, OAuth callback).
///
/// Role and permissions arrive as raw strings and only become typed through
/// [`IdentityClaims::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaims {
    #[serde(alias = "_id", alias = "userId")]
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub role: String,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("malformed identity payload: {0}")]
    Malformed(String),

    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("unknown permission '{0}'")]
    UnknownPermission(String),

    #[error("role {role} cannot carry permission {permission}")]
    OverrideNotAllowed { role: Role, permission: Permission },
}

impl IdentityClaims {
    /// Decode a JSON user blob.
    pub fn from_json(raw: &str) -> Result<Self, IdentityError> {
        serde_json::from_str(raw).map_err(|e| IdentityError::Malformed(e.to_string()))
    }

    /// Turn the payload into a trusted [`Identity`].
    ///
    /// - Unknown roles or permission names are rejected, never dropped.
    /// - A missing permission list means the role's baseline.
    /// - Grants outside the baseline are only accepted for roles that take overrides.
    pub fn validate(&self) -> Result<Identity, IdentityError> {
        let role: Role = self
            .role
            .parse()
            .map_err(|_| IdentityError::UnknownRole(self.role.clone()))?;

        let Some(raw) = &self.permissions else {
            return Ok(Identity::from_role(self.id.clone(), role));
        };

        let mut permissions = BTreeSet::new();
        for name in raw {
            let permission: Permission = name
                .parse()
                .map_err(|_| IdentityError::UnknownPermission(name.clone()))?;
            permissions.insert(permission);
        }

        let base = baseline(role);
        if !role.accepts_overrides() {
            if let Some(extra) = permissions.difference(&base).next() {
                return Err(IdentityError::OverrideNotAllowed {
                    role,
                    permission: *extra,
                });
            }
        }

        Ok(Identity {
            id: self.id.clone(),
            role,
            permissions,
        })
    }
}
