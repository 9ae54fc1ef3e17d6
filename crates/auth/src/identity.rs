use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use ridebook_core::UserId;

use crate::permissions::baseline;
use crate::{Permission, Role};

/// Resolved identity of the signed-in account.
///
/// Permissions always derive from the role's baseline, narrowed or extended
/// only by explicit choices made in the administrative flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub role: Role,
    pub permissions: BTreeSet<Permission>,
}

impl Identity {
    /// Identity carrying exactly the role's baseline permissions.
    pub fn from_role(id: UserId, role: Role) -> Self {
        Self {
            id,
            role,
            permissions: baseline(role),
        }
    }

    /// Add explicit per-user grants on top of the baseline.
    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions.extend(overrides);
        self
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Grants held beyond the role's baseline.
    pub fn overrides(&self) -> BTreeSet<Permission> {
        self.permissions.difference(&baseline(self.role)).copied().collect()
    }
}
