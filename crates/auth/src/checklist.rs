//! Permission checklist behind the create/edit-user form.
//!
//! Selecting a role resets the checklist to that role's baseline. Ticking a
//! permission outside the baseline is refused unless it is granted as an
//! explicit override, so a role never silently carries extra grants.

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use crate::permissions::baseline;
use crate::{Permission, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("{permission} is not part of the {role} baseline; grant it as an explicit override")]
    RequiresOverride { role: Role, permission: Permission },

    #[error("role {role} cannot be granted {permission}")]
    NotAssignable { role: Role, permission: Permission },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionChecklist {
    role: Role,
    selected: BTreeSet<Permission>,
    overrides: BTreeSet<Permission>,
}

impl PermissionChecklist {
    pub fn for_role(role: Role) -> Self {
        Self {
            role,
            selected: baseline(role),
            overrides: BTreeSet::new(),
        }
    }

    /// Switch role. Previous selections and overrides are discarded.
    pub fn select_role(&mut self, role: Role) {
        *self = Self::for_role(role);
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn selected(&self) -> &BTreeSet<Permission> {
        &self.selected
    }

    pub fn overrides(&self) -> &BTreeSet<Permission> {
        &self.overrides
    }

    pub fn is_checked(&self, permission: Permission) -> bool {
        self.selected.contains(&permission)
    }

    /// Flip a checkbox.
    ///
    /// Unticking always succeeds. Re-ticking is only allowed for baseline
    /// permissions; anything else must go through [`grant_override`](Self::grant_override).
    pub fn toggle(&mut self, permission: Permission) -> Result<bool, PermissionError> {
        if self.selected.remove(&permission) {
            self.overrides.remove(&permission);
            return Ok(false);
        }
        if baseline(self.role).contains(&permission) {
            self.selected.insert(permission);
            return Ok(true);
        }
        Err(PermissionError::RequiresOverride {
            role: self.role,
            permission,
        })
    }

    /// Explicitly grant a permission beyond the role's baseline.
    pub fn grant_override(&mut self, permission: Permission) -> Result<(), PermissionError> {
        if baseline(self.role).contains(&permission) {
            self.selected.insert(permission);
            return Ok(());
        }
        if !self.role.accepts_overrides() {
            return Err(PermissionError::NotAssignable {
                role: self.role,
                permission,
            });
        }
        tracing::info!(role = %self.role, %permission, "permission override granted");
        self.selected.insert(permission);
        self.overrides.insert(permission);
        Ok(())
    }

    /// Build the payload for the user-create / role-update endpoints.
    pub fn to_request(&self) -> PermissionRequest {
        PermissionRequest {
            role: self.role,
            permissions: self.selected.clone(),
            overrides: self.overrides.clone(),
        }
    }
}

/// Role and permission set submitted for an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionRequest {
    pub role: Role,
    pub permissions: BTreeSet<Permission>,
    /// Declared grants outside the baseline; not sent to the backend.
    #[serde(skip)]
    pub overrides: BTreeSet<Permission>,
}

impl PermissionRequest {
    /// A request is valid when every permission is in the role's baseline or
    /// is a declared override the role may carry.
    pub fn validate(&self) -> Result<(), PermissionError> {
        let base = baseline(self.role);
        for permission in &self.permissions {
            if base.contains(permission) {
                continue;
            }
            if !self.overrides.contains(permission) {
                return Err(PermissionError::RequiresOverride {
                    role: self.role,
                    permission: *permission,
                });
            }
            if !self.role.accepts_overrides() {
                return Err(PermissionError::NotAssignable {
                    role: self.role,
                    permission: *permission,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn booker_defaults_to_create_bookings_only() {
        let checklist = PermissionChecklist::for_role(Role::Booker);
        assert_eq!(
            checklist.selected(),
            &BTreeSet::from([Permission::CreateBookings])
        );
        assert!(checklist.overrides().is_empty());
    }

    #[test]
    fn unrelated_permission_needs_explicit_override() {
        let mut checklist = PermissionChecklist::for_role(Role::Booker);

        assert_eq!(
            checklist.toggle(Permission::ManageUsers),
            Err(PermissionError::RequiresOverride {
                role: Role::Booker,
                permission: Permission::ManageUsers
            })
        );
        assert!(!checklist.is_checked(Permission::ManageUsers));

        checklist.grant_override(Permission::ManageUsers).unwrap();
        assert!(checklist.is_checked(Permission::ManageUsers));

        let request = checklist.to_request();
        assert!(request.validate().is_ok());
        assert_eq!(request.overrides, BTreeSet::from([Permission::ManageUsers]));

        // Unticking an override drops it entirely.
        assert_eq!(checklist.toggle(Permission::ManageUsers), Ok(false));
        assert!(checklist.overrides().is_empty());
    }

    #[test]
    fn customer_role_takes_no_overrides() {
        let mut checklist = PermissionChecklist::for_role(Role::User);
        assert_eq!(
            checklist.grant_override(Permission::CreateBookings),
            Err(PermissionError::NotAssignable {
                role: Role::User,
                permission: Permission::CreateBookings
            })
        );
    }

    #[test]
    fn switching_role_resets_selection() {
        let mut checklist = PermissionChecklist::for_role(Role::Officer);
        checklist.grant_override(Permission::ManageUsers).unwrap();
        checklist.select_role(Role::Booker);
        assert_eq!(checklist, PermissionChecklist::for_role(Role::Booker));
    }

    #[test]
    fn undeclared_extra_permission_is_rejected() {
        let request = PermissionRequest {
            role: Role::Booker,
            permissions: BTreeSet::from([Permission::CreateBookings, Permission::ManageUsers]),
            overrides: BTreeSet::new(),
        };
        assert!(matches!(
            request.validate(),
            Err(PermissionError::RequiresOverride { .. })
        ));
    }

    #[test]
    fn request_serializes_role_and_permissions_only() {
        let request = PermissionChecklist::for_role(Role::Booker).to_request();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "role": "BOOKER", "permissions": ["CREATE_BOOKINGS"] })
        );
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    fn any_permission() -> impl Strategy<Value = Permission> {
        prop::sample::select(Permission::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn toggling_alone_never_exceeds_baseline(
            role in any_role(),
            toggles in prop::collection::vec(any_permission(), 0..40),
        ) {
            let mut checklist = PermissionChecklist::for_role(role);
            for p in toggles {
                let _ = checklist.toggle(p);
            }
            prop_assert!(checklist.selected().is_subset(&baseline(role)));
            prop_assert!(checklist.to_request().validate().is_ok());
        }
    }
}
