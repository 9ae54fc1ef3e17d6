use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Role;

/// Fine-grained action grant.
///
/// Serialized with the backend's `SCREAMING_SNAKE_CASE` names, which are also
/// what the role-update endpoint expects.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    /// Open the staff dashboard.
    ViewDashboard,
    /// Create accounts and change their role or grants.
    ManageUsers,
    ManageDrivers,
    ManageVehicles,
    ManageRoutes,
    /// Create, edit and cancel rides.
    ManageRides,
    ManageSchedules,
    /// See and change any booking, not just one's own.
    ManageBookings,
    /// Book seats on behalf of passengers at the counter.
    CreateBookings,
    ViewReports,
}

impl Permission {
    /// Every permission, in declaration order.
    pub const ALL: [Permission; 10] = [
        Permission::ViewDashboard,
        Permission::ManageUsers,
        Permission::ManageDrivers,
        Permission::ManageVehicles,
        Permission::ManageRoutes,
        Permission::ManageRides,
        Permission::ManageSchedules,
        Permission::ManageBookings,
        Permission::CreateBookings,
        Permission::ViewReports,
    ];

    /// Wire name, as the backend spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewDashboard => "VIEW_DASHBOARD",
            Permission::ManageUsers => "MANAGE_USERS",
            Permission::ManageDrivers => "MANAGE_DRIVERS",
            Permission::ManageVehicles => "MANAGE_VEHICLES",
            Permission::ManageRoutes => "MANAGE_ROUTES",
            Permission::ManageRides => "MANAGE_RIDES",
            Permission::ManageSchedules => "MANAGE_SCHEDULES",
            Permission::ManageBookings => "MANAGE_BOOKINGS",
            Permission::CreateBookings => "CREATE_BOOKINGS",
            Permission::ViewReports => "VIEW_REPORTS",
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown permission '{s}'"))
    }
}

const ADMIN_PERMISSIONS: &[Permission] = &Permission::ALL;

const OFFICER_PERMISSIONS: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ManageDrivers,
    Permission::ManageVehicles,
    Permission::ManageRoutes,
    Permission::ManageRides,
    Permission::ManageSchedules,
    Permission::ManageBookings,
    Permission::ViewReports,
];

const BOOKER_PERMISSIONS: &[Permission] = &[Permission::CreateBookings];

const USER_PERMISSIONS: &[Permission] = &[];

/// The authoritative role → permission table.
///
/// Gating, identity derivation and the role-update payload all read from here.
pub fn role_permissions(role: Role) -> &'static [Permission] {
    match role {
        Role::Admin => ADMIN_PERMISSIONS,
        Role::Officer => OFFICER_PERMISSIONS,
        Role::Booker => BOOKER_PERMISSIONS,
        Role::User => USER_PERMISSIONS,
    }
}

/// Baseline permission set of a role.
pub fn baseline(role: Role) -> BTreeSet<Permission> {
    role_permissions(role).iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for p in Permission::ALL {
            assert_eq!(p.as_str().parse::<Permission>().unwrap(), p);
            assert_eq!(serde_json::to_value(p).unwrap(), p.as_str());
        }
        assert!("MANAGE_EVERYTHING".parse::<Permission>().is_err());
    }

    #[test]
    fn table_matches_role_hierarchy() {
        assert_eq!(baseline(Role::Admin).len(), Permission::ALL.len());
        assert_eq!(baseline(Role::Booker), BTreeSet::from([Permission::CreateBookings]));
        assert!(baseline(Role::User).is_empty());

        let officer = baseline(Role::Officer);
        assert!(!officer.contains(&Permission::ManageUsers));
        assert!(officer.is_subset(&baseline(Role::Admin)));
    }
}
