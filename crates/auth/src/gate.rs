//! Route access gate.
//!
//! Evaluated before a screen mounts. The decision is a value; performing the
//! redirect or showing the loading shell is the router's job.

use crate::{Identity, Permission, Role};

/// Where unauthenticated visitors are sent.
pub const LOGIN_ROUTE: &str = "/login";

/// Default landing route for authenticated or under-privileged visitors.
pub const LANDING_ROUTE: &str = "/";

/// What the session currently knows about the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityResolution<'a> {
    /// Bootstrap "who am I" check still in flight.
    Resolving,
    Anonymous,
    Authenticated(&'a Identity),
}

/// Access requirement attached to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGuard {
    /// Search and booking pages; identity is irrelevant.
    Public,
    /// Login and registration; signed-in visitors are bounced to the landing route.
    GuestOnly,
    /// Any signed-in account.
    Authenticated,
    /// Exactly this role.
    Role(Role),
    /// Any of these roles.
    AnyRole(&'static [Role]),
    /// A specific capability, whatever the role.
    Permission(Permission),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: &'static str,
    /// Path to come back to after signing in.
    pub return_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Render,
    /// Neutral placeholder while the identity is being resolved.
    Loading,
    Redirect(Redirect),
}

impl GateDecision {
    fn to_login(path: &str) -> Self {
        GateDecision::Redirect(Redirect {
            to: LOGIN_ROUTE,
            return_to: Some(path.to_string()),
        })
    }

    fn to_landing() -> Self {
        GateDecision::Redirect(Redirect {
            to: LANDING_ROUTE,
            return_to: None,
        })
    }

    pub fn is_render(&self) -> bool {
        matches!(self, GateDecision::Render)
    }
}

impl RouteGuard {
    /// Decide whether the visitor may render the route at `path`.
    pub fn check(&self, resolution: IdentityResolution<'_>, path: &str) -> GateDecision {
        let decision = match (self, resolution) {
            (RouteGuard::Public, _) => GateDecision::Render,
            (_, IdentityResolution::Resolving) => GateDecision::Loading,

            (RouteGuard::GuestOnly, IdentityResolution::Anonymous) => GateDecision::Render,
            (RouteGuard::GuestOnly, IdentityResolution::Authenticated(_)) => {
                GateDecision::to_landing()
            }

            (_, IdentityResolution::Anonymous) => GateDecision::to_login(path),

            (RouteGuard::Authenticated, IdentityResolution::Authenticated(_)) => {
                GateDecision::Render
            }
            (RouteGuard::Role(required), IdentityResolution::Authenticated(id)) => {
                allow_if(id.role == *required)
            }
            (RouteGuard::AnyRole(roles), IdentityResolution::Authenticated(id)) => {
                allow_if(roles.contains(&id.role))
            }
            (RouteGuard::Permission(p), IdentityResolution::Authenticated(id)) => {
                allow_if(id.can(*p))
            }
        };

        if let GateDecision::Redirect(r) = &decision {
            tracing::debug!(path, guard = ?self, to = r.to, "route access redirected");
        }
        decision
    }
}

fn allow_if(allowed: bool) -> GateDecision {
    if allowed {
        GateDecision::Render
    } else {
        GateDecision::to_landing()
    }
}

#[cfg(test)]
mod tests {
    use ridebook_core::UserId;

    use super::*;

    fn identity(role: Role) -> Identity {
        Identity::from_role(UserId::from(7), role)
    }

    const STAFF: &[Role] = &[Role::Admin, Role::Officer];

    #[test]
    fn anonymous_visitors_go_to_login_with_return_path() {
        for guard in [
            RouteGuard::Authenticated,
            RouteGuard::Role(Role::Admin),
            RouteGuard::AnyRole(STAFF),
            RouteGuard::Permission(Permission::CreateBookings),
        ] {
            assert_eq!(
                guard.check(IdentityResolution::Anonymous, "/admin/rides"),
                GateDecision::Redirect(Redirect {
                    to: LOGIN_ROUTE,
                    return_to: Some("/admin/rides".to_string()),
                })
            );
        }
    }

    #[test]
    fn resolving_identity_never_redirects() {
        for guard in [
            RouteGuard::GuestOnly,
            RouteGuard::Authenticated,
            RouteGuard::Role(Role::Admin),
            RouteGuard::Permission(Permission::ManageUsers),
        ] {
            assert_eq!(
                guard.check(IdentityResolution::Resolving, "/anything"),
                GateDecision::Loading
            );
        }
        assert!(RouteGuard::Public.check(IdentityResolution::Resolving, "/").is_render());
    }

    #[test]
    fn signed_in_visitors_are_kept_off_login() {
        let user = identity(Role::User);
        assert_eq!(
            RouteGuard::GuestOnly.check(IdentityResolution::Authenticated(&user), LOGIN_ROUTE),
            GateDecision::Redirect(Redirect {
                to: LANDING_ROUTE,
                return_to: None
            })
        );
        assert!(RouteGuard::GuestOnly.check(IdentityResolution::Anonymous, "/register").is_render());
    }

    #[test]
    fn role_mismatch_goes_to_landing() {
        let user = identity(Role::User);
        let admin = identity(Role::Admin);
        let officer = identity(Role::Officer);

        let admin_only = RouteGuard::Role(Role::Admin);
        assert_eq!(
            admin_only.check(IdentityResolution::Authenticated(&user), "/admin"),
            GateDecision::to_landing()
        );
        assert!(admin_only.check(IdentityResolution::Authenticated(&admin), "/admin").is_render());
        assert!(!admin_only
            .check(IdentityResolution::Authenticated(&officer), "/admin")
            .is_render());

        let staff = RouteGuard::AnyRole(STAFF);
        assert!(staff.check(IdentityResolution::Authenticated(&officer), "/admin").is_render());
    }

    #[test]
    fn permission_guard_honours_overrides() {
        let guard = RouteGuard::Permission(Permission::ViewReports);
        let booker = identity(Role::Booker);
        assert!(!guard.check(IdentityResolution::Authenticated(&booker), "/reports").is_render());

        let promoted = booker.with_overrides([Permission::ViewReports]);
        assert!(guard.check(IdentityResolution::Authenticated(&promoted), "/reports").is_render());
    }
}
