//! `ridebook-auth` — roles, permissions and route access decisions.
//!
//! Pure policy: no HTTP, no session storage. The client crate feeds the
//! current identity in and acts on the decisions that come out.

pub mod authorize;
pub mod checklist;
pub mod claims;
pub mod gate;
pub mod identity;
pub mod permissions;
pub mod roles;

pub use authorize::{AuthzError, authorize, explain_authorization};
pub use checklist::{PermissionChecklist, PermissionError, PermissionRequest};
pub use claims::{IdentityClaims, IdentityError};
pub use gate::{GateDecision, IdentityResolution, LANDING_ROUTE, LOGIN_ROUTE, Redirect, RouteGuard};
pub use identity::Identity;
pub use permissions::{Permission, role_permissions};
pub use roles::Role;
