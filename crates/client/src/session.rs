//! Session store: the single source of truth for who is signed in.
//!
//! One store per client, passed around as a cheap clonable handle. Fields are
//! only changed through the transition methods below; every wholesale
//! replacement bumps a generation counter so in-flight work can tell whether
//! the session it started under is still current.

use std::sync::{Arc, PoisonError, RwLock};

use ridebook_auth::{GateDecision, Identity, IdentityResolution, RouteGuard};

/// Bearer credential handed out by the backend.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    identity: Option<Identity>,
    access_token: Option<AccessToken>,
}

impl Session {
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

/// Whether the bootstrap "who am I" check has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Resolving,
    Resolved,
}

#[derive(Debug)]
struct SessionState {
    session: Session,
    phase: SessionPhase,
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<SessionState>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// A fresh store, still resolving its identity.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SessionState {
                session: Session::default(),
                phase: SessionPhase::Resolving,
                generation: 0,
            })),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn snapshot(&self) -> Session {
        self.read(|s| s.session.clone())
    }

    pub fn identity(&self) -> Option<Identity> {
        self.read(|s| s.session.identity.clone())
    }

    pub fn access_token(&self) -> Option<AccessToken> {
        self.read(|s| s.session.access_token.clone())
    }

    pub fn phase(&self) -> SessionPhase {
        self.read(|s| s.phase)
    }

    pub fn generation(&self) -> u64 {
        self.read(|s| s.generation)
    }

    /// Run the access gate against the current session.
    pub fn check(&self, guard: RouteGuard, path: &str) -> GateDecision {
        self.read(|s| {
            let resolution = match (s.phase, &s.session.identity) {
                (SessionPhase::Resolving, _) => IdentityResolution::Resolving,
                (SessionPhase::Resolved, None) => IdentityResolution::Anonymous,
                (SessionPhase::Resolved, Some(identity)) => IdentityResolution::Authenticated(identity),
            };
            guard.check(resolution, path)
        })
    }

    /// Mark the bootstrap identity check as started.
    pub fn begin_resolution(&self) {
        self.write(|s| s.phase = SessionPhase::Resolving);
    }

    /// Login or OAuth callback: install a new session.
    pub fn establish(&self, identity: Identity, token: AccessToken) {
        let generation = self.write(|s| {
            s.session = Session {
                identity: Some(identity),
                access_token: Some(token),
            };
            s.phase = SessionPhase::Resolved;
            s.generation += 1;
            s.generation
        });
        tracing::info!(generation, "session established");
    }

    /// Refresh: replace the session wholesale, keeping the previous identity
    /// when the backend did not send a new one.
    ///
    /// The phase is left as is: a refresh during the bootstrap check does not
    /// end resolution, only `establish` or `clear` does.
    ///
    /// Ignored (returns `false`) when the session changed since `expected`,
    /// e.g. a logout raced the refresh.
    pub fn replace(&self, expected: u64, token: AccessToken, identity: Option<Identity>) -> bool {
        let replaced = self.write(|s| {
            if s.generation != expected {
                return None;
            }
            let identity = identity.or_else(|| s.session.identity.take());
            s.session = Session {
                identity,
                access_token: Some(token),
            };
            s.generation += 1;
            Some(s.generation)
        });

        match replaced {
            Some(generation) => {
                tracing::info!(generation, "session refreshed");
                true
            }
            None => {
                tracing::warn!(expected, "session changed during refresh; result dropped");
                false
            }
        }
    }

    /// Logout or irrecoverable auth failure.
    pub fn clear(&self) {
        let (generation, was_authenticated) = self.write(|s| {
            let was_authenticated = s.session.is_authenticated();
            s.session = Session::default();
            s.phase = SessionPhase::Resolved;
            s.generation += 1;
            (s.generation, was_authenticated)
        });
        tracing::info!(generation, was_authenticated, "session cleared");
    }
}

#[cfg(test)]
mod tests {
    use ridebook_auth::{LANDING_ROUTE, LOGIN_ROUTE, Redirect, Role};
    use ridebook_core::UserId;

    use super::*;

    fn token(s: &str) -> AccessToken {
        AccessToken::new(s).unwrap()
    }

    #[test]
    fn token_debug_is_redacted() {
        assert_eq!(format!("{:?}", token("secret")), "AccessToken(..)");
        assert!(AccessToken::new("  ").is_none());
    }

    #[test]
    fn gate_waits_while_resolving() {
        let store = SessionStore::new();
        assert_eq!(
            store.check(RouteGuard::Authenticated, "/account"),
            GateDecision::Loading
        );

        store.clear();
        assert_eq!(
            store.check(RouteGuard::Authenticated, "/account"),
            GateDecision::Redirect(Redirect {
                to: LOGIN_ROUTE,
                return_to: Some("/account".to_string())
            })
        );
    }

    #[test]
    fn user_role_is_bounced_from_admin_routes() {
        let store = SessionStore::new();
        store.establish(Identity::from_role(UserId::from(1), Role::User), token("t1"));

        assert_eq!(
            store.check(RouteGuard::Role(Role::Admin), "/admin"),
            GateDecision::Redirect(Redirect {
                to: LANDING_ROUTE,
                return_to: None
            })
        );
        assert!(store.check(RouteGuard::Authenticated, "/account").is_render());
    }

    #[test]
    fn replace_keeps_identity_and_bumps_generation() {
        let store = SessionStore::new();
        let identity = Identity::from_role(UserId::from(1), Role::Officer);
        store.establish(identity.clone(), token("t1"));
        let g = store.generation();

        assert!(store.replace(g, token("t2"), None));
        assert_eq!(store.identity(), Some(identity));
        assert_eq!(store.access_token(), Some(token("t2")));
        assert_eq!(store.generation(), g + 1);
    }

    #[test]
    fn refresh_while_resolving_keeps_the_gate_loading() {
        let store = SessionStore::new();
        let g = store.generation();

        assert!(store.replace(g, token("minted"), None));
        assert_eq!(store.phase(), SessionPhase::Resolving);
        assert_eq!(
            store.check(RouteGuard::Role(Role::Admin), "/admin"),
            GateDecision::Loading
        );

        store.establish(Identity::from_role(UserId::from(3), Role::Admin), token("minted"));
        assert!(store.check(RouteGuard::Role(Role::Admin), "/admin").is_render());
    }

    #[test]
    fn replace_after_clear_is_dropped() {
        let store = SessionStore::new();
        store.establish(Identity::from_role(UserId::from(1), Role::Admin), token("t1"));
        let g = store.generation();
        store.clear();

        assert!(!store.replace(g, token("t2"), None));
        assert!(store.identity().is_none());
        assert!(store.access_token().is_none());
    }
}
