//! Auth gate state machine guarding admin surfaces.
//!
//! The server establishes identity upstream, so request handling enters the machine through
//! [`AuthGate::for_caller`] and only applies role resolution events. The login events
//! (`LoginAttempt`, `LoginFailed`, `Logout`) describe the interactive client flow and are kept
//! so that flow can be replayed against the same transition table.

use thiserror::Error;

use crate::dao::models::{Principal, UserRole};

/// Authentication phases a caller moves through before reaching admin surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPhase {
    /// No identity is known.
    Unauthenticated,
    /// A login attempt is in flight.
    Authenticating,
    /// Identity is known, role query still pending.
    AuthenticatedUnknownRole {
        /// Authenticated caller.
        principal: Principal,
    },
    /// Identity and role are both known. `None` records a failed or empty role lookup.
    RoleResolved {
        /// Authenticated caller.
        principal: Principal,
        /// Resolved role, if any.
        role: Option<UserRole>,
    },
}

/// Inputs driving the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// The caller started a login.
    LoginAttempt,
    /// The identity provider accepted the login.
    LoginSucceeded(Principal),
    /// The identity provider rejected the login.
    LoginFailed,
    /// The role query returned.
    RoleResolved(UserRole),
    /// The role query failed; treated as "not admin".
    RoleLookupFailed,
    /// The caller logged out.
    Logout,
}

/// What an admin-only surface renders for the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateView {
    /// Prompt the caller to log in.
    LoginRequired,
    /// Login in progress.
    LoggingIn,
    /// Waiting for the role query.
    Loading,
    /// Resolved to a non-admin role or no role at all.
    Denied,
    /// Resolved to admin.
    Granted,
}

/// Error returned when an event cannot be applied from the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the gate was in when the event was received.
    pub from: AuthPhase,
    /// The rejected event.
    pub event: AuthEvent,
}

/// State machine deriving admin access from identity and role queries.
#[derive(Debug, Clone)]
pub struct AuthGate {
    phase: AuthPhase,
}

impl Default for AuthGate {
    fn default() -> Self {
        Self {
            phase: AuthPhase::Unauthenticated,
        }
    }
}

impl AuthGate {
    /// Create a gate in the unauthenticated phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate for a request whose identity was already established upstream: anonymous callers stay
    /// unauthenticated, identified callers wait for their role.
    pub fn for_caller(principal: Option<Principal>) -> Self {
        let mut gate = Self::new();
        if let Some(principal) = principal {
            gate.phase = AuthPhase::AuthenticatedUnknownRole { principal };
        }
        gate
    }

    /// Current phase.
    pub fn phase(&self) -> &AuthPhase {
        &self.phase
    }

    /// Authenticated principal, if any.
    pub fn principal(&self) -> Option<&Principal> {
        match &self.phase {
            AuthPhase::AuthenticatedUnknownRole { principal }
            | AuthPhase::RoleResolved { principal, .. } => Some(principal),
            AuthPhase::Unauthenticated | AuthPhase::Authenticating => None,
        }
    }

    /// View an admin-only surface should render.
    pub fn view(&self) -> GateView {
        match &self.phase {
            AuthPhase::Unauthenticated => GateView::LoginRequired,
            AuthPhase::Authenticating => GateView::LoggingIn,
            AuthPhase::AuthenticatedUnknownRole { .. } => GateView::Loading,
            AuthPhase::RoleResolved {
                role: Some(UserRole::Admin),
                ..
            } => GateView::Granted,
            AuthPhase::RoleResolved { .. } => GateView::Denied,
        }
    }

    /// Apply `event`, returning the new phase.
    pub fn apply(&mut self, event: AuthEvent) -> Result<&AuthPhase, InvalidTransition> {
        self.phase = self.compute_transition(event)?;
        Ok(&self.phase)
    }

    fn compute_transition(&self, event: AuthEvent) -> Result<AuthPhase, InvalidTransition> {
        let next = match (self.phase.clone(), event) {
            (AuthPhase::Unauthenticated, AuthEvent::LoginAttempt) => AuthPhase::Authenticating,
            (AuthPhase::Authenticating, AuthEvent::LoginSucceeded(principal)) => {
                AuthPhase::AuthenticatedUnknownRole { principal }
            }
            (AuthPhase::Authenticating, AuthEvent::LoginFailed) => AuthPhase::Unauthenticated,
            (
                AuthPhase::AuthenticatedUnknownRole { principal }
                | AuthPhase::RoleResolved { principal, .. },
                AuthEvent::RoleResolved(role),
            ) => AuthPhase::RoleResolved {
                principal,
                role: Some(role),
            },
            (
                AuthPhase::AuthenticatedUnknownRole { principal }
                | AuthPhase::RoleResolved { principal, .. },
                AuthEvent::RoleLookupFailed,
            ) => AuthPhase::RoleResolved {
                principal,
                role: None,
            },
            (
                AuthPhase::Authenticating
                | AuthPhase::AuthenticatedUnknownRole { .. }
                | AuthPhase::RoleResolved { .. },
                AuthEvent::Logout,
            ) => AuthPhase::Unauthenticated,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logged_in(name: &str) -> AuthGate {
        let mut gate = AuthGate::new();
        gate.apply(AuthEvent::LoginAttempt).unwrap();
        gate.apply(AuthEvent::LoginSucceeded(Principal::new(name)))
            .unwrap();
        gate
    }

    #[test]
    fn login_flow_reaches_granted_only_for_admins() {
        let mut gate = AuthGate::new();
        assert_eq!(gate.view(), GateView::LoginRequired);

        gate.apply(AuthEvent::LoginAttempt).unwrap();
        assert_eq!(gate.view(), GateView::LoggingIn);

        gate.apply(AuthEvent::LoginSucceeded(Principal::new("alice")))
            .unwrap();
        assert_eq!(gate.view(), GateView::Loading);

        gate.apply(AuthEvent::RoleResolved(UserRole::Admin)).unwrap();
        assert_eq!(gate.view(), GateView::Granted);
        assert_eq!(gate.principal(), Some(&Principal::new("alice")));
    }

    #[test]
    fn non_admin_roles_are_denied() {
        for role in [UserRole::User, UserRole::Guest] {
            let mut gate = logged_in("bob");
            gate.apply(AuthEvent::RoleResolved(role)).unwrap();
            assert_eq!(gate.view(), GateView::Denied);
        }
    }

    #[test]
    fn failed_role_lookup_falls_back_to_denied() {
        let mut gate = logged_in("carol");
        gate.apply(AuthEvent::RoleLookupFailed).unwrap();
        assert_eq!(
            gate.phase(),
            &AuthPhase::RoleResolved {
                principal: Principal::new("carol"),
                role: None
            }
        );
        assert_eq!(gate.view(), GateView::Denied);
    }

    #[test]
    fn role_refresh_can_revoke_access() {
        let mut gate = logged_in("dave");
        gate.apply(AuthEvent::RoleResolved(UserRole::Admin)).unwrap();
        gate.apply(AuthEvent::RoleResolved(UserRole::User)).unwrap();
        assert_eq!(gate.view(), GateView::Denied);
    }

    #[test]
    fn failed_login_returns_to_unauthenticated() {
        let mut gate = AuthGate::new();
        gate.apply(AuthEvent::LoginAttempt).unwrap();
        gate.apply(AuthEvent::LoginFailed).unwrap();
        assert_eq!(gate.phase(), &AuthPhase::Unauthenticated);
    }

    #[test]
    fn logout_resets_any_authenticated_phase() {
        let mut gate = logged_in("erin");
        gate.apply(AuthEvent::RoleResolved(UserRole::Admin)).unwrap();
        gate.apply(AuthEvent::Logout).unwrap();
        assert_eq!(gate.view(), GateView::LoginRequired);
    }

    #[test]
    fn rejects_events_out_of_order() {
        let mut gate = AuthGate::new();
        let err = gate
            .apply(AuthEvent::RoleResolved(UserRole::Admin))
            .unwrap_err();
        assert_eq!(err.from, AuthPhase::Unauthenticated);
        assert_eq!(gate.phase(), &AuthPhase::Unauthenticated);

        assert!(gate.apply(AuthEvent::Logout).is_err());
        assert!(
            logged_in("frank")
                .apply(AuthEvent::LoginAttempt)
                .is_err()
        );
    }

    #[test]
    fn for_caller_skips_the_login_exchange() {
        assert_eq!(AuthGate::for_caller(None).view(), GateView::LoginRequired);
        let gate = AuthGate::for_caller(Some(Principal::new("gina")));
        assert_eq!(gate.view(), GateView::Loading);
    }
}
