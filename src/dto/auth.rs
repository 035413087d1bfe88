use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{Principal, UserRole},
    state::auth_gate::{AuthGate, AuthPhase, GateView},
};

/// Wire form of [`AuthPhase`].
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthPhaseDto {
    /// No identity.
    Unauthenticated,
    /// Login in flight.
    Authenticating,
    /// Identity known, role pending.
    AuthenticatedUnknownRole,
    /// Identity and role known.
    RoleResolved,
}

/// Wire form of [`GateView`].
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GateViewDto {
    /// Login prompt.
    LoginRequired,
    /// Login in progress.
    LoggingIn,
    /// Waiting for the role.
    Loading,
    /// Access denied.
    Denied,
    /// Access granted.
    Granted,
}

impl From<GateView> for GateViewDto {
    fn from(view: GateView) -> Self {
        match view {
            GateView::LoginRequired => GateViewDto::LoginRequired,
            GateView::LoggingIn => GateViewDto::LoggingIn,
            GateView::Loading => GateViewDto::Loading,
            GateView::Denied => GateViewDto::Denied,
            GateView::Granted => GateViewDto::Granted,
        }
    }
}

/// Admin gate state for the calling identity.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct GateResponse {
    /// Gate phase.
    pub phase: AuthPhaseDto,
    /// What admin surfaces render.
    pub view: GateViewDto,
    /// Authenticated caller.
    pub principal: Option<Principal>,
    /// Resolved role, absent while unresolved or when the lookup failed.
    pub role: Option<UserRole>,
}

impl From<&AuthGate> for GateResponse {
    fn from(gate: &AuthGate) -> Self {
        let (phase, role) = match gate.phase() {
            AuthPhase::Unauthenticated => (AuthPhaseDto::Unauthenticated, None),
            AuthPhase::Authenticating => (AuthPhaseDto::Authenticating, None),
            AuthPhase::AuthenticatedUnknownRole { .. } => {
                (AuthPhaseDto::AuthenticatedUnknownRole, None)
            }
            AuthPhase::RoleResolved { role, .. } => (AuthPhaseDto::RoleResolved, *role),
        };

        Self {
            phase,
            view: gate.view().into(),
            principal: gate.principal().cloned(),
            role,
        }
    }
}

/// Role of the calling identity.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct CallerRoleResponse {
    /// Caller, absent for anonymous requests.
    pub principal: Option<Principal>,
    /// Effective role.
    pub role: UserRole,
    /// Whether the role is admin.
    pub is_admin: bool,
}

/// Self-service profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq, Eq)]
pub struct UserProfileDto {
    /// Display name.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}
