//! Caller roles and the admin gate.
//!
//! Roles are read from the record store on every request rather than cached, so an assignment is
//! visible to the target's next request.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    dao::{
        models::{Principal, UserRole},
        record_store::RecordStore,
        storage::StorageResult,
    },
    error::ServiceError,
    state::{
        SharedState,
        auth_gate::{AuthEvent, AuthGate, GateView},
    },
};

/// Effective role of `caller`: the stored role if any, otherwise `user` for authenticated callers
/// and `guest` for anonymous ones.
pub async fn caller_role(
    state: &SharedState,
    caller: Option<&Principal>,
) -> Result<UserRole, ServiceError> {
    let Some(principal) = caller else {
        return Ok(UserRole::Guest);
    };

    let store = state.require_record_store().await?;
    let stored = store.find_role(principal.clone()).await?;
    Ok(stored.unwrap_or(UserRole::User))
}

/// Drive an [`AuthGate`] for `caller` through the role query.
pub async fn resolve_gate(state: &SharedState, caller: Option<Principal>) -> AuthGate {
    let mut gate = AuthGate::for_caller(caller.clone());
    let Some(principal) = caller else {
        return gate;
    };

    let event = match caller_role(state, Some(&principal)).await {
        Ok(role) => AuthEvent::RoleResolved(role),
        Err(err) => {
            warn!(%principal, error = %err, "role lookup failed; treating caller as non-admin");
            AuthEvent::RoleLookupFailed
        }
    };

    if let Err(err) = gate.apply(event) {
        warn!(%principal, error = %err, "unexpected auth gate transition");
    }
    gate
}

/// Whether `caller` resolves to the admin role. Lookup failures count as "not admin".
pub async fn is_caller_admin(state: &SharedState, caller: Option<Principal>) -> bool {
    resolve_gate(state, caller).await.view() == GateView::Granted
}

/// Assign `role` to `target`. Only admins may assign roles.
pub async fn assign_role(
    state: &SharedState,
    caller: Option<Principal>,
    target: Principal,
    role: UserRole,
) -> Result<(), ServiceError> {
    let gate = resolve_gate(state, caller).await;
    match gate.view() {
        GateView::Granted => {}
        GateView::LoginRequired | GateView::LoggingIn => {
            return Err(ServiceError::Unauthorized("login required".into()));
        }
        GateView::Loading | GateView::Denied => {
            return Err(ServiceError::Forbidden(
                "only admins can assign roles".into(),
            ));
        }
    }

    let store = state.require_record_store().await?;
    store.save_role(target.clone(), role).await?;
    info!(%target, role = role.as_str(), "role assigned");
    Ok(())
}

/// Grant the admin role to configured bootstrap principals that have no role yet.
pub async fn seed_bootstrap_admins(
    state: &SharedState,
    store: &Arc<dyn RecordStore>,
) -> StorageResult<usize> {
    let mut seeded = 0;
    for principal in &state.config().bootstrap_admins {
        if store.find_role(principal.clone()).await?.is_some() {
            continue;
        }
        store.save_role(principal.clone(), UserRole::Admin).await?;
        info!(%principal, "granted admin role to bootstrap principal");
        seeded += 1;
    }
    Ok(seeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig, dao::record_store::memory::MemoryRecordStore, state::AppState,
    };

    async fn state_with_admin(admin: &str) -> SharedState {
        let config = AppConfig {
            bootstrap_admins: vec![Principal::new(admin)],
            ..AppConfig::default()
        };
        let state = AppState::new(config);
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        seed_bootstrap_admins(&state, &store).await.unwrap();
        state.set_record_store(store).await;
        state
    }

    #[tokio::test]
    async fn baseline_roles_depend_on_authentication() {
        let state = state_with_admin("root").await;
        assert_eq!(caller_role(&state, None).await.unwrap(), UserRole::Guest);
        assert_eq!(
            caller_role(&state, Some(&Principal::new("alice"))).await.unwrap(),
            UserRole::User
        );
        assert_eq!(
            caller_role(&state, Some(&Principal::new("root"))).await.unwrap(),
            UserRole::Admin
        );
    }

    #[tokio::test]
    async fn bootstrap_does_not_override_existing_roles() {
        let state = state_with_admin("root").await;
        let store = state.record_store().await.unwrap();
        store
            .save_role(Principal::new("root"), UserRole::User)
            .await
            .unwrap();
        assert_eq!(seed_bootstrap_admins(&state, &store).await.unwrap(), 0);
        assert!(!is_caller_admin(&state, Some(Principal::new("root"))).await);
    }

    #[tokio::test]
    async fn only_admins_assign_roles() {
        let state = state_with_admin("root").await;
        let bob = Principal::new("bob");

        let err = assign_role(&state, Some(bob.clone()), bob.clone(), UserRole::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = assign_role(&state, None, bob.clone(), UserRole::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        assign_role(&state, Some(Principal::new("root")), bob.clone(), UserRole::Admin)
            .await
            .unwrap();
        assert!(is_caller_admin(&state, Some(bob)).await);
    }

    #[tokio::test]
    async fn degraded_role_lookup_denies_access() {
        let state = state_with_admin("root").await;
        state.update_degraded(true);

        let gate = resolve_gate(&state, Some(Principal::new("root"))).await;
        assert_eq!(gate.view(), GateView::Denied);
    }
}
