//! Caller profiles: self-service read and write, admin read of any principal.

use crate::{
    dao::models::{Principal, UserProfileEntity, UserRole},
    dto::auth::UserProfileDto,
    error::ServiceError,
    services::auth_service,
    state::SharedState,
};

fn require_caller(caller: Option<Principal>) -> Result<Principal, ServiceError> {
    caller.ok_or_else(|| ServiceError::Unauthorized("login required".into()))
}

async fn load_profile(
    state: &SharedState,
    principal: Principal,
) -> Result<Option<UserProfileDto>, ServiceError> {
    if state.is_degraded() {
        return Ok(None);
    }
    let Some(store) = state.record_store().await else {
        return Ok(None);
    };
    let profile = store.find_profile(principal).await?;
    Ok(profile.map(|profile| UserProfileDto { name: profile.name }))
}

/// Profile of the calling identity; `None` until it has been set up.
pub async fn get_caller_profile(
    state: &SharedState,
    caller: Option<Principal>,
) -> Result<Option<UserProfileDto>, ServiceError> {
    let principal = require_caller(caller)?;
    load_profile(state, principal).await
}

/// Create or replace the caller's own profile. Guests cannot own a profile.
pub async fn save_caller_profile(
    state: &SharedState,
    caller: Option<Principal>,
    profile: UserProfileDto,
) -> Result<UserProfileDto, ServiceError> {
    let principal = require_caller(caller)?;

    let name = profile.name.trim().to_owned();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput("name is required".into()));
    }

    if auth_service::caller_role(state, Some(&principal)).await? == UserRole::Guest {
        return Err(ServiceError::Forbidden(
            "guests cannot save a profile".into(),
        ));
    }

    let store = state.require_record_store().await?;
    store
        .save_profile(principal, UserProfileEntity { name: name.clone() })
        .await?;
    Ok(UserProfileDto { name })
}

/// Profile of `target`, readable by `target` itself and by admins.
pub async fn get_user_profile(
    state: &SharedState,
    caller: Option<Principal>,
    target: Principal,
) -> Result<Option<UserProfileDto>, ServiceError> {
    let principal = require_caller(caller)?;
    if principal != target && !auth_service::is_caller_admin(state, Some(principal)).await {
        return Err(ServiceError::Forbidden(
            "only admins can read other profiles".into(),
        ));
    }
    load_profile(state, target).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::record_store::{RecordStore, memory::MemoryRecordStore},
        state::AppState,
    };

    async fn ready_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        store
            .save_role(Principal::new("root"), UserRole::Admin)
            .await
            .unwrap();
        store
            .save_role(Principal::new("visitor"), UserRole::Guest)
            .await
            .unwrap();
        state.set_record_store(store).await;
        state
    }

    fn profile(name: &str) -> UserProfileDto {
        UserProfileDto { name: name.into() }
    }

    #[tokio::test]
    async fn caller_saves_and_reads_own_profile() {
        let state = ready_state().await;
        let alice = Some(Principal::new("alice"));

        assert!(get_caller_profile(&state, alice.clone()).await.unwrap().is_none());
        let saved = save_caller_profile(&state, alice.clone(), profile("  Alice  "))
            .await
            .unwrap();
        assert_eq!(saved.name, "Alice");
        assert_eq!(
            get_caller_profile(&state, alice).await.unwrap(),
            Some(profile("Alice"))
        );
    }

    #[tokio::test]
    async fn blank_names_and_guests_are_rejected() {
        let state = ready_state().await;
        assert!(matches!(
            save_caller_profile(&state, Some(Principal::new("alice")), profile("   ")).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            save_caller_profile(&state, Some(Principal::new("visitor")), profile("V")).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            save_caller_profile(&state, None, profile("Anon")).await,
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn other_profiles_are_admin_only() {
        let state = ready_state().await;
        save_caller_profile(&state, Some(Principal::new("alice")), profile("Alice"))
            .await
            .unwrap();

        assert!(matches!(
            get_user_profile(&state, Some(Principal::new("bob")), Principal::new("alice")).await,
            Err(ServiceError::Forbidden(_))
        ));
        let read = get_user_profile(&state, Some(Principal::new("root")), Principal::new("alice"))
            .await
            .unwrap();
        assert_eq!(read, Some(profile("Alice")));
    }
}
