use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::dao::{
    models::{GameEntity, Platform, Principal, UserProfileEntity, UserRole},
    record_store::RecordStore,
    storage::StorageResult,
};

/// In-process record store. Games keep their insertion order so listings are stable.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    games: Arc<RwLock<IndexMap<String, GameEntity>>>,
    profiles: Arc<DashMap<Principal, UserProfileEntity>>,
    roles: Arc<DashMap<Principal, UserRole>>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn filter_games<F>(&self, predicate: F) -> Vec<GameEntity>
    where
        F: Fn(&GameEntity) -> bool,
    {
        let guard = self.games.read().await;
        guard
            .values()
            .filter(|game| predicate(game))
            .cloned()
            .collect()
    }
}

impl RecordStore for MemoryRecordStore {
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut guard = store.games.write().await;
            if guard.contains_key(&game.id) {
                return Ok(false);
            }
            guard.insert(game.id.clone(), game);
            Ok(true)
        })
    }

    fn replace_game(&self, id: String, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut guard = store.games.write().await;
            match guard.get_mut(&id) {
                Some(slot) => {
                    *slot = game;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn delete_game(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let mut guard = store.games.write().await;
            Ok(guard.shift_remove(&id).is_some())
        })
    }

    fn find_game(&self, id: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let guard = store.games.read().await;
            Ok(guard.get(&id).cloned())
        })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.filter_games(|_| true).await) })
    }

    fn list_games_by_platform(
        &self,
        platform: Platform,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.filter_games(|game| game.platform == platform).await) })
    }

    fn list_on_sale_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.filter_games(|game| game.on_sale).await) })
    }

    fn find_profile(
        &self,
        principal: Principal,
    ) -> BoxFuture<'static, StorageResult<Option<UserProfileEntity>>> {
        let profile = self.profiles.get(&principal).map(|entry| entry.value().clone());
        Box::pin(async move { Ok(profile) })
    }

    fn save_profile(
        &self,
        principal: Principal,
        profile: UserProfileEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.profiles.insert(principal, profile);
        Box::pin(async { Ok(()) })
    }

    fn find_role(&self, principal: Principal) -> BoxFuture<'static, StorageResult<Option<UserRole>>> {
        let role = self.roles.get(&principal).map(|entry| *entry.value());
        Box::pin(async move { Ok(role) })
    }

    fn save_role(&self, principal: Principal, role: UserRole) -> BoxFuture<'static, StorageResult<()>> {
        self.roles.insert(principal, role);
        Box::pin(async { Ok(()) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
