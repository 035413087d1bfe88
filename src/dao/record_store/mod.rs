/// Process-local record store used for development and tests.
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{GameEntity, Platform, Principal, UserProfileEntity, UserRole};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the persistence platform holding game listings, profiles and roles.
///
/// Every mutation is atomic from the caller's perspective. Boolean results report whether the
/// targeted record existed (or, for inserts, whether the id was still free).
pub trait RecordStore: Send + Sync {
    /// Persist a new game; `false` when a game with the same id already exists.
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// Replace the game stored under `id`; `false` when there is none.
    fn replace_game(&self, id: String, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// Remove the game stored under `id`; `false` when there is none.
    fn delete_game(&self, id: String) -> BoxFuture<'static, StorageResult<bool>>;
    fn find_game(&self, id: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    fn list_games_by_platform(
        &self,
        platform: Platform,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    fn list_on_sale_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    fn find_profile(
        &self,
        principal: Principal,
    ) -> BoxFuture<'static, StorageResult<Option<UserProfileEntity>>>;
    fn save_profile(
        &self,
        principal: Principal,
        profile: UserProfileEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn find_role(&self, principal: Principal) -> BoxFuture<'static, StorageResult<Option<UserRole>>>;
    fn save_role(&self, principal: Principal, role: UserRole) -> BoxFuture<'static, StorageResult<()>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
