//! Typed queries and mutations over the record store, each tied to a cache key.
//!
//! Reads are skipped while the store is not ready and served from the query cache otherwise.
//! Successful mutations invalidate `["games"]` (and therefore every derived listing) plus the
//! mutated record's own key, then notify catalog subscribers. Failed mutations leave the cache
//! untouched. Concurrent writers are not coordinated: the last write wins at the store.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, info};

use crate::{
    dao::{
        models::{GameEntity, Platform},
        record_store::RecordStore,
        storage::StorageResult,
    },
    dto::sse::{CatalogChange, CatalogInvalidated},
    error::ServiceError,
    state::{CachedQuery, QueryKey, SharedState},
};

/// Result of a read against the data access layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome<T> {
    /// The store connection is not ready; the read was not attempted.
    Skipped,
    /// The read completed.
    Ready(T),
}

impl<T> QueryOutcome<T> {
    /// `Some` when the read completed.
    pub fn ready(self) -> Option<T> {
        match self {
            QueryOutcome::Ready(value) => Some(value),
            QueryOutcome::Skipped => None,
        }
    }

    /// Whether the read was skipped.
    pub fn is_skipped(&self) -> bool {
        matches!(self, QueryOutcome::Skipped)
    }
}

/// Listing query result.
pub type GamesOutcome = QueryOutcome<Arc<Vec<GameEntity>>>;
/// Single record query result.
pub type GameOutcome = QueryOutcome<Arc<Option<GameEntity>>>;

async fn ready_store(state: &SharedState) -> Option<Arc<dyn RecordStore>> {
    if state.is_degraded() {
        return None;
    }
    state.record_store().await
}

async fn cached_listing<F>(state: &SharedState, key: QueryKey, fetch: F) -> Result<GamesOutcome, ServiceError>
where
    F: FnOnce(Arc<dyn RecordStore>) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>,
{
    let Some(store) = ready_store(state).await else {
        debug!(%key, "store not ready; skipping read");
        return Ok(QueryOutcome::Skipped);
    };

    let cache = state.query_cache();
    if let Some(games) = cache.games(&key) {
        return Ok(QueryOutcome::Ready(games));
    }

    let generation = cache.generation();
    let games = Arc::new(fetch(store).await?);
    if !cache.insert_fetched(key.clone(), CachedQuery::Games(games.clone()), generation) {
        debug!(%key, "listing raced a mutation; not cached");
    }
    Ok(QueryOutcome::Ready(games))
}

/// Every game, in store order.
pub async fn get_all_games(state: &SharedState) -> Result<GamesOutcome, ServiceError> {
    cached_listing(state, QueryKey::all_games(), |store| store.list_games()).await
}

/// Games sold for `platform`.
pub async fn get_games_by_platform(
    state: &SharedState,
    platform: Platform,
) -> Result<GamesOutcome, ServiceError> {
    cached_listing(state, QueryKey::games_by_platform(platform), move |store| {
        store.list_games_by_platform(platform)
    })
    .await
}

/// Games currently on sale.
pub async fn get_on_sale_games(state: &SharedState) -> Result<GamesOutcome, ServiceError> {
    cached_listing(state, QueryKey::on_sale_games(), |store| {
        store.list_on_sale_games()
    })
    .await
}

/// A single game; misses are cached too.
pub async fn get_game(state: &SharedState, id: &str) -> Result<GameOutcome, ServiceError> {
    let key = QueryKey::game(id);
    let Some(store) = ready_store(state).await else {
        debug!(%key, "store not ready; skipping read");
        return Ok(QueryOutcome::Skipped);
    };

    let cache = state.query_cache();
    if let Some(game) = cache.game(&key) {
        return Ok(QueryOutcome::Ready(game));
    }

    let generation = cache.generation();
    let game = Arc::new(store.find_game(id.to_owned()).await?);
    if !cache.insert_fetched(key.clone(), CachedQuery::Game(game.clone()), generation) {
        debug!(%key, "lookup raced a mutation; not cached");
    }
    Ok(QueryOutcome::Ready(game))
}

/// Persist a new game. Fails with a conflict when the id is taken.
pub async fn add_game(state: &SharedState, game: GameEntity) -> Result<(), ServiceError> {
    let store = state.require_record_store().await?;
    let id = game.id.clone();

    if !store.insert_game(game).await? {
        return Err(ServiceError::Conflict(format!("game `{id}` already exists")));
    }

    invalidate_after_mutation(state, CatalogChange::Added, &id);
    Ok(())
}

/// Replace the game stored under `id`.
pub async fn update_game(
    state: &SharedState,
    id: &str,
    game: GameEntity,
) -> Result<(), ServiceError> {
    let store = state.require_record_store().await?;

    if !store.replace_game(id.to_owned(), game).await? {
        return Err(ServiceError::NotFound(format!("game `{id}`")));
    }

    invalidate_after_mutation(state, CatalogChange::Updated, id);
    Ok(())
}

/// Remove the game stored under `id`.
pub async fn delete_game(state: &SharedState, id: &str) -> Result<(), ServiceError> {
    let store = state.require_record_store().await?;

    if !store.delete_game(id.to_owned()).await? {
        return Err(ServiceError::NotFound(format!("game `{id}`")));
    }

    invalidate_after_mutation(state, CatalogChange::Deleted, id);
    Ok(())
}

fn invalidate_after_mutation(state: &SharedState, change: CatalogChange, id: &str) {
    let keys = [QueryKey::all_games(), QueryKey::game(id)];
    let dropped: usize = keys
        .iter()
        .map(|key| state.query_cache().invalidate_prefix(key))
        .sum();
    info!(game_id = id, ?change, dropped, "catalog cache invalidated");

    state.catalog_sse().publish(
        "catalog_invalidated",
        &CatalogInvalidated {
            change,
            game_id: Some(id.to_owned()),
            invalidated: keys.iter().map(|key| key.segments().to_vec()).collect(),
        },
    );
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{ImageRef, Principal, UserProfileEntity, UserRole},
            record_store::memory::MemoryRecordStore,
        },
        state::AppState,
    };

    /// Memory store whose listings take a snapshot, then stall before returning it.
    #[derive(Clone, Default)]
    struct SlowListing {
        inner: MemoryRecordStore,
    }

    impl RecordStore for SlowListing {
        fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>> {
            self.inner.insert_game(game)
        }
        fn replace_game(&self, id: String, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>> {
            self.inner.replace_game(id, game)
        }
        fn delete_game(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
            self.inner.delete_game(id)
        }
        fn find_game(&self, id: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
            self.inner.find_game(id)
        }
        fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
            let snapshot = self.inner.list_games();
            Box::pin(async move {
                let games = snapshot.await?;
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(games)
            })
        }
        fn list_games_by_platform(
            &self,
            platform: Platform,
        ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
            self.inner.list_games_by_platform(platform)
        }
        fn list_on_sale_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
            self.inner.list_on_sale_games()
        }
        fn find_profile(
            &self,
            principal: Principal,
        ) -> BoxFuture<'static, StorageResult<Option<UserProfileEntity>>> {
            self.inner.find_profile(principal)
        }
        fn save_profile(
            &self,
            principal: Principal,
            profile: UserProfileEntity,
        ) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.save_profile(principal, profile)
        }
        fn find_role(&self, principal: Principal) -> BoxFuture<'static, StorageResult<Option<UserRole>>> {
            self.inner.find_role(principal)
        }
        fn save_role(&self, principal: Principal, role: UserRole) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.save_role(principal, role)
        }
        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }
        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.try_reconnect()
        }
    }

    fn game(id: &str, platform: Platform, on_sale: bool) -> GameEntity {
        GameEntity {
            id: id.into(),
            name: format!("Game {id}"),
            description: "desc".into(),
            platform,
            trailer_url: None,
            image: ImageRef {
                url: format!("https://cdn.example.com/{id}.png"),
            },
            price: 999,
            on_sale,
        }
    }

    async fn ready_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .set_record_store(Arc::new(MemoryRecordStore::new()))
            .await;
        state
    }

    fn ids(outcome: GamesOutcome) -> Vec<String> {
        outcome
            .ready()
            .unwrap()
            .iter()
            .map(|game| game.id.clone())
            .collect()
    }

    #[tokio::test]
    async fn reads_are_skipped_until_the_store_is_ready() {
        let state = AppState::new(AppConfig::default());
        assert!(get_all_games(&state).await.unwrap().is_skipped());
        assert!(get_game(&state, "g1").await.unwrap().is_skipped());
        assert!(matches!(
            add_game(&state, game("g1", Platform::Pc, false)).await,
            Err(ServiceError::Degraded)
        ));
    }

    #[tokio::test]
    async fn add_update_delete_scenario() {
        let state = ready_state().await;

        add_game(&state, game("g1", Platform::Pc, false)).await.unwrap();
        assert_eq!(ids(get_all_games(&state).await.unwrap()), vec!["g1"]);
        assert!(ids(get_on_sale_games(&state).await.unwrap()).is_empty());

        update_game(&state, "g1", game("g1", Platform::Pc, true))
            .await
            .unwrap();
        assert_eq!(ids(get_on_sale_games(&state).await.unwrap()), vec!["g1"]);

        delete_game(&state, "g1").await.unwrap();
        assert!(get_game(&state, "g1").await.unwrap().ready().unwrap().is_none());
        assert!(ids(get_all_games(&state).await.unwrap()).is_empty());
    }

    #[tokio::test]
    async fn single_record_reads_see_updates() {
        let state = ready_state().await;
        add_game(&state, game("g1", Platform::Pc, false)).await.unwrap();

        let before = get_game(&state, "g1").await.unwrap().ready().unwrap();
        assert_eq!((*before).as_ref().map(|g| g.on_sale), Some(false));

        update_game(&state, "g1", game("g1", Platform::Pc, true))
            .await
            .unwrap();
        let after = get_game(&state, "g1").await.unwrap().ready().unwrap();
        assert_eq!((*after).as_ref().map(|g| g.on_sale), Some(true));
    }

    #[tokio::test]
    async fn reads_in_flight_during_a_mutation_do_not_cache_stale_listings() {
        let state = AppState::new(AppConfig::default());
        state.set_record_store(Arc::new(SlowListing::default())).await;

        let in_flight = tokio::spawn({
            let state = state.clone();
            async move { get_all_games(&state).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        add_game(&state, game("g1", Platform::Pc, false)).await.unwrap();

        assert!(ids(in_flight.await.unwrap().unwrap()).is_empty());
        assert_eq!(ids(get_all_games(&state).await.unwrap()), vec!["g1"]);
        assert_eq!(ids(get_all_games(&state).await.unwrap()), vec!["g1"]);
    }

    #[tokio::test]
    async fn platform_listing_is_a_subset_of_all_games() {
        let state = ready_state().await;
        add_game(&state, game("a", Platform::Pc, false)).await.unwrap();
        add_game(&state, game("b", Platform::Ps5, true)).await.unwrap();
        add_game(&state, game("c", Platform::Ps5, false)).await.unwrap();

        let all = get_all_games(&state).await.unwrap().ready().unwrap();
        for platform in Platform::ALL {
            let expected: Vec<_> = all
                .iter()
                .filter(|game| game.platform == platform)
                .map(|game| game.id.clone())
                .collect();
            assert_eq!(
                ids(get_games_by_platform(&state, platform).await.unwrap()),
                expected
            );
        }
    }

    #[tokio::test]
    async fn failed_mutations_keep_the_cache() {
        let state = ready_state().await;
        add_game(&state, game("g1", Platform::Pc, false)).await.unwrap();
        get_all_games(&state).await.unwrap();
        assert!(state.query_cache().contains(&QueryKey::all_games()));

        assert!(matches!(
            add_game(&state, game("g1", Platform::Xbox, false)).await,
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            delete_game(&state, "missing").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(state.query_cache().contains(&QueryKey::all_games()));
    }

    #[tokio::test]
    async fn mutations_notify_catalog_subscribers() {
        let state = ready_state().await;
        let mut events = state.catalog_sse().subscribe();

        add_game(&state, game("g1", Platform::Pc, false)).await.unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("catalog_invalidated"));
        let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(payload["change"], "added");
        assert_eq!(payload["game_id"], "g1");
        assert_eq!(payload["invalidated"][0][0], "games");
    }
}
