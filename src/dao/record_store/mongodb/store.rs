use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database,
    bson::{Document, doc},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::{Connection, RetryPolicy, connect_with_retry},
    error::{MongoDaoError, MongoResult},
    models::{MongoGameDocument, MongoProfileDocument, MongoRoleDocument, doc_id},
};
use crate::dao::{
    models::{GameEntity, Platform, Principal, UserProfileEntity, UserRole},
    record_store::RecordStore,
    storage::StorageResult,
};

const GAME_COLLECTION_NAME: &str = "games";
const PROFILE_COLLECTION_NAME: &str = "profiles";
const ROLE_COLLECTION_NAME: &str = "roles";
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Record store backed by a MongoDB database.
#[derive(Clone)]
pub struct MongoRecordStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<Connection>,
    config: MongoConfig,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let connection = connect_with_retry(&self.config, RetryPolicy::default()).await?;
        *self.state.write().await = connection;
        Ok(())
    }
}

impl MongoRecordStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let connection = connect_with_retry(&config, RetryPolicy::default()).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(connection),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.database().await.collection::<Document>(GAME_COLLECTION_NAME);

        for (field, name) in [("platform", "game_platform_idx"), ("on_sale", "game_on_sale_idx")] {
            let mut keys = Document::new();
            keys.insert(field, 1);
            let index = mongodb::IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().name(Some(name.to_owned())).build())
                .build();

            collection
                .create_index(index)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: GAME_COLLECTION_NAME,
                    index: field,
                    source,
                })?;
        }

        Ok(())
    }

    pub(super) async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn games(&self) -> Collection<MongoGameDocument> {
        self.database()
            .await
            .collection::<MongoGameDocument>(GAME_COLLECTION_NAME)
    }

    async fn profiles(&self) -> Collection<MongoProfileDocument> {
        self.database()
            .await
            .collection::<MongoProfileDocument>(PROFILE_COLLECTION_NAME)
    }

    async fn roles(&self) -> Collection<MongoRoleDocument> {
        self.database()
            .await
            .collection::<MongoRoleDocument>(ROLE_COLLECTION_NAME)
    }

    async fn insert_game(&self, game: GameEntity) -> MongoResult<bool> {
        let id = game.id.clone();
        let document = MongoGameDocument::try_from(game)?;

        match self.games().await.insert_one(&document).await {
            Ok(_) => Ok(true),
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(source) => Err(MongoDaoError::SaveGame { id, source }),
        }
    }

    async fn replace_game(&self, id: String, game: GameEntity) -> MongoResult<bool> {
        let document = MongoGameDocument::try_from(game)?;
        let result = self
            .games()
            .await
            .replace_one(doc_id(&id), &document)
            .await
            .map_err(|source| MongoDaoError::SaveGame {
                id: id.clone(),
                source,
            })?;
        Ok(result.matched_count > 0)
    }

    async fn delete_game(&self, id: String) -> MongoResult<bool> {
        let result = self
            .games()
            .await
            .delete_one(doc_id(&id))
            .await
            .map_err(|source| MongoDaoError::DeleteGame {
                id: id.clone(),
                source,
            })?;
        Ok(result.deleted_count > 0)
    }

    async fn find_game(&self, id: String) -> MongoResult<Option<GameEntity>> {
        let document = self
            .games()
            .await
            .find_one(doc_id(&id))
            .await
            .map_err(|source| MongoDaoError::LoadGame {
                id: id.clone(),
                source,
            })?;
        document.map(GameEntity::try_from).transpose()
    }

    async fn query_games(&self, filter: Document) -> MongoResult<Vec<GameEntity>> {
        let documents: Vec<MongoGameDocument> = self
            .games()
            .await
            .find(filter)
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListGames { source })?;

        documents.into_iter().map(GameEntity::try_from).collect()
    }

    async fn find_profile(&self, principal: Principal) -> MongoResult<Option<UserProfileEntity>> {
        let document = self
            .profiles()
            .await
            .find_one(doc_id(principal.as_str()))
            .await
            .map_err(|source| MongoDaoError::LoadProfile {
                principal: principal.to_string(),
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn save_profile(
        &self,
        principal: Principal,
        profile: UserProfileEntity,
    ) -> MongoResult<()> {
        let document = MongoProfileDocument {
            principal: principal.to_string(),
            name: profile.name,
        };
        self.profiles()
            .await
            .replace_one(doc_id(principal.as_str()), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveProfile {
                principal: principal.to_string(),
                source,
            })?;
        Ok(())
    }

    async fn find_role(&self, principal: Principal) -> MongoResult<Option<UserRole>> {
        let document = self
            .roles()
            .await
            .find_one(doc_id(principal.as_str()))
            .await
            .map_err(|source| MongoDaoError::LoadRole {
                principal: principal.to_string(),
                source,
            })?;
        Ok(document.map(|doc| doc.role))
    }

    async fn save_role(&self, principal: Principal, role: UserRole) -> MongoResult<()> {
        let document = MongoRoleDocument {
            principal: principal.to_string(),
            role,
        };
        self.roles()
            .await
            .replace_one(doc_id(principal.as_str()), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveRole {
                principal: principal.to_string(),
                source,
            })?;
        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY_CODE
    )
}

impl RecordStore for MongoRecordStore {
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.insert_game(game).await.map_err(Into::into) })
    }

    fn replace_game(&self, id: String, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.replace_game(id, game).await.map_err(Into::into) })
    }

    fn delete_game(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_game(id).await.map_err(Into::into) })
    }

    fn find_game(&self, id: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game(id).await.map_err(Into::into) })
    }

    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.query_games(doc! {}).await.map_err(Into::into) })
    }

    fn list_games_by_platform(
        &self,
        platform: Platform,
    ) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .query_games(doc! { "platform": platform.as_str() })
                .await
                .map_err(Into::into)
        })
    }

    fn list_on_sale_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .query_games(doc! { "on_sale": true })
                .await
                .map_err(Into::into)
        })
    }

    fn find_profile(
        &self,
        principal: Principal,
    ) -> BoxFuture<'static, StorageResult<Option<UserProfileEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_profile(principal).await.map_err(Into::into) })
    }

    fn save_profile(
        &self,
        principal: Principal,
        profile: UserProfileEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .save_profile(principal, profile)
                .await
                .map_err(Into::into)
        })
    }

    fn find_role(&self, principal: Principal) -> BoxFuture<'static, StorageResult<Option<UserRole>>> {
        let store = self.clone();
        Box::pin(async move { store.find_role(principal).await.map_err(Into::into) })
    }

    fn save_role(&self, principal: Principal, role: UserRole) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_role(principal, role).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
