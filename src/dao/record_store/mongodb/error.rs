use mongodb::error::Error as MongoError;
use thiserror::Error;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures raised by the MongoDB record store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("price of game `{id}` does not fit in a 64-bit signed integer")]
    PriceOutOfRange { id: String },
    #[error("stored game `{id}` is corrupt: {reason}")]
    CorruptDocument { id: String, reason: String },
    #[error("failed to save game `{id}`")]
    SaveGame {
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete game `{id}`")]
    DeleteGame {
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load game `{id}`")]
    LoadGame {
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to list games")]
    ListGames {
        #[source]
        source: MongoError,
    },
    #[error("failed to save profile of `{principal}`")]
    SaveProfile {
        principal: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load profile of `{principal}`")]
    LoadProfile {
        principal: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to save role of `{principal}`")]
    SaveRole {
        principal: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to save blob `{id}`")]
    SaveBlob {
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load blob `{id}`")]
    LoadBlob {
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete blob `{id}`")]
    DeleteBlob {
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load role of `{principal}`")]
    LoadRole {
        principal: String,
        #[source]
        source: MongoError,
    },
}
