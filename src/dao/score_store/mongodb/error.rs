use mongodb::error::Error as MongoError;
use thiserror::Error;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

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
    #[error("failed to save player `{id}`")]
    SavePlayer {
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load player `{id}`")]
    LoadPlayer {
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to register game `{game_id}`")]
    SaveGame {
        game_id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to access the reset schedule")]
    ResetTime {
        #[source]
        source: MongoError,
    },
    #[error("failed to load score of `{player_id}` for `{game_id}`")]
    LoadScore {
        player_id: String,
        game_id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to record score of `{player_id}` for `{game_id}`")]
    RecordScore {
        player_id: String,
        game_id: String,
        #[source]
        source: MongoError,
    },
    #[error("upsert of `{player_id}`/`{game_id}` returned no document")]
    MissingScore { player_id: String, game_id: String },
    #[error("failed to close the ranking window")]
    CloseWindow {
        #[source]
        source: MongoError,
    },
}
