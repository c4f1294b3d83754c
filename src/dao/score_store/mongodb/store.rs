use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, ClientSession, Collection, Database, IndexModel,
    bson::{DateTime, Document, doc},
    error::{Error as MongoError, TRANSIENT_TRANSACTION_ERROR},
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoGameConfigDocument, MongoPlayerDocument, MongoResetTimeDocument, MongoScoreDocument,
        RESET_TIME_ID,
    },
};
use crate::dao::{
    models::{GameConfigEntity, PlayerEntity, RankOrder, ResetTimeEntity, ScoreEntity, WindowClose},
    score_store::ScoreStore,
    storage::StorageResult,
};

const PLAYER_COLLECTION_NAME: &str = "players";
const GAME_COLLECTION_NAME: &str = "games";
const SCORE_COLLECTION_NAME: &str = "scores";
const RESET_COLLECTION_NAME: &str = "reset_time";

/// MongoDB-backed [`ScoreStore`]. Closing a window needs a replica set since
/// it runs inside a multi-document transaction.
#[derive(Clone)]
pub struct MongoScoreStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
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
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

fn player_filter(player_id: &str, game_id: &str) -> Document {
    doc! { "player_id": player_id, "game_id": game_id }
}

impl MongoScoreStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let scores = self.scores().await;
        let index = IndexModel::builder()
            .keys(doc! {"player_id": 1, "game_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("score_player_game_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();

        scores
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SCORE_COLLECTION_NAME,
                index: "player_id,game_id",
                source,
            })?;

        let daily = IndexModel::builder()
            .keys(doc! {"daily_score": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("score_daily_idx".to_owned()))
                    .build(),
            )
            .build();

        scores
            .create_index(daily)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SCORE_COLLECTION_NAME,
                index: "daily_score",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn client(&self) -> Client {
        let guard = self.inner.state.read().await;
        guard.client.clone()
    }

    async fn players(&self) -> Collection<MongoPlayerDocument> {
        self.database().await.collection(PLAYER_COLLECTION_NAME)
    }

    async fn games(&self) -> Collection<MongoGameConfigDocument> {
        self.database().await.collection(GAME_COLLECTION_NAME)
    }

    async fn scores(&self) -> Collection<MongoScoreDocument> {
        self.database().await.collection(SCORE_COLLECTION_NAME)
    }

    async fn reset_times(&self) -> Collection<MongoResetTimeDocument> {
        self.database().await.collection(RESET_COLLECTION_NAME)
    }

    async fn upsert_player(&self, player: PlayerEntity) -> MongoResult<()> {
        let id = player.id.clone();
        let document: MongoPlayerDocument = player.into();
        self.players()
            .await
            .replace_one(doc! {"_id": &id}, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SavePlayer { id, source })?;
        Ok(())
    }

    async fn find_player(&self, id: String) -> MongoResult<Option<PlayerEntity>> {
        let document = self
            .players()
            .await
            .find_one(doc! {"_id": &id})
            .await
            .map_err(|source| MongoDaoError::LoadPlayer { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn register_games(&self, games: Vec<GameConfigEntity>) -> MongoResult<()> {
        let collection = self.games().await;
        for game in games {
            let game_id = game.game_id.clone();
            let document: MongoGameConfigDocument = game.into();
            collection
                .replace_one(doc! {"_id": &game_id}, &document)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::SaveGame { game_id, source })?;
        }
        Ok(())
    }

    async fn ensure_reset_time(&self, initial: SystemTime) -> MongoResult<ResetTimeEntity> {
        let update = doc! {
            "$setOnInsert": {
                "next_reset_at": DateTime::from_system_time(initial),
                "streak": 0_i64,
            }
        };
        let document = self
            .reset_times()
            .await
            .find_one_and_update(doc! {"_id": RESET_TIME_ID}, update)
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::ResetTime { source })?;

        Ok(match document {
            Some(document) => document.into(),
            None => ResetTimeEntity {
                next_reset_at: initial,
                streak: 0,
            },
        })
    }

    async fn find_reset_time(&self) -> MongoResult<Option<ResetTimeEntity>> {
        let document = self
            .reset_times()
            .await
            .find_one(doc! {"_id": RESET_TIME_ID})
            .await
            .map_err(|source| MongoDaoError::ResetTime { source })?;
        Ok(document.map(Into::into))
    }

    async fn find_score(
        &self,
        player_id: String,
        game_id: String,
    ) -> MongoResult<Option<ScoreEntity>> {
        let document = self
            .scores()
            .await
            .find_one(player_filter(&player_id, &game_id))
            .await
            .map_err(|source| MongoDaoError::LoadScore {
                player_id,
                game_id,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn record_score(
        &self,
        player_id: String,
        game_id: String,
        score: i32,
        high: Option<RankOrder>,
    ) -> MongoResult<ScoreEntity> {
        let mut update = doc! {
            "$set": {
                "daily_score": score,
                "updated_at": DateTime::now(),
            }
        };
        // $min/$max set the field when it is missing, so the first write
        // also seeds the all-time high.
        if let Some(order) = high {
            let operator = match order {
                RankOrder::Asc => "$min",
                RankOrder::Desc => "$max",
            };
            update.insert(operator, doc! {"all_time_high": score});
        }

        let document = self
            .scores()
            .await
            .find_one_and_update(player_filter(&player_id, &game_id), update)
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::RecordScore {
                player_id: player_id.clone(),
                game_id: game_id.clone(),
                source,
            })?;

        document
            .map(Into::into)
            .ok_or(MongoDaoError::MissingScore { player_id, game_id })
    }

    async fn close_window(&self, now: SystemTime, window: Duration) -> MongoResult<WindowClose> {
        let mut session = self
            .client()
            .await
            .start_session()
            .await
            .map_err(|source| MongoDaoError::CloseWindow { source })?;

        match self.close_window_in(&mut session, now, window).await {
            Ok(outcome) => Ok(outcome),
            // A concurrent closer committed first.
            Err(err) if err.contains_label(TRANSIENT_TRANSACTION_ERROR) => {
                debug!(error = %err, "ranking window closed concurrently");
                Ok(WindowClose::NotDue)
            }
            Err(source) => Err(MongoDaoError::CloseWindow { source }),
        }
    }

    async fn close_window_in(
        &self,
        session: &mut ClientSession,
        now: SystemTime,
        window: Duration,
    ) -> Result<WindowClose, MongoError> {
        session.start_transaction().await?;

        let reset_times = self.reset_times().await;
        let Some(reset) = reset_times
            .find_one(doc! {"_id": RESET_TIME_ID})
            .session(&mut *session)
            .await?
        else {
            session.abort_transaction().await?;
            return Ok(WindowClose::Uninitialized);
        };
        let current: ResetTimeEntity = reset.clone().into();
        if now < current.next_reset_at {
            session.abort_transaction().await?;
            return Ok(WindowClose::NotDue);
        }

        let scores = self.scores().await;
        let played_filter = doc! {"daily_score": {"$ne": null}};
        let mut cursor = scores
            .find(played_filter.clone())
            .sort(doc! {"game_id": 1, "player_id": 1})
            .session(&mut *session)
            .await?;
        let played: Vec<MongoScoreDocument> = cursor.stream(&mut *session).try_collect().await?;

        if played.is_empty() {
            reset_times
                .delete_one(doc! {"_id": RESET_TIME_ID})
                .session(&mut *session)
                .await?;
            session.commit_transaction().await?;
            return Ok(WindowClose::Empty);
        }

        scores
            .update_many(played_filter, doc! {"$set": {"daily_score": null}})
            .session(&mut *session)
            .await?;

        let next_reset_at = DateTime::from_system_time(current.next_reset_at + window);
        let advanced = reset_times
            .update_one(
                doc! {"_id": RESET_TIME_ID, "next_reset_at": reset.next_reset_at},
                doc! {
                    "$set": {"next_reset_at": next_reset_at},
                    "$inc": {"streak": 1_i64},
                },
            )
            .session(&mut *session)
            .await?;
        if advanced.matched_count == 0 {
            session.abort_transaction().await?;
            return Ok(WindowClose::NotDue);
        }

        let mut cursor = self
            .games()
            .await
            .find(doc! {})
            .session(&mut *session)
            .await?;
        let games: Vec<MongoGameConfigDocument> =
            cursor.stream(&mut *session).try_collect().await?;

        session.commit_transaction().await?;

        Ok(WindowClose::Closed {
            scores: played.into_iter().map(Into::into).collect(),
            games: games.into_iter().map(Into::into).collect(),
            streak: current.streak + 1,
        })
    }
}

impl ScoreStore for MongoScoreStore {
    fn upsert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.upsert_player(player).await.map_err(Into::into) })
    }

    fn find_player(&self, id: String) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_player(id).await.map_err(Into::into) })
    }

    fn register_games(
        &self,
        games: Vec<GameConfigEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.register_games(games).await.map_err(Into::into) })
    }

    fn ensure_reset_time(
        &self,
        initial: SystemTime,
    ) -> BoxFuture<'static, StorageResult<ResetTimeEntity>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_reset_time(initial).await.map_err(Into::into) })
    }

    fn find_reset_time(&self) -> BoxFuture<'static, StorageResult<Option<ResetTimeEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_reset_time().await.map_err(Into::into) })
    }

    fn find_score(
        &self,
        player_id: String,
        game_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_score(player_id, game_id)
                .await
                .map_err(Into::into)
        })
    }

    fn record_score(
        &self,
        player_id: String,
        game_id: String,
        score: i32,
        high: Option<RankOrder>,
    ) -> BoxFuture<'static, StorageResult<ScoreEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .record_score(player_id, game_id, score, high)
                .await
                .map_err(Into::into)
        })
    }

    fn close_window(
        &self,
        now: SystemTime,
        window: Duration,
    ) -> BoxFuture<'static, StorageResult<WindowClose>> {
        let store = self.clone();
        Box::pin(async move { store.close_window(now, window).await.map_err(Into::into) })
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
