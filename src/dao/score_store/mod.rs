pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::time::{Duration, SystemTime};

use futures::future::BoxFuture;

use crate::dao::{
    models::{GameConfigEntity, PlayerEntity, RankOrder, ResetTimeEntity, ScoreEntity, WindowClose},
    storage::StorageResult,
};

pub use self::memory::MemoryScoreStore;

/// Abstraction over the persistence layer for players, scores and the reset
/// schedule.
pub trait ScoreStore: Send + Sync {
    /// Insert the player or refresh their display name.
    fn upsert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_player(&self, id: String) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// Insert or replace game configurations.
    fn register_games(&self, games: Vec<GameConfigEntity>)
    -> BoxFuture<'static, StorageResult<()>>;
    /// Create the reset record with `initial` and a zero streak unless it
    /// already exists, then return the stored record.
    fn ensure_reset_time(
        &self,
        initial: SystemTime,
    ) -> BoxFuture<'static, StorageResult<ResetTimeEntity>>;
    fn find_reset_time(&self) -> BoxFuture<'static, StorageResult<Option<ResetTimeEntity>>>;
    fn find_score(
        &self,
        player_id: String,
        game_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>>;
    /// Single-row atomic write: the daily score is always replaced, the
    /// all-time high only when `high` is set and `score` improves it in that
    /// direction.
    fn record_score(
        &self,
        player_id: String,
        game_id: String,
        score: i32,
        high: Option<RankOrder>,
    ) -> BoxFuture<'static, StorageResult<ScoreEntity>>;
    /// Close the window if `now` has reached the reset time: collect and
    /// truncate daily scores, advance the reset time by `window` and bump the
    /// streak, all or nothing. Deletes the reset record when nobody played.
    fn close_window(
        &self,
        now: SystemTime,
        window: Duration,
    ) -> BoxFuture<'static, StorageResult<WindowClose>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
