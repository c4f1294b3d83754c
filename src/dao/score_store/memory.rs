//! In-process store. A single mutex guards every table, which makes each
//! operation, `close_window` included, atomic with respect to the others.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, SystemTime},
};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::Mutex;

use super::ScoreStore;
use crate::dao::{
    models::{GameConfigEntity, PlayerEntity, RankOrder, ResetTimeEntity, ScoreEntity, WindowClose},
    storage::StorageResult,
};

/// Volatile [`ScoreStore`] for local runs and tests.
#[derive(Clone, Default)]
pub struct MemoryScoreStore {
    inner: Arc<Mutex<Tables>>,
}

#[derive(Default)]
struct Tables {
    players: HashMap<String, PlayerEntity>,
    games: IndexMap<String, GameConfigEntity>,
    scores: HashMap<(String, String), ScoreEntity>,
    reset_time: Option<ResetTimeEntity>,
}

impl MemoryScoreStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the reset record, used to simulate elapsed windows.
    pub async fn set_reset_time(&self, record: Option<ResetTimeEntity>) {
        self.inner.lock().await.reset_time = record;
    }
}

impl Tables {
    fn close_window(&mut self, now: SystemTime, window: Duration) -> WindowClose {
        let Some(reset) = self.reset_time else {
            return WindowClose::Uninitialized;
        };
        if now < reset.next_reset_at {
            return WindowClose::NotDue;
        }

        let mut played: Vec<ScoreEntity> = self
            .scores
            .values()
            .filter(|score| score.daily_score.is_some())
            .cloned()
            .collect();
        if played.is_empty() {
            self.reset_time = None;
            return WindowClose::Empty;
        }
        played.sort_by(|a, b| (&a.game_id, &a.player_id).cmp(&(&b.game_id, &b.player_id)));

        for score in self.scores.values_mut() {
            score.daily_score = None;
        }
        let streak = reset.streak + 1;
        self.reset_time = Some(ResetTimeEntity {
            next_reset_at: reset.next_reset_at + window,
            streak,
        });

        WindowClose::Closed {
            scores: played,
            games: self.games.values().cloned().collect(),
            streak,
        }
    }
}

impl ScoreStore for MemoryScoreStore {
    fn upsert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.lock().await.players.insert(player.id.clone(), player);
            Ok(())
        })
    }

    fn find_player(&self, id: String) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.lock().await.players.get(&id).cloned()) })
    }

    fn register_games(
        &self,
        games: Vec<GameConfigEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut tables = inner.lock().await;
            for game in games {
                tables.games.insert(game.game_id.clone(), game);
            }
            Ok(())
        })
    }

    fn ensure_reset_time(
        &self,
        initial: SystemTime,
    ) -> BoxFuture<'static, StorageResult<ResetTimeEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut tables = inner.lock().await;
            let record = *tables.reset_time.get_or_insert(ResetTimeEntity {
                next_reset_at: initial,
                streak: 0,
            });
            Ok(record)
        })
    }

    fn find_reset_time(&self) -> BoxFuture<'static, StorageResult<Option<ResetTimeEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.lock().await.reset_time) })
    }

    fn find_score(
        &self,
        player_id: String,
        game_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .lock()
                .await
                .scores
                .get(&(player_id, game_id))
                .cloned())
        })
    }

    fn record_score(
        &self,
        player_id: String,
        game_id: String,
        score: i32,
        high: Option<RankOrder>,
    ) -> BoxFuture<'static, StorageResult<ScoreEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut tables = inner.lock().await;
            let entry = tables
                .scores
                .entry((player_id.clone(), game_id.clone()))
                .or_insert_with(|| ScoreEntity {
                    player_id,
                    game_id,
                    daily_score: None,
                    all_time_high: None,
                    updated_at: SystemTime::now(),
                });
            entry.daily_score = Some(score);
            if let Some(order) = high {
                entry.all_time_high = Some(order.best(entry.all_time_high, score));
            }
            entry.updated_at = SystemTime::now();
            Ok(entry.clone())
        })
    }

    fn close_window(
        &self,
        now: SystemTime,
        window: Duration,
    ) -> BoxFuture<'static, StorageResult<WindowClose>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.lock().await.close_window(now, window)) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn game(id: &str, order: RankOrder) -> GameConfigEntity {
        GameConfigEntity {
            game_id: id.into(),
            max_score: 10,
            rank_order: order,
        }
    }

    #[tokio::test]
    async fn record_score_keeps_the_better_high_and_latest_daily() {
        let store = MemoryScoreStore::new();
        store
            .record_score("p1".into(), "simon".into(), 5, Some(RankOrder::Desc))
            .await
            .unwrap();
        let score = store
            .record_score("p1".into(), "simon".into(), 3, Some(RankOrder::Desc))
            .await
            .unwrap();
        assert_eq!(score.daily_score, Some(3));
        assert_eq!(score.all_time_high, Some(5));

        let score = store
            .record_score("p1".into(), "num_guess".into(), 4, Some(RankOrder::Asc))
            .await
            .unwrap();
        assert_eq!(score.all_time_high, Some(4));
        let score = store
            .record_score("p1".into(), "num_guess".into(), 2, Some(RankOrder::Asc))
            .await
            .unwrap();
        assert_eq!(score.all_time_high, Some(2));
    }

    #[tokio::test]
    async fn daily_only_writes_leave_the_high_alone() {
        let store = MemoryScoreStore::new();
        let score = store
            .record_score("p1".into(), "num_guess".into(), 7, None)
            .await
            .unwrap();
        assert_eq!(score.daily_score, Some(7));
        assert_eq!(score.all_time_high, None);

        store
            .record_score("p1".into(), "num_guess".into(), 3, Some(RankOrder::Asc))
            .await
            .unwrap();
        let score = store
            .record_score("p1".into(), "num_guess".into(), 7, None)
            .await
            .unwrap();
        assert_eq!(score.daily_score, Some(7));
        assert_eq!(score.all_time_high, Some(3));
    }

    #[tokio::test]
    async fn ensure_reset_time_only_inserts_once() {
        let store = MemoryScoreStore::new();
        let start = SystemTime::UNIX_EPOCH + HOUR;
        let first = store.ensure_reset_time(start).await.unwrap();
        let second = store.ensure_reset_time(start + HOUR).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.streak, 0);
    }

    #[tokio::test]
    async fn close_window_truncates_advances_and_bumps_streak() {
        let store = MemoryScoreStore::new();
        let start = SystemTime::UNIX_EPOCH + HOUR;
        store
            .register_games(vec![game("simon", RankOrder::Desc)])
            .await
            .unwrap();
        store.ensure_reset_time(start).await.unwrap();
        store
            .record_score("p1".into(), "simon".into(), 4, Some(RankOrder::Desc))
            .await
            .unwrap();

        assert_eq!(
            store.close_window(start - HOUR, HOUR).await.unwrap(),
            WindowClose::NotDue
        );

        let WindowClose::Closed {
            scores,
            games,
            streak,
        } = store.close_window(start, HOUR).await.unwrap()
        else {
            panic!("expected the window to close");
        };
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].daily_score, Some(4));
        assert_eq!(games.len(), 1);
        assert_eq!(streak, 1);

        let reset = store.find_reset_time().await.unwrap().unwrap();
        assert_eq!(reset.next_reset_at, start + HOUR);
        let score = store
            .find_score("p1".into(), "simon".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(score.daily_or_zero(), 0);
        assert_eq!(score.all_time_high, Some(4));

        assert_eq!(
            store.close_window(start, HOUR).await.unwrap(),
            WindowClose::NotDue
        );
    }

    #[tokio::test]
    async fn empty_window_deletes_the_reset_record() {
        let store = MemoryScoreStore::new();
        assert_eq!(
            store
                .close_window(SystemTime::now(), HOUR)
                .await
                .unwrap(),
            WindowClose::Uninitialized
        );
        store.ensure_reset_time(SystemTime::UNIX_EPOCH).await.unwrap();
        assert_eq!(
            store.close_window(SystemTime::now(), HOUR).await.unwrap(),
            WindowClose::Empty
        );
        assert_eq!(store.find_reset_time().await.unwrap(), None);
    }

    #[tokio::test]
    async fn concurrent_closers_produce_a_single_winner() {
        let store = MemoryScoreStore::new();
        store.ensure_reset_time(SystemTime::UNIX_EPOCH).await.unwrap();
        store
            .record_score("p1".into(), "simon".into(), 1, Some(RankOrder::Desc))
            .await
            .unwrap();

        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(60);
        let attempts = (0..8).map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.close_window(now, HOUR).await.unwrap() })
        });
        let mut closed = 0;
        for attempt in attempts.collect::<Vec<_>>() {
            match attempt.await.unwrap() {
                WindowClose::Closed { streak, .. } => {
                    closed += 1;
                    assert_eq!(streak, 1);
                }
                WindowClose::NotDue => {}
                other => panic!("unexpected result {other:?}"),
            }
        }
        assert_eq!(closed, 1);
    }
}
