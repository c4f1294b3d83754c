use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{score_store::ScoreStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Doubling delay capped at [`MAX_DELAY`].
struct Backoff {
    delay: Duration,
}

impl Backoff {
    fn new() -> Self {
        Self {
            delay: INITIAL_DELAY,
        }
    }

    fn reset(&mut self) {
        self.delay = INITIAL_DELAY;
    }

    async fn wait(&mut self) {
        sleep(self.delay).await;
        self.delay = (self.delay * 2).min(MAX_DELAY);
    }
}

/// Keep a score store installed, toggling degraded mode while it is unreachable.
///
/// `connect` is called again whenever an installed store cannot be revived
/// through [`ScoreStore::try_reconnect`].
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn ScoreStore>, StorageError>> + Send,
{
    let mut backoff = Backoff::new();

    loop {
        match connect().await {
            Ok(store) => {
                state.set_score_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                backoff.reset();

                watch(&state, store.as_ref()).await;
                warn!("exhausted storage reconnect attempts; connecting from scratch");
            }
            Err(err) => warn!(error = %err, "storage connection attempt failed"),
        }
        backoff.wait().await;
    }
}

/// Ping the store until it fails and cannot be reconnected.
async fn watch(state: &SharedState, store: &dyn ScoreStore) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                if state.is_degraded().await {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false).await;
                }
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                if !revive(state, store).await {
                    return;
                }
                state.update_degraded(false).await;
            }
        }
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

/// Retry [`ScoreStore::try_reconnect`] a few times; degraded mode starts with
/// the first failure.
async fn revive(state: &SharedState, store: &dyn ScoreStore) -> bool {
    let mut backoff = Backoff::new();
    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnected after health check failure");
                return true;
            }
            Err(err) => {
                warn!(attempt, error = %err, "storage reconnect attempt failed");
                if attempt == 0 {
                    state.update_degraded(true).await;
                }
                backoff.wait().await;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{
                GameConfigEntity, PlayerEntity, RankOrder, ResetTimeEntity, ScoreEntity,
                WindowClose,
            },
            storage::StorageResult,
        },
        state::AppState,
    };

    /// Fails `failures` health checks, then recovers on the first reconnect.
    struct FlakyStore {
        failures: AtomicU32,
    }

    fn down() -> StorageError {
        StorageError::unavailable("down".into(), std::io::Error::other("down"))
    }

    impl ScoreStore for FlakyStore {
        fn upsert_player(&self, _: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
        fn find_player(&self, _: String) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
            Box::pin(async { Ok(None) })
        }
        fn register_games(&self, _: Vec<GameConfigEntity>) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
        fn ensure_reset_time(
            &self,
            initial: std::time::SystemTime,
        ) -> BoxFuture<'static, StorageResult<ResetTimeEntity>> {
            Box::pin(async move {
                Ok(ResetTimeEntity {
                    next_reset_at: initial,
                    streak: 0,
                })
            })
        }
        fn find_reset_time(&self) -> BoxFuture<'static, StorageResult<Option<ResetTimeEntity>>> {
            Box::pin(async { Ok(None) })
        }
        fn find_score(
            &self,
            _: String,
            _: String,
        ) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>> {
            Box::pin(async { Ok(None) })
        }
        fn record_score(
            &self,
            _: String,
            _: String,
            _: i32,
            _: Option<RankOrder>,
        ) -> BoxFuture<'static, StorageResult<ScoreEntity>> {
            Box::pin(async { Err(down()) })
        }
        fn close_window(
            &self,
            _: std::time::SystemTime,
            _: Duration,
        ) -> BoxFuture<'static, StorageResult<WindowClose>> {
            Box::pin(async { Ok(WindowClose::Uninitialized) })
        }
        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            let failing = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            Box::pin(async move { if failing { Err(down()) } else { Ok(()) } })
        }
        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn installs_the_store_and_survives_a_failed_ping() {
        let state = AppState::new(AppConfig::default());
        let store: Arc<dyn ScoreStore> = Arc::new(FlakyStore {
            failures: AtomicU32::new(1),
        });
        let task = tokio::spawn(run(state.clone(), move || {
            let store = store.clone();
            async move { Ok(store) }
        }));

        sleep(HEALTH_POLL_INTERVAL * 3).await;
        assert!(state.score_store().await.is_some());
        assert!(!state.is_degraded().await);
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn stays_degraded_while_connecting_fails() {
        let state = AppState::new(AppConfig::default());
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();
        let task = tokio::spawn(run(state.clone(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<Arc<dyn ScoreStore>, _>(down()) }
        }));

        sleep(MAX_DELAY * 3).await;
        assert!(state.is_degraded().await);
        assert!(attempts.load(Ordering::SeqCst) >= 3);
        task.abort();
    }
}
