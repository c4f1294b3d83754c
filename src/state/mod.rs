mod session;

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, watch};

use crate::{
    config::AppConfig, dao::score_store::ScoreStore, error::ServiceError, games::Engines,
};

pub use self::session::{PlayerId, SessionRegistry};

pub type SharedState = Arc<AppState>;

/// Central application state: the score store handle, the engines and every
/// in-progress round.
pub struct AppState {
    score_store: RwLock<Option<Arc<dyn ScoreStore>>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
    engines: Engines,
    sessions: SessionRegistry,
    ranking_gate: Mutex<()>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let engines = Engines::from_config(&config);
        Arc::new(Self {
            score_store: RwLock::new(None),
            degraded: degraded_tx,
            config,
            engines,
            sessions: SessionRegistry::default(),
            ranking_gate: Mutex::new(()),
        })
    }

    /// Obtain a handle to the current score store, if one is installed.
    pub async fn score_store(&self) -> Option<Arc<dyn ScoreStore>> {
        let guard = self.score_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current score store or [`ServiceError::Degraded`] when none is installed.
    pub async fn require_score_store(&self) -> Result<Arc<dyn ScoreStore>, ServiceError> {
        self.score_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new score store implementation and leave degraded mode.
    pub async fn set_score_store(&self, store: Arc<dyn ScoreStore>) {
        {
            let mut guard = self.score_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current score store and enter degraded mode.
    pub async fn clear_score_store(&self) {
        {
            let mut guard = self.score_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn engines(&self) -> &Engines {
        &self.engines
    }

    /// In-progress rounds keyed by player and game.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Serialises ranking polls within this process.
    pub fn ranking_gate(&self) -> &Mutex<()> {
        &self.ranking_gate
    }
}
