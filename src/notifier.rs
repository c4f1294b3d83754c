//! Client side of the leaderboard: polls `/api/rankings` and republishes each
//! snapshot to the chat platform.

use std::{env, fmt::Write as _, sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::dto::rankings::RankingsResponse;

const DEFAULT_POLL_SECS: u64 = 20;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Convenient result alias returning [`NotifierError`] failures.
pub type NotifierResult<T> = Result<T, NotifierError>;

/// Failures of a single poll or delivery. None of them stop the loop.
#[derive(Debug, Error)]
pub enum NotifierError {
    /// Required environment variable is missing.
    #[error("missing environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// Building the HTTP client failed.
    #[error("failed to build HTTP client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The rankings endpoint could not be reached.
    #[error("failed to poll `{url}`")]
    Poll {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The rankings endpoint answered with an unexpected status.
    #[error("unexpected status {status} from `{url}`")]
    PollStatus { url: String, status: StatusCode },
    /// The snapshot could not be decoded.
    #[error("failed to decode rankings from `{url}`")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The webhook could not be reached.
    #[error("failed to deliver announcement")]
    Deliver {
        #[source]
        source: reqwest::Error,
    },
    /// The webhook rejected the announcement.
    #[error("webhook rejected announcement with status {status}")]
    DeliverStatus { status: StatusCode },
}

/// Settings of the notifier binary.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Base URL of the backend, e.g. `http://localhost:8080`.
    pub api_url: String,
    /// Chat webhook; announcements are only logged when absent.
    pub webhook_url: Option<String>,
    /// Delay between two polls.
    pub poll_interval: Duration,
}

impl NotifierConfig {
    /// Read `GAUNTLET_API_URL`, `GAUNTLET_WEBHOOK_URL` and `GAUNTLET_POLL_SECS`.
    pub fn from_env() -> NotifierResult<Self> {
        let api_url = env::var("GAUNTLET_API_URL").map_err(|_| NotifierError::MissingEnvVar {
            var: "GAUNTLET_API_URL",
        })?;
        let webhook_url = env::var("GAUNTLET_WEBHOOK_URL")
            .ok()
            .filter(|url| !url.is_empty());
        let poll_secs = env::var("GAUNTLET_POLL_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_POLL_SECS);

        Ok(Self {
            api_url,
            webhook_url,
            poll_interval: Duration::from_secs(poll_secs),
        })
    }
}

fn http_client() -> NotifierResult<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|source| NotifierError::ClientBuilder { source })
}

/// Reads the rankings endpoint.
#[derive(Clone)]
pub struct RankingsClient {
    client: Client,
    url: Arc<str>,
}

impl RankingsClient {
    /// Client for the backend at `base_url`.
    pub fn new(base_url: &str) -> NotifierResult<Self> {
        let url = format!("{}/api/rankings", base_url.trim_end_matches('/'));
        Ok(Self {
            client: http_client()?,
            url: Arc::from(url),
        })
    }

    /// `Some` when this poll closed a window, `None` when there is nothing to
    /// announce.
    pub async fn poll(&self) -> NotifierResult<Option<RankingsResponse>> {
        let url = self.url.to_string();
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|source| NotifierError::Poll {
                url: url.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => response
                .json::<RankingsResponse>()
                .await
                .map(Some)
                .map_err(|source| NotifierError::Decode { url, source }),
            StatusCode::NO_CONTENT => Ok(None),
            status => Err(NotifierError::PollStatus { url, status }),
        }
    }
}

/// Destination of formatted announcements.
pub trait RankingSink: Send + Sync {
    /// Publish one formatted announcement.
    fn deliver(&self, message: String) -> BoxFuture<'static, NotifierResult<()>>;
}

/// Writes announcements to the log.
pub struct LogSink;

impl RankingSink for LogSink {
    fn deliver(&self, message: String) -> BoxFuture<'static, NotifierResult<()>> {
        Box::pin(async move {
            info!(%message, "rankings announcement");
            Ok(())
        })
    }
}

#[derive(Serialize)]
struct WebhookMessage {
    content: String,
}

/// Posts announcements to a chat webhook as `{"content": ...}`.
#[derive(Clone)]
pub struct WebhookSink {
    client: Client,
    url: Arc<str>,
}

impl WebhookSink {
    /// Sink posting to `url`.
    pub fn new(url: &str) -> NotifierResult<Self> {
        Ok(Self {
            client: http_client()?,
            url: Arc::from(url),
        })
    }
}

impl RankingSink for WebhookSink {
    fn deliver(&self, message: String) -> BoxFuture<'static, NotifierResult<()>> {
        let sink = self.clone();
        Box::pin(async move {
            let response = sink
                .client
                .post(sink.url.as_ref())
                .json(&WebhookMessage { content: message })
                .send()
                .await
                .map_err(|source| NotifierError::Deliver { source })?;

            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(NotifierError::DeliverStatus { status })
            }
        })
    }
}

/// Render a snapshot as chat text, one block per game.
pub fn format_announcement(snapshot: &RankingsResponse) -> String {
    let mut out = format!("**Daily rankings** (streak: {})\n", snapshot.streak);
    for ranking in &snapshot.rankings {
        let _ = write!(out, "\n__{}__", ranking.game);
        if let Some(max) = snapshot.max_scores.get(&ranking.game) {
            let _ = write!(out, " (max {max})");
        }
        out.push('\n');
        for player in &ranking.players {
            let _ = writeln!(out, "{}. <@{}> {}", player.rank, player.id, player.score);
        }
    }
    out
}

/// Poll once and deliver the snapshot if there is one. Returns whether
/// something was announced.
pub async fn poll_once(client: &RankingsClient, sink: &dyn RankingSink) -> NotifierResult<bool> {
    let Some(snapshot) = client.poll().await? else {
        debug!("no rankings to announce");
        return Ok(false);
    };
    info!(
        streak = snapshot.streak,
        games = snapshot.rankings.len(),
        "announcing rankings"
    );
    sink.deliver(format_announcement(&snapshot)).await?;
    Ok(true)
}

/// Poll forever; errors are logged and retried on the next tick.
pub async fn run(client: RankingsClient, sink: Arc<dyn RankingSink>, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(err) = poll_once(&client, sink.as_ref()).await {
            warn!(error = %err, "rankings poll failed");
        }
    }
}
