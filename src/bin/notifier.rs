//! Polls the backend for closed ranking windows and posts them to the chat webhook.

use std::sync::Arc;

use anyhow::Context;
use gauntlet_back::notifier::{
    self, LogSink, NotifierConfig, RankingSink, RankingsClient, WebhookSink,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = NotifierConfig::from_env().context("reading notifier configuration")?;
    let client = RankingsClient::new(&config.api_url).context("building rankings client")?;
    let sink: Arc<dyn RankingSink> = match config.webhook_url.as_deref() {
        Some(url) => Arc::new(WebhookSink::new(url).context("building webhook client")?),
        None => {
            info!("GAUNTLET_WEBHOOK_URL not set; announcements are only logged");
            Arc::new(LogSink)
        }
    };

    info!(
        api = %config.api_url,
        every_secs = config.poll_interval.as_secs(),
        "starting rankings notifier"
    );
    tokio::select! {
        _ = notifier::run(client, sink, config.poll_interval) => {},
        _ = tokio::signal::ctrl_c() => info!("shutting down notifier"),
    }
    Ok(())
}
