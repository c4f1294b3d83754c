#![cfg(feature = "notifier")]

use std::{
    sync::{Arc, Mutex},
    time::{Duration, SystemTime},
};

use futures::future::BoxFuture;
use gauntlet_back::{
    config::AppConfig,
    dao::{
        models::{RankOrder, ResetTimeEntity},
        score_store::{MemoryScoreStore, ScoreStore},
    },
    notifier::{NotifierResult, RankingSink, RankingsClient, poll_once},
    routes,
    state::AppState,
};
use tokio::net::TcpListener;

#[derive(Default)]
struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl RankingSink for RecordingSink {
    fn deliver(&self, message: String) -> BoxFuture<'static, NotifierResult<()>> {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message);
        }
        Box::pin(async { Ok(()) })
    }
}

async fn serve(store: MemoryScoreStore) -> String {
    let state = AppState::new(AppConfig::default());
    store
        .register_games(state.engines().config_entities())
        .await
        .unwrap();
    state.set_score_store(Arc::new(store)).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, routes::router(state).into_make_service())
            .await
            .unwrap();
    });
    format!("http://{addr}/")
}

#[tokio::test]
async fn announces_a_closed_window_exactly_once() {
    let store = MemoryScoreStore::new();
    store
        .record_score("42".into(), "simon".into(), 7, Some(RankOrder::Desc))
        .await
        .unwrap();
    store
        .record_score("43".into(), "simon".into(), 3, Some(RankOrder::Desc))
        .await
        .unwrap();
    store
        .set_reset_time(Some(ResetTimeEntity {
            next_reset_at: SystemTime::now() - Duration::from_secs(1),
            streak: 4,
        }))
        .await;

    let client = RankingsClient::new(&serve(store).await).unwrap();
    let sink = RecordingSink::default();

    assert!(poll_once(&client, &sink).await.unwrap());
    assert!(!poll_once(&client, &sink).await.unwrap());

    let messages = sink.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("**Daily rankings** (streak: 5)"));
    assert!(messages[0].contains("__simon__ (max 20)\n1. <@42> 7\n2. <@43> 3\n"));
}

#[tokio::test]
async fn nothing_is_announced_before_anybody_logs_in() {
    let client = RankingsClient::new(&serve(MemoryScoreStore::new()).await).unwrap();
    assert_eq!(client.poll().await.unwrap(), None);
}
