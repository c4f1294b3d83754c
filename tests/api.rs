use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use gauntlet_back::{
    config::AppConfig,
    dao::{
        models::ResetTimeEntity,
        score_store::{MemoryScoreStore, ScoreStore},
    },
    routes,
    state::{AppState, SharedState},
};
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    store: MemoryScoreStore,
    state: SharedState,
}

impl TestApp {
    async fn new() -> Self {
        let state = AppState::new(AppConfig::default());
        let store = MemoryScoreStore::new();
        store
            .register_games(state.engines().config_entities())
            .await
            .unwrap();
        state.set_score_store(Arc::new(store.clone())).await;
        Self {
            router: routes::router(state.clone()),
            store,
            state,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        player: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(player) = player {
            request = request.header("x-player-id", player);
        }
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login(&self, id: &str) {
        let (status, body) = self
            .send(
                Method::POST,
                "/players/login",
                None,
                Some(json!({"id": id, "username": format!("{id}-name")})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    async fn play(&self, player: &str, game: &str, payload: Value) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            &format!("/games/{game}/move"),
            Some(player),
            Some(payload),
        )
        .await
    }

    async fn init(&self, player: &str, game: &str) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                &format!("/games/{game}/init"),
                Some(player),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }

    /// Binary search the secret; returns the final score.
    async fn finish_num_guess(&self, player: &str) -> i64 {
        self.init(player, "num_guess").await;
        let (mut low, mut high) = (1, 100);
        loop {
            let guess = (low + high) / 2;
            let (status, body) = self.play(player, "num_guess", json!({"guess": guess})).await;
            assert_eq!(status, StatusCode::OK, "{body}");
            match body["status"].as_str().unwrap() {
                "won" | "game_over" => return body["score"].as_i64().unwrap(),
                "continue" => match body["delta"]["hint"].as_str().unwrap() {
                    "higher" => low = guess + 1,
                    "lower" => high = guess - 1,
                    other => panic!("unexpected hint {other}"),
                },
                other => panic!("unexpected status {other}"),
            }
        }
    }

    /// Lose a simon round on the first choice; scores 0.
    async fn lose_simon(&self, player: &str) {
        self.init(player, "simon").await;
        let (_, body) = self
            .play(player, "simon", json!({"action": "sequence"}))
            .await;
        let first = body["delta"]["sequence"][0].as_str().unwrap().to_owned();
        let wrong = ["r", "g", "b", "o"]
            .into_iter()
            .find(|colour| *colour != first)
            .unwrap();
        let (status, body) = self
            .play(player, "simon", json!({"action": "verify", "choice": wrong}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "game_over");
        assert_eq!(body["score"], 0);
    }

    async fn expire_window(&self) {
        let current = self.store.find_reset_time().await.unwrap().unwrap();
        self.store
            .set_reset_time(Some(ResetTimeEntity {
                next_reset_at: SystemTime::now() - Duration::from_secs(1),
                ..current
            }))
            .await;
    }
}

#[tokio::test]
async fn rankings_are_empty_before_anybody_logs_in() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/api/rankings", None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn login_starts_a_window_that_is_not_due_yet() {
    let app = TestApp::new().await;
    app.login("alice").await;

    let reset = app.store.find_reset_time().await.unwrap().unwrap();
    assert!(reset.next_reset_at > SystemTime::now() + Duration::from_secs(7000));
    assert_eq!(reset.streak, 0);

    let (status, _) = app.send(Method::GET, "/api/rankings", None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn login_payloads_are_validated() {
    let app = TestApp::new().await;
    let (status, _) = app
        .send(
            Method::POST,
            "/players/login",
            None,
            Some(json!({"id": "not an id", "username": "x"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            "/players/login",
            None,
            Some(json!({"id": "alice", "username": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn game_routes_need_a_known_player_and_game() {
    let app = TestApp::new().await;
    app.login("alice").await;

    let (status, _) = app
        .send(Method::POST, "/games/simon/init", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(Method::POST, "/games/simon/init", Some("mallory"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(Method::POST, "/games/chess/init", Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("chess"));
}

#[tokio::test]
async fn init_returns_the_engine_configuration() {
    let app = TestApp::new().await;
    app.login("alice").await;

    let body = app.init("alice", "minesweeper").await;
    assert_eq!(body["game"], "minesweeper");
    assert_eq!(body["config"], json!({"ndim": 8, "flags": 10}));
    assert_eq!(body["all_time_high"], Value::Null);

    let body = app.init("alice", "simon").await;
    assert_eq!(body["config"]["max_sequence"], 20);

    let body = app.init("alice", "num_guess").await;
    assert_eq!(body["config"], json!({"min": 1, "max": 100, "max_turns": 6}));
}

#[tokio::test]
async fn first_minesweeper_reveal_is_safe() {
    let app = TestApp::new().await;
    app.login("alice").await;
    app.init("alice", "minesweeper").await;

    let (status, body) = app
        .play(
            "alice",
            "minesweeper",
            json!({"action": "reveal", "row": 3, "col": 4}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let first_status = body["status"].clone();
    assert!(matches!(first_status.as_str(), Some("continue" | "won")));
    let revealed = body["delta"]["revealed"].as_array().unwrap();
    assert!(
        revealed
            .iter()
            .any(|cell| cell["row"] == 3 && cell["col"] == 4)
    );

    let (status, body) = app
        .play(
            "alice",
            "minesweeper",
            json!({"action": "reveal", "row": 8, "col": 0}),
        )
        .await;
    if first_status == "won" {
        assert_eq!(body["status"], "finished");
    } else {
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn out_of_turn_simon_moves_conflict() {
    let app = TestApp::new().await;
    app.login("alice").await;
    app.init("alice", "simon").await;

    let (status, _) = app
        .play("alice", "simon", json!({"action": "verify", "choice": "r"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .play("alice", "simon", json!({"action": "sequence"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .play("alice", "simon", json!({"action": "verify", "choice": "purple"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn finished_rounds_are_recorded_and_can_be_resubmitted() {
    let app = TestApp::new().await;
    app.login("alice").await;
    app.init("alice", "num_guess").await;

    let (status, _) = app
        .send(Method::POST, "/games/num_guess/score", Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let score = app.finish_num_guess("alice").await;
    assert!((1..=7).contains(&score));
    // Running out of guesses (score 7) never sets the all-time high.
    let high = if score <= 6 { json!(score) } else { Value::Null };

    let (status, body) = app
        .send(Method::GET, "/games/num_guess/scores", Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["daily_score"], score);
    assert_eq!(body["all_time_high"], high);

    let (status, body) = app
        .send(Method::POST, "/games/num_guess/score", Some("alice"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["daily_score"], score);

    let (_, body) = app.play("alice", "num_guess", json!({"guess": 50})).await;
    assert_eq!(body["status"], "finished");

    let body = app.init("alice", "num_guess").await;
    assert_eq!(body["all_time_high"], high);
}

#[tokio::test]
async fn rankings_are_announced_once_per_window() {
    let app = TestApp::new().await;
    app.login("alice").await;
    app.login("bob").await;
    app.login("carol").await;

    let alice_score = app.finish_num_guess("alice").await;
    app.lose_simon("bob").await;
    app.lose_simon("carol").await;

    let (status, _) = app.send(Method::GET, "/api/rankings", None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    app.expire_window().await;
    let (status, body) = app.send(Method::GET, "/api/rankings", None, None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["streak"], 1);
    assert_eq!(
        body["max_scores"],
        json!({"minesweeper": 10, "simon": 20, "num_guess": 7})
    );
    assert_eq!(
        body["rankings"],
        json!([
            {"game": "simon", "players": [
                {"id": "bob", "score": 0, "rank": 1},
                {"id": "carol", "score": 0, "rank": 1},
            ]},
            {"game": "num_guess", "players": [
                {"id": "alice", "score": alice_score, "rank": 1},
            ]},
        ])
    );

    let (status, _) = app.send(Method::GET, "/api/rankings", None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app
        .send(Method::GET, "/games/num_guess/scores", Some("alice"), None)
        .await;
    assert_eq!(body["daily_score"], 0);
    if alice_score <= 6 {
        assert_eq!(body["all_time_high"], alice_score);
    }
}

#[tokio::test]
async fn concurrent_polls_see_a_single_snapshot() {
    let app = TestApp::new().await;
    app.login("alice").await;
    app.lose_simon("alice").await;
    app.expire_window().await;

    let polls = (0..6).map(|_| {
        let router = app.router.clone();
        tokio::spawn(async move {
            let request = Request::builder()
                .uri("/api/rankings")
                .body(Body::empty())
                .unwrap();
            router.oneshot(request).await.unwrap().status()
        })
    });
    let mut statuses = Vec::new();
    for poll in polls.collect::<Vec<_>>() {
        statuses.push(poll.await.unwrap());
    }

    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::OK).count(),
        1
    );
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == StatusCode::NO_CONTENT)
            .count(),
        5
    );
    let reset = app.store.find_reset_time().await.unwrap().unwrap();
    assert_eq!(reset.streak, 1);
}

#[tokio::test]
async fn an_empty_window_clears_the_schedule_until_the_next_login() {
    let app = TestApp::new().await;
    app.login("alice").await;
    app.expire_window().await;

    let (status, _) = app.send(Method::GET, "/api/rankings", None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.store.find_reset_time().await.unwrap(), None);

    app.login("alice").await;
    let reset = app.store.find_reset_time().await.unwrap().unwrap();
    assert_eq!(reset.streak, 0);
}

#[tokio::test]
async fn degraded_mode_rejects_storage_operations() {
    let app = TestApp::new().await;
    app.state.clear_score_store().await;

    let (status, body) = app.send(Method::GET, "/healthcheck", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");

    let (status, _) = app
        .send(
            Method::POST,
            "/players/login",
            None,
            Some(json!({"id": "alice", "username": "alice"})),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = app.send(Method::GET, "/api/rankings", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
