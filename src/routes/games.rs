use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde_json::Value;

use crate::{
    dto::games::{InitResponse, MoveResponse, ScoreResponse},
    error::AppError,
    games::GameKind,
    routes::Caller,
    services::engine_service,
    state::SharedState,
};

/// Routes driving a player's rounds.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games/{game}/init", post(init_round))
        .route("/games/{game}/move", post(play_move))
        .route("/games/{game}/score", post(submit_score))
        .route("/games/{game}/scores", get(player_score))
}

/// Start a new round, discarding the previous one.
#[utoipa::path(
    post,
    path = "/games/{game}/init",
    tag = "games",
    params(
        ("game" = GameKind, Path, description = "Game identifier"),
        ("x-player-id" = String, Header, description = "Authenticated player")
    ),
    responses(
        (status = 200, description = "Round started", body = InitResponse),
        (status = 401, description = "Unknown or missing player"),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn init_round(
    State(state): State<SharedState>,
    Path(game): Path<String>,
    Caller(player): Caller,
) -> Result<Json<InitResponse>, AppError> {
    let kind: GameKind = game.parse()?;
    Ok(Json(engine_service::init_round(&state, player, kind).await?))
}

/// Play one move of the current round.
#[utoipa::path(
    post,
    path = "/games/{game}/move",
    tag = "games",
    params(
        ("game" = GameKind, Path, description = "Game identifier"),
        ("x-player-id" = String, Header, description = "Authenticated player")
    ),
    request_body(content = serde_json::Value, description = "Engine-specific move"),
    responses(
        (status = 200, description = "Move applied", body = MoveResponse),
        (status = 400, description = "Malformed or out-of-range move"),
        (status = 409, description = "No round in progress or out-of-turn move")
    )
)]
pub async fn play_move(
    State(state): State<SharedState>,
    Path(game): Path<String>,
    Caller(player): Caller,
    Json(payload): Json<Value>,
) -> Result<Json<MoveResponse>, AppError> {
    let kind: GameKind = game.parse()?;
    Ok(Json(
        engine_service::play_move(&state, player, kind, payload).await?,
    ))
}

/// Persist the score of the finished round again.
#[utoipa::path(
    post,
    path = "/games/{game}/score",
    tag = "games",
    params(
        ("game" = GameKind, Path, description = "Game identifier"),
        ("x-player-id" = String, Header, description = "Authenticated player")
    ),
    responses(
        (status = 200, description = "Score recorded", body = ScoreResponse),
        (status = 409, description = "Round missing or not finished")
    )
)]
pub async fn submit_score(
    State(state): State<SharedState>,
    Path(game): Path<String>,
    Caller(player): Caller,
) -> Result<Json<ScoreResponse>, AppError> {
    let kind: GameKind = game.parse()?;
    Ok(Json(
        engine_service::submit_score(&state, player, kind).await?,
    ))
}

/// Daily and all-time score of the caller.
#[utoipa::path(
    get,
    path = "/games/{game}/scores",
    tag = "games",
    params(
        ("game" = GameKind, Path, description = "Game identifier"),
        ("x-player-id" = String, Header, description = "Authenticated player")
    ),
    responses(
        (status = 200, description = "Current scores", body = ScoreResponse)
    )
)]
pub async fn player_score(
    State(state): State<SharedState>,
    Path(game): Path<String>,
    Caller(player): Caller,
) -> Result<Json<ScoreResponse>, AppError> {
    let kind: GameKind = game.parse()?;
    Ok(Json(
        engine_service::player_score(&state, player, kind).await?,
    ))
}
