use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{
    dto::rankings::RankingsResponse,
    error::AppError,
    services::ranking_service::{self, RankingPoll},
    state::SharedState,
};

/// Routes polled by the notifier.
pub fn router() -> Router<SharedState> {
    Router::new().route("/api/rankings", get(rankings))
}

/// Close the ranking window when due and return its leaderboard.
///
/// Answers 204 while the window is open or before anybody logged in. The
/// snapshot is handed out to exactly one caller per window.
#[utoipa::path(
    get,
    path = "/api/rankings",
    tag = "rankings",
    responses(
        (status = 200, description = "Window closed", body = RankingsResponse),
        (status = 204, description = "Nothing to announce yet")
    )
)]
pub async fn rankings(State(state): State<SharedState>) -> Result<Response, AppError> {
    match ranking_service::poll_rankings(&state).await? {
        RankingPoll::Ready(snapshot) => Ok(Json(snapshot).into_response()),
        RankingPoll::NotDue | RankingPoll::Uninitialized => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
