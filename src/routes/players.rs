use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::players::{LoginRequest, LoginResponse},
    error::AppError,
    services::player_service,
    state::SharedState,
};

/// Routes used by the identity collaborator.
pub fn router() -> Router<SharedState> {
    Router::new().route("/players/login", post(login))
}

/// Register an authenticated player; the first login starts the ranking window.
#[utoipa::path(
    post,
    path = "/players/login",
    tag = "players",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Player registered", body = LoginResponse),
        (status = 400, description = "Invalid identifier or username"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<LoginRequest>>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = player_service::login(&state, payload).await?;
    Ok(Json(response))
}
