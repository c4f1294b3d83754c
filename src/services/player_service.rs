use std::time::SystemTime;

use tracing::info;

use crate::{
    dao::models::PlayerEntity,
    dto::players::{LoginRequest, LoginResponse},
    error::ServiceError,
    state::SharedState,
};

/// Register an authenticated player and make sure the reset schedule exists.
///
/// The first login system-wide starts the ranking window.
pub async fn login(state: &SharedState, request: LoginRequest) -> Result<LoginResponse, ServiceError> {
    let store = state.require_score_store().await?;
    let LoginRequest { id, username } = request;
    let now = SystemTime::now();

    store
        .upsert_player(PlayerEntity {
            id: id.clone(),
            username: username.clone(),
            updated_at: now,
        })
        .await?;

    let reset = store
        .ensure_reset_time(now + state.config().rankings.window)
        .await?;

    info!(player = %id, streak = reset.streak, "player logged in");
    Ok(LoginResponse::new(id, username, reset))
}
