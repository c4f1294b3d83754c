use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report degraded mode and the number of rounds in memory, logging storage issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_score_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    let active_rounds = state.sessions().len();
    if state.is_degraded().await {
        HealthResponse::degraded(active_rounds)
    } else {
        HealthResponse::ok(active_rounds)
    }
}
