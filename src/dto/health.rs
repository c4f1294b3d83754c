use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Rounds currently held in memory.
    pub active_rounds: usize,
}

impl HealthResponse {
    /// Operational system.
    pub fn ok(active_rounds: usize) -> Self {
        Self {
            status: "ok".to_string(),
            active_rounds,
        }
    }

    /// Running without a score store.
    pub fn degraded(active_rounds: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            active_rounds,
        }
    }
}
