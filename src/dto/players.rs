use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::ResetTimeEntity,
    dto::{format_system_time, validation::validate_player_id},
};

/// Player handed over by the identity collaborator after authentication.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "validate_player_id"))]
    pub id: String,
    #[validate(length(min = 1, max = 100))]
    pub username: String,
}

/// Registration acknowledgement with the current reset schedule.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub id: String,
    pub username: String,
    /// RFC 3339 timestamp of the next leaderboard announcement.
    pub next_reset_at: String,
    pub streak: u32,
}

impl LoginResponse {
    pub fn new(id: String, username: String, reset: ResetTimeEntity) -> Self {
        Self {
            id,
            username,
            next_reset_at: format_system_time(reset.next_reset_at),
            streak: reset.streak,
        }
    }
}
