use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dao::models::ScoreEntity,
    games::{GameKind, InitView, MoveDelta, MoveStatus, Outcome},
};

/// Configuration of a freshly started round.
#[derive(Debug, Serialize, ToSchema)]
pub struct InitResponse {
    pub game: GameKind,
    /// Engine-specific configuration (grid size, colours, guess range).
    pub config: InitView,
    /// Best score of the player for this game, absent until one is set.
    pub all_time_high: Option<i32>,
}

/// Result of a single move.
#[derive(Debug, Serialize, ToSchema)]
pub struct MoveResponse {
    pub status: MoveStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<MoveDelta>,
    /// Final score, present when the move ended the round.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
}

impl From<Outcome> for MoveResponse {
    fn from(outcome: Outcome) -> Self {
        Self {
            status: outcome.status,
            delta: outcome.delta,
            score: outcome.final_score,
        }
    }
}

/// Daily and best score of the calling player for one game.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreResponse {
    pub game: GameKind,
    /// Score of the current window, 0 when not played yet.
    pub daily_score: i32,
    pub all_time_high: Option<i32>,
}

impl ScoreResponse {
    pub fn new(game: GameKind, score: Option<&ScoreEntity>) -> Self {
        Self {
            game,
            daily_score: score.map(ScoreEntity::daily_or_zero).unwrap_or(0),
            all_time_high: score.and_then(|score| score.all_time_high),
        }
    }
}
