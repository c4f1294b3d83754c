use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;

/// Which end of the score range wins a leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RankOrder {
    /// Lower scores are better.
    Asc,
    /// Higher scores are better.
    Desc,
}

impl RankOrder {
    /// Whether `candidate` beats `current` under this rule.
    pub fn improves(self, candidate: i32, current: i32) -> bool {
        match self {
            RankOrder::Asc => candidate < current,
            RankOrder::Desc => candidate > current,
        }
    }

    /// Better of an optional record and a new score.
    pub fn best(self, current: Option<i32>, candidate: i32) -> i32 {
        match current {
            Some(current) if !self.improves(candidate, current) => current,
            _ => candidate,
        }
    }
}

/// Player known to the system, registered by the identity collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Stable identifier issued by the chat platform.
    pub id: String,
    /// Display name at the last login.
    pub username: String,
    /// Last login.
    pub updated_at: SystemTime,
}

/// Per-game configuration persisted so rankings can be computed without the
/// engines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameConfigEntity {
    /// Game identifier (`minesweeper`, `simon`, `num_guess`).
    pub game_id: String,
    /// Best achievable score.
    pub max_score: i32,
    /// Leaderboard direction.
    pub rank_order: RankOrder,
}

/// Daily and all-time score of one player for one game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntity {
    /// Player identifier.
    pub player_id: String,
    /// Game identifier.
    pub game_id: String,
    /// Score of the current window; `None` until the player finishes a round
    /// in this window.
    pub daily_score: Option<i32>,
    /// Best score ever, `None` until set.
    pub all_time_high: Option<i32>,
    /// Last write.
    pub updated_at: SystemTime,
}

impl ScoreEntity {
    /// Daily score as shown to players, 0 when unplayed.
    pub fn daily_or_zero(&self) -> i32 {
        self.daily_score.unwrap_or(0)
    }
}

/// Global reset schedule and announcement streak.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResetTimeEntity {
    /// When the current window closes.
    pub next_reset_at: SystemTime,
    /// Consecutive windows closed with at least one player.
    pub streak: u32,
}

/// Result of an attempt to close the current ranking window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowClose {
    /// No reset record exists yet.
    Uninitialized,
    /// The window is still open, or a concurrent caller closed it first.
    NotDue,
    /// Nobody played; the reset record was deleted.
    Empty,
    /// The window was closed.
    Closed {
        /// Scores of the closed window, as they were before truncation.
        scores: Vec<ScoreEntity>,
        /// Every registered game configuration.
        games: Vec<GameConfigEntity>,
        /// Streak after the increment.
        streak: u32,
    },
}
