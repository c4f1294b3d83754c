use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One line of a game leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RankedPlayer {
    pub id: String,
    pub score: i32,
    /// Dense rank, ties share a rank.
    pub rank: u32,
}

/// Leaderboard of one game, best first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GameRanking {
    pub game: String,
    pub players: Vec<RankedPlayer>,
}

/// Snapshot produced once per window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RankingsResponse {
    pub rankings: Vec<GameRanking>,
    /// Best achievable score per game id.
    #[schema(value_type = Object)]
    pub max_scores: IndexMap<String, i32>,
    /// Consecutive windows with at least one player, this one included.
    pub streak: u32,
}
