use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::dao::models::{GameConfigEntity, PlayerEntity, RankOrder, ResetTimeEntity, ScoreEntity};

/// `_id` of the single reset schedule document.
pub const RESET_TIME_ID: &str = "reset_time";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlayerDocument {
    #[serde(rename = "_id")]
    id: String,
    username: String,
    updated_at: DateTime,
}

impl From<PlayerEntity> for MongoPlayerDocument {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            username: value.username,
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoPlayerDocument> for PlayerEntity {
    fn from(value: MongoPlayerDocument) -> Self {
        Self {
            id: value.id,
            username: value.username,
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameConfigDocument {
    #[serde(rename = "_id")]
    game_id: String,
    max_score: i32,
    rank_order: RankOrder,
}

impl From<GameConfigEntity> for MongoGameConfigDocument {
    fn from(value: GameConfigEntity) -> Self {
        Self {
            game_id: value.game_id,
            max_score: value.max_score,
            rank_order: value.rank_order,
        }
    }
}

impl From<MongoGameConfigDocument> for GameConfigEntity {
    fn from(value: MongoGameConfigDocument) -> Self {
        Self {
            game_id: value.game_id,
            max_score: value.max_score,
            rank_order: value.rank_order,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoScoreDocument {
    player_id: String,
    game_id: String,
    #[serde(default)]
    daily_score: Option<i32>,
    #[serde(default)]
    all_time_high: Option<i32>,
    updated_at: DateTime,
}

impl From<MongoScoreDocument> for ScoreEntity {
    fn from(value: MongoScoreDocument) -> Self {
        Self {
            player_id: value.player_id,
            game_id: value.game_id,
            daily_score: value.daily_score,
            all_time_high: value.all_time_high,
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoResetTimeDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub next_reset_at: DateTime,
    pub streak: i64,
}

impl From<MongoResetTimeDocument> for ResetTimeEntity {
    fn from(value: MongoResetTimeDocument) -> Self {
        Self {
            next_reset_at: value.next_reset_at.to_system_time(),
            streak: value.streak.clamp(0, u32::MAX as i64) as u32,
        }
    }
}
