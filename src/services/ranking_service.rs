//! Leaderboard announcements: one destructive read per window.

use std::{collections::HashMap, time::SystemTime};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::{
    dao::models::{GameConfigEntity, RankOrder, ScoreEntity, WindowClose},
    dto::rankings::{GameRanking, RankedPlayer, RankingsResponse},
    error::ServiceError,
    games::GameKind,
    state::SharedState,
};

/// Result of a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankingPoll {
    /// Nobody logged in since the last empty window.
    Uninitialized,
    /// The window is still open, was just closed by someone else, or closed
    /// without players.
    NotDue,
    /// This call closed the window.
    Ready(RankingsResponse),
}

/// Close the current window if it is due and return its leaderboard.
pub async fn poll_rankings(state: &SharedState) -> Result<RankingPoll, ServiceError> {
    poll_rankings_at(state, SystemTime::now()).await
}

/// [`poll_rankings`] with an explicit clock.
pub async fn poll_rankings_at(
    state: &SharedState,
    now: SystemTime,
) -> Result<RankingPoll, ServiceError> {
    let store = state.require_score_store().await?;
    let _gate = state.ranking_gate().lock().await;

    let window = state.config().rankings.window;
    match store.close_window(now, window).await? {
        WindowClose::Uninitialized => Ok(RankingPoll::Uninitialized),
        WindowClose::NotDue => {
            debug!("ranking window not due");
            Ok(RankingPoll::NotDue)
        }
        WindowClose::Empty => {
            let evicted = state.sessions().evict_finished();
            info!(evicted, "ranking window elapsed without players; schedule cleared");
            Ok(RankingPoll::NotDue)
        }
        WindowClose::Closed {
            scores,
            games,
            streak,
        } => {
            let snapshot = build_snapshot(scores, games, streak);
            let evicted = state.sessions().evict_finished();
            info!(
                streak,
                games = snapshot.rankings.len(),
                evicted,
                "ranking window closed"
            );
            Ok(RankingPoll::Ready(snapshot))
        }
    }
}

/// Dense ranking, best score first; ties share a rank and are listed by id.
pub fn dense_rank(mut entries: Vec<(String, i32)>, order: RankOrder) -> Vec<RankedPlayer> {
    entries.sort_by(|(a_id, a_score), (b_id, b_score)| {
        let by_score = match order {
            RankOrder::Asc => a_score.cmp(b_score),
            RankOrder::Desc => b_score.cmp(a_score),
        };
        by_score.then_with(|| a_id.cmp(b_id))
    });

    let mut rank = 0;
    let mut previous = None;
    entries
        .into_iter()
        .map(|(id, score)| {
            if previous != Some(score) {
                rank += 1;
                previous = Some(score);
            }
            RankedPlayer { id, score, rank }
        })
        .collect()
}

fn build_snapshot(
    scores: Vec<ScoreEntity>,
    mut games: Vec<GameConfigEntity>,
    streak: u32,
) -> RankingsResponse {
    games.sort_by_key(|game| display_position(&game.game_id));

    let mut by_game: IndexMap<String, Vec<(String, i32)>> = IndexMap::new();
    for game in &games {
        by_game.insert(game.game_id.clone(), Vec::new());
    }
    for score in scores {
        let Some(daily) = score.daily_score else {
            continue;
        };
        by_game
            .entry(score.game_id)
            .or_default()
            .push((score.player_id, daily));
    }

    let orders: HashMap<&str, RankOrder> = games
        .iter()
        .map(|game| (game.game_id.as_str(), game.rank_order))
        .collect();
    let rankings = by_game
        .into_iter()
        .filter(|(_, entries)| !entries.is_empty())
        .map(|(game, entries)| {
            let order = orders
                .get(game.as_str())
                .copied()
                .unwrap_or(RankOrder::Desc);
            GameRanking {
                players: dense_rank(entries, order),
                game,
            }
        })
        .collect();

    let max_scores = games
        .into_iter()
        .map(|game| (game.game_id, game.max_score))
        .collect();

    RankingsResponse {
        rankings,
        max_scores,
        streak,
    }
}

/// Built-in games first, in their usual order.
fn display_position(game_id: &str) -> usize {
    GameKind::ALL
        .iter()
        .position(|kind| kind.as_str() == game_id)
        .unwrap_or(GameKind::ALL.len())
}
