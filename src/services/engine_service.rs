//! Round lifecycle: start, moves, score write-through.
//!
//! Engines run synchronously while the player's registry entry is held; the
//! entry is released before any storage call.

use rand::Rng;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    dao::models::ScoreEntity,
    dto::games::{InitResponse, MoveResponse, ScoreResponse},
    error::ServiceError,
    games::{GameEngine, GameKind, InitView, Outcome, Round},
    state::{PlayerId, SessionRegistry, SharedState},
};

/// Start a fresh round, replacing any round the player had for this game.
pub async fn init_round(
    state: &SharedState,
    player: PlayerId,
    kind: GameKind,
) -> Result<InitResponse, ServiceError> {
    let store = state.require_score_store().await?;
    if store.find_player(player.to_string()).await?.is_none() {
        return Err(ServiceError::Unauthorized(format!(
            "player `{player}` is not registered"
        )));
    }

    let (round, config) = {
        let engines = state.engines();
        let mut rng = rand::rng();
        match kind {
            GameKind::Minesweeper => start(&engines.minesweeper, &mut rng),
            GameKind::Simon => start(&engines.simon, &mut rng),
            GameKind::NumGuess => start(&engines.num_guess, &mut rng),
        }
    };
    state.sessions().start(player.clone(), round);
    info!(player = %player, game = %kind, "round started");

    let score = store
        .find_score(player.into(), kind.as_str().to_owned())
        .await?;
    Ok(InitResponse {
        game: kind,
        config,
        all_time_high: score.and_then(|score| score.all_time_high),
    })
}

/// Apply one move; a terminal outcome is written through to the score store.
pub async fn play_move(
    state: &SharedState,
    player: PlayerId,
    kind: GameKind,
    payload: Value,
) -> Result<MoveResponse, ServiceError> {
    let engines = state.engines();
    let sessions = state.sessions();
    let outcome = match kind {
        GameKind::Minesweeper => play_with(&engines.minesweeper, sessions, &player, payload)?,
        GameKind::Simon => play_with(&engines.simon, sessions, &player, payload)?,
        GameKind::NumGuess => play_with(&engines.num_guess, sessions, &player, payload)?,
    };
    debug!(player = %player, game = %kind, status = ?outcome.status, "move played");

    if let Some(score) = outcome.final_score {
        let recorded = record(state, player, kind, score, outcome.sets_high).await?;
        info!(
            player = %recorded.player_id,
            game = %kind,
            status = ?outcome.status,
            score,
            all_time_high = ?recorded.all_time_high,
            "round finished"
        );
    }

    Ok(outcome.into())
}

/// Write the finished round's score again, e.g. after a storage outage hid
/// the automatic write-through.
pub async fn submit_score(
    state: &SharedState,
    player: PlayerId,
    kind: GameKind,
) -> Result<ScoreResponse, ServiceError> {
    let (score, sets_high) = state
        .sessions()
        .with_round(&player, kind, |round| {
            round.final_score().map(|score| (score, round.sets_high()))
        })
        .ok_or_else(|| no_round(kind))?
        .ok_or_else(|| ServiceError::InvalidState(format!("{kind} round is not finished")))?;

    let recorded = record(state, player, kind, score, sets_high).await?;
    Ok(ScoreResponse::new(kind, Some(&recorded)))
}

/// Daily and all-time score of the player for one game.
pub async fn player_score(
    state: &SharedState,
    player: PlayerId,
    kind: GameKind,
) -> Result<ScoreResponse, ServiceError> {
    let store = state.require_score_store().await?;
    let score = store
        .find_score(player.into(), kind.as_str().to_owned())
        .await?;
    Ok(ScoreResponse::new(kind, score.as_ref()))
}

fn start<E: GameEngine, R: Rng + ?Sized>(engine: &E, rng: &mut R) -> (Round, InitView) {
    let (round, view) = engine.init(rng);
    (E::wrap(round), view)
}

fn play_with<E: GameEngine>(
    engine: &E,
    sessions: &SessionRegistry,
    player: &PlayerId,
    payload: Value,
) -> Result<Outcome, ServiceError> {
    let mv = engine.parse_move(payload)?;
    sessions
        .with_round(player, E::KIND, |round| {
            let round = E::round_mut(round).ok_or_else(|| no_round(E::KIND))?;
            let mut rng = rand::rng();
            engine.play(round, mv, &mut rng).map_err(ServiceError::from)
        })
        .ok_or_else(|| no_round(E::KIND))?
}

fn no_round(kind: GameKind) -> ServiceError {
    ServiceError::InvalidState(format!("no {kind} round in progress; call init first"))
}

async fn record(
    state: &SharedState,
    player: PlayerId,
    kind: GameKind,
    score: i32,
    sets_high: bool,
) -> Result<ScoreEntity, ServiceError> {
    let store = state.require_score_store().await?;
    let high = sets_high.then(|| state.engines().rank_order(kind));
    Ok(store
        .record_score(player.into(), kind.as_str().to_owned(), score, high)
        .await?)
}
