//! Turn-based minigame engines.
//!
//! Every engine is a deterministic state machine over a single player's
//! [`Round`]; randomness is injected by the caller so rounds can be replayed
//! from a seeded generator. Engines never touch storage: a terminal
//! [`Outcome`] carries the final score and the service layer writes it through.

pub mod minesweeper;
pub mod num_guess;
pub mod simon;

use std::{fmt, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use utoipa::ToSchema;

use crate::{
    config::AppConfig,
    dao::models::{GameConfigEntity, RankOrder},
};

use self::{
    minesweeper::{MinesweeperDelta, MinesweeperEngine, MinesweeperInit, MinesweeperRound},
    num_guess::{NumGuessDelta, NumGuessEngine, NumGuessInit, NumGuessRound},
    simon::{SimonDelta, SimonEngine, SimonInit, SimonRound},
};

/// Game kinds served by the backend, identified on the wire by their id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    /// Grid-reveal game (minesweeper).
    Minesweeper,
    /// Growing-sequence memory game (simon).
    Simon,
    /// Number guessing game.
    NumGuess,
}

impl GameKind {
    /// Every game kind, in the order leaderboards list them.
    pub const ALL: [GameKind; 3] = [GameKind::Minesweeper, GameKind::Simon, GameKind::NumGuess];

    /// Stable identifier used in URLs and persistence.
    pub fn as_str(self) -> &'static str {
        match self {
            GameKind::Minesweeper => "minesweeper",
            GameKind::Simon => "simon",
            GameKind::NumGuess => "num_guess",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a path segment does not name a known game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown game `{0}`")]
pub struct UnknownGame(pub String);

impl FromStr for GameKind {
    type Err = UnknownGame;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        GameKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| UnknownGame(value.to_owned()))
    }
}

/// Status reported for every move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MoveStatus {
    /// The round goes on.
    Continue,
    /// The targeted cell is flagged; nothing was revealed.
    Flagged,
    /// The choice was right; the player keeps replaying the same prefix.
    Next,
    /// Terminal victory.
    Won,
    /// Terminal loss.
    GameOver,
    /// The round already ended; the move was ignored.
    Finished,
}

impl MoveStatus {
    /// Whether this status ends the round.
    pub fn is_terminal(self) -> bool {
        matches!(self, MoveStatus::Won | MoveStatus::GameOver)
    }
}

/// Engine-specific part of a move response.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum MoveDelta {
    /// Cells revealed, flags toggled or mines exposed.
    Minesweeper(MinesweeperDelta),
    /// Sequence prefix or progress.
    Simon(SimonDelta),
    /// Hint and turn counter.
    NumGuess(NumGuessDelta),
}

/// Engine-specific configuration returned when a round starts.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum InitView {
    /// Grid dimension and flag budget.
    Minesweeper(MinesweeperInit),
    /// Alphabet and maximum sequence length.
    Simon(SimonInit),
    /// Secret range and turn budget.
    NumGuess(NumGuessInit),
}

/// Result of applying one move to a round.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Status reported to the player.
    pub status: MoveStatus,
    /// Public state change caused by the move.
    pub delta: Option<MoveDelta>,
    /// Final score, present only when the move ended the round.
    pub final_score: Option<i32>,
    /// Whether the final score may raise the all-time high; otherwise only
    /// the daily score is written.
    pub sets_high: bool,
}

impl Outcome {
    /// Non-terminal outcome.
    pub fn ongoing(status: MoveStatus, delta: impl Into<MoveDelta>) -> Self {
        Self {
            status,
            delta: Some(delta.into()),
            final_score: None,
            sets_high: false,
        }
    }

    /// Terminal outcome carrying the score to write through.
    pub fn terminal(status: MoveStatus, delta: impl Into<MoveDelta>, score: i32) -> Self {
        Self {
            status,
            delta: Some(delta.into()),
            final_score: Some(score),
            sets_high: true,
        }
    }

    /// Terminal outcome whose score only counts for the day.
    pub fn terminal_daily_only(
        status: MoveStatus,
        delta: impl Into<MoveDelta>,
        score: i32,
    ) -> Self {
        Self {
            sets_high: false,
            ..Self::terminal(status, delta, score)
        }
    }

    /// Post-terminal no-op.
    pub fn finished() -> Self {
        Self {
            status: MoveStatus::Finished,
            delta: None,
            final_score: None,
            sets_high: false,
        }
    }
}

/// Rejected move. No round state is mutated when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    /// Malformed or out-of-range payload.
    #[error("{0}")]
    Invalid(String),
    /// Legal payload submitted at the wrong point of the round.
    #[error("{0}")]
    OutOfTurn(String),
}

/// Server-held scratch state of one player's round.
#[derive(Debug, Clone)]
pub enum Round {
    /// Minesweeper board.
    Minesweeper(MinesweeperRound),
    /// Simon sequence and turn counters.
    Simon(SimonRound),
    /// Secret number and turns used.
    NumGuess(NumGuessRound),
}

impl Round {
    /// Game kind owning this round.
    pub fn kind(&self) -> GameKind {
        match self {
            Round::Minesweeper(_) => GameKind::Minesweeper,
            Round::Simon(_) => GameKind::Simon,
            Round::NumGuess(_) => GameKind::NumGuess,
        }
    }

    /// Score of the round once it reached a terminal outcome.
    pub fn final_score(&self) -> Option<i32> {
        match self {
            Round::Minesweeper(round) => MinesweeperEngine::final_score(round),
            Round::Simon(round) => SimonEngine::final_score(round),
            Round::NumGuess(round) => NumGuessEngine::final_score(round),
        }
    }

    /// Whether the finished round's score may raise the all-time high.
    pub fn sets_high(&self) -> bool {
        match self {
            Round::Minesweeper(round) => MinesweeperEngine::sets_high(round),
            Round::Simon(round) => SimonEngine::sets_high(round),
            Round::NumGuess(round) => NumGuessEngine::sets_high(round),
        }
    }
}

/// Capability interface shared by every engine.
pub trait GameEngine: Send + Sync {
    /// Game kind implemented by the engine.
    const KIND: GameKind;
    /// Per-player round state.
    type Round: Send + Sync + fmt::Debug;
    /// Typed move decoded from the JSON payload.
    type Move: DeserializeOwned;

    /// Whether lower or higher scores are better.
    fn rank_order(&self) -> RankOrder;

    /// Best achievable score, announced alongside leaderboards.
    fn max_score(&self) -> i32;

    /// Start a fresh round.
    fn init<R: Rng + ?Sized>(&self, rng: &mut R) -> (Self::Round, InitView);

    /// Apply a move to the round.
    fn play<R: Rng + ?Sized>(
        &self,
        round: &mut Self::Round,
        mv: Self::Move,
        rng: &mut R,
    ) -> Result<Outcome, MoveError>;

    /// Score of a finished round, `None` while it is still in progress.
    fn final_score(round: &Self::Round) -> Option<i32>;

    /// Whether [`GameEngine::final_score`] competes for the all-time high.
    fn sets_high(_round: &Self::Round) -> bool {
        true
    }

    /// Wrap an engine round into the registry representation.
    fn wrap(round: Self::Round) -> Round;

    /// Borrow the engine round back out of the registry representation.
    fn round_mut(round: &mut Round) -> Option<&mut Self::Round>;

    /// Decode a JSON move; shape errors (including non-integer numbers) are
    /// validation errors.
    fn parse_move(&self, payload: serde_json::Value) -> Result<Self::Move, MoveError> {
        serde_json::from_value(payload)
            .map_err(|err| MoveError::Invalid(format!("malformed {} move: {err}", Self::KIND)))
    }

    /// Persisted configuration row for this game.
    fn config_entity(&self) -> GameConfigEntity {
        GameConfigEntity {
            game_id: Self::KIND.as_str().to_owned(),
            max_score: self.max_score(),
            rank_order: self.rank_order(),
        }
    }
}

/// The engine set, built once from configuration.
#[derive(Debug, Clone)]
pub struct Engines {
    /// Minesweeper engine.
    pub minesweeper: MinesweeperEngine,
    /// Simon engine.
    pub simon: SimonEngine,
    /// Number guessing engine.
    pub num_guess: NumGuessEngine,
}

impl Engines {
    /// Build every engine from the runtime configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            minesweeper: MinesweeperEngine::new(config.minesweeper.clone()),
            simon: SimonEngine::new(config.simon.clone()),
            num_guess: NumGuessEngine::new(config.num_guess.clone()),
        }
    }

    /// Configuration rows for every engine, in leaderboard order.
    pub fn config_entities(&self) -> Vec<GameConfigEntity> {
        vec![
            self.minesweeper.config_entity(),
            self.simon.config_entity(),
            self.num_guess.config_entity(),
        ]
    }

    /// Direction rule of a game.
    pub fn rank_order(&self, kind: GameKind) -> RankOrder {
        match kind {
            GameKind::Minesweeper => self.minesweeper.rank_order(),
            GameKind::Simon => self.simon.rank_order(),
            GameKind::NumGuess => self.num_guess.rank_order(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_kind_round_trips_through_its_id() {
        for kind in GameKind::ALL {
            assert_eq!(kind.as_str().parse::<GameKind>(), Ok(kind));
        }
        assert_eq!(
            "chess".parse::<GameKind>(),
            Err(UnknownGame("chess".into()))
        );
    }

    #[test]
    fn only_won_and_game_over_are_terminal() {
        assert!(MoveStatus::Won.is_terminal());
        assert!(MoveStatus::GameOver.is_terminal());
        assert!(!MoveStatus::Finished.is_terminal());
        assert!(!MoveStatus::Next.is_terminal());
    }

    #[test]
    fn default_engines_announce_expected_max_scores() {
        let engines = Engines::from_config(&AppConfig::default());
        let maxima: Vec<_> = engines
            .config_entities()
            .into_iter()
            .map(|entity| (entity.game_id, entity.max_score, entity.rank_order))
            .collect();
        assert_eq!(
            maxima,
            vec![
                ("minesweeper".to_owned(), 10, RankOrder::Desc),
                ("simon".to_owned(), 20, RankOrder::Desc),
                ("num_guess".to_owned(), 7, RankOrder::Asc),
            ]
        );
    }
}
