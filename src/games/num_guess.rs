//! Range-guess engine: find a secret in [1, 100] within a fixed number of
//! guesses. The score is the number of guesses used, lower is better.

use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{GameEngine, GameKind, InitView, MoveDelta, MoveError, MoveStatus, Outcome, Round};
use crate::dao::models::RankOrder;

/// Range the secret is drawn from.
pub const SECRET_RANGE: RangeInclusive<i64> = 1..=100;

/// Tunables for the guessing game.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NumGuessConfig {
    /// Guesses allowed per round.
    pub max_turns: u32,
    /// Leaderboard direction.
    pub rank_order: RankOrder,
}

impl Default for NumGuessConfig {
    fn default() -> Self {
        Self {
            max_turns: 6,
            rank_order: RankOrder::Asc,
        }
    }
}

impl NumGuessConfig {
    /// Reject rounds without guesses.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_turns == 0 {
            return Err("max_turns must be at least 1".into());
        }
        Ok(())
    }
}

/// Player move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NumGuessMove {
    /// Guessed number.
    pub guess: i64,
}

/// Direction of the secret relative to the guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Hint {
    /// The secret is higher than the guess.
    Higher,
    /// The secret is lower than the guess.
    Lower,
}

/// Configuration returned when a round starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct NumGuessInit {
    /// Smallest possible secret.
    pub min: i64,
    /// Largest possible secret.
    pub max: i64,
    /// Guesses allowed.
    pub max_turns: u32,
}

/// Public change caused by a guess.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct NumGuessDelta {
    /// Where to look next, on a wrong guess.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<Hint>,
    /// Turn number of the next guess.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn: Option<u32>,
    /// The secret, revealed once the guesses are exhausted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<i64>,
}

impl From<NumGuessDelta> for MoveDelta {
    fn from(value: NumGuessDelta) -> Self {
        MoveDelta::NumGuess(value)
    }
}

/// Secret and turn counter for one player's round.
#[derive(Debug, Clone)]
pub struct NumGuessRound {
    answer: i64,
    turns_used: u32,
    score: Option<i32>,
    won: bool,
}

impl NumGuessRound {
    #[cfg(test)]
    pub(crate) fn with_answer(answer: i64) -> Self {
        Self {
            answer,
            turns_used: 1,
            score: None,
            won: false,
        }
    }

    /// Turn number of the next guess, starting at 1.
    pub fn turns_used(&self) -> u32 {
        self.turns_used
    }
}

/// Range-guess engine.
#[derive(Debug, Clone)]
pub struct NumGuessEngine {
    config: NumGuessConfig,
}

impl NumGuessEngine {
    /// Build the engine; the configuration is expected to be validated.
    pub fn new(config: NumGuessConfig) -> Self {
        Self { config }
    }
}

impl GameEngine for NumGuessEngine {
    const KIND: GameKind = GameKind::NumGuess;
    type Round = NumGuessRound;
    type Move = NumGuessMove;

    fn rank_order(&self) -> RankOrder {
        self.config.rank_order
    }

    /// Score of an exhausted round, one past the last allowed turn.
    fn max_score(&self) -> i32 {
        self.config.max_turns as i32 + 1
    }

    fn init<R: Rng + ?Sized>(&self, rng: &mut R) -> (Self::Round, InitView) {
        let round = NumGuessRound {
            answer: rng.random_range(SECRET_RANGE),
            turns_used: 1,
            score: None,
            won: false,
        };
        let view = InitView::NumGuess(NumGuessInit {
            min: *SECRET_RANGE.start(),
            max: *SECRET_RANGE.end(),
            max_turns: self.config.max_turns,
        });
        (round, view)
    }

    fn play<R: Rng + ?Sized>(
        &self,
        round: &mut Self::Round,
        mv: Self::Move,
        _rng: &mut R,
    ) -> Result<Outcome, MoveError> {
        if round.score.is_some() {
            return Ok(Outcome::finished());
        }

        let NumGuessMove { guess } = mv;
        if !SECRET_RANGE.contains(&guess) {
            return Err(MoveError::Invalid(format!(
                "guess must be between {} and {} (got {guess})",
                SECRET_RANGE.start(),
                SECRET_RANGE.end()
            )));
        }

        if guess == round.answer {
            let score = round.turns_used as i32;
            round.score = Some(score);
            round.won = true;
            let delta = NumGuessDelta {
                turn: Some(round.turns_used),
                ..NumGuessDelta::default()
            };
            return Ok(Outcome::terminal(MoveStatus::Won, delta, score));
        }

        if round.turns_used >= self.config.max_turns {
            let score = self.max_score();
            round.score = Some(score);
            let delta = NumGuessDelta {
                answer: Some(round.answer),
                ..NumGuessDelta::default()
            };
            return Ok(Outcome::terminal_daily_only(
                MoveStatus::GameOver,
                delta,
                score,
            ));
        }

        let hint = if guess < round.answer {
            Hint::Higher
        } else {
            Hint::Lower
        };
        round.turns_used += 1;
        let delta = NumGuessDelta {
            hint: Some(hint),
            turn: Some(round.turns_used),
            answer: None,
        };
        Ok(Outcome::ongoing(MoveStatus::Continue, delta))
    }

    fn final_score(round: &Self::Round) -> Option<i32> {
        round.score
    }

    /// Running out of guesses only counts for the day.
    fn sets_high(round: &Self::Round) -> bool {
        round.won
    }

    fn wrap(round: Self::Round) -> Round {
        Round::NumGuess(round)
    }

    fn round_mut(round: &mut Round) -> Option<&mut Self::Round> {
        match round {
            Round::NumGuess(inner) => Some(inner),
            _ => None,
        }
    }
}
