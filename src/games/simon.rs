//! Sequence-memory engine.
//!
//! The whole sequence is drawn when the round starts. The house presents a
//! prefix that grows by one colour per completed turn and the player must
//! replay the entire prefix every turn.

use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{GameEngine, GameKind, InitView, MoveDelta, MoveError, MoveStatus, Outcome, Round};
use crate::dao::models::RankOrder;

/// Colour alphabet, by wire code.
pub const COLOURS: [Colour; 4] = [Colour::Red, Colour::Green, Colour::Blue, Colour::Orange];

/// Tunables for the memory game.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimonConfig {
    /// Length of the drawn sequence, also the best achievable score.
    pub max_sequence: usize,
    /// Leaderboard direction.
    pub rank_order: RankOrder,
}

impl Default for SimonConfig {
    fn default() -> Self {
        Self {
            max_sequence: 20,
            rank_order: RankOrder::Desc,
        }
    }
}

impl SimonConfig {
    /// Reject empty sequences.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_sequence == 0 {
            return Err("max_sequence must be at least 1".into());
        }
        Ok(())
    }
}

/// One colour of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub enum Colour {
    /// Red.
    #[serde(rename = "r")]
    Red,
    /// Green.
    #[serde(rename = "g")]
    Green,
    /// Blue.
    #[serde(rename = "b")]
    Blue,
    /// Orange.
    #[serde(rename = "o")]
    Orange,
}

impl Colour {
    /// Single-letter wire code.
    pub fn code(self) -> &'static str {
        match self {
            Colour::Red => "r",
            Colour::Green => "g",
            Colour::Blue => "b",
            Colour::Orange => "o",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        COLOURS.into_iter().find(|colour| colour.code() == code)
    }
}

/// Player move.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SimonMove {
    /// Ask the house to present the current prefix.
    Sequence,
    /// Submit the next colour of the prefix.
    Verify {
        /// Colour code (`r`, `g`, `b` or `o`).
        choice: String,
    },
}

/// Configuration returned when a round starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SimonInit {
    /// Allowed colour codes.
    pub colours: Vec<Colour>,
    /// Sequence length.
    pub max_sequence: usize,
}

/// Public change caused by a move.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct SimonDelta {
    /// Prefix to replay, sent when the house presents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<Vec<Colour>>,
    /// Turns completed so far.
    pub score: usize,
}

impl From<SimonDelta> for MoveDelta {
    fn from(value: SimonDelta) -> Self {
        MoveDelta::Simon(value)
    }
}

/// Sequence and counters for one player's round.
#[derive(Debug, Clone)]
pub struct SimonRound {
    sequence: Vec<Colour>,
    turn_index: usize,
    current_score: usize,
    awaiting_player_input: bool,
    score: Option<i32>,
}

impl SimonRound {
    /// Turns fully completed.
    pub fn current_score(&self) -> usize {
        self.current_score
    }

    /// Position of the next expected colour inside the prefix.
    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    fn present(&mut self) -> Result<Outcome, MoveError> {
        if self.awaiting_player_input {
            return Err(MoveError::OutOfTurn(
                "sequence already presented; waiting for the player".into(),
            ));
        }
        self.awaiting_player_input = true;
        let delta = SimonDelta {
            sequence: Some(self.sequence[..=self.current_score].to_vec()),
            score: self.current_score,
        };
        Ok(Outcome::ongoing(MoveStatus::Continue, delta))
    }

    fn verify(&mut self, choice: Colour) -> Result<Outcome, MoveError> {
        if !self.awaiting_player_input {
            return Err(MoveError::OutOfTurn(
                "the house has not presented the sequence yet".into(),
            ));
        }

        if choice != self.sequence[self.turn_index] {
            let score = self.current_score as i32;
            self.awaiting_player_input = false;
            self.score = Some(score);
            let delta = SimonDelta {
                sequence: None,
                score: self.current_score,
            };
            return Ok(Outcome::terminal(MoveStatus::GameOver, delta, score));
        }

        self.turn_index += 1;
        if self.turn_index < self.current_score + 1 {
            return Ok(Outcome::ongoing(
                MoveStatus::Next,
                SimonDelta {
                    sequence: None,
                    score: self.current_score,
                },
            ));
        }

        self.current_score += 1;
        self.turn_index = 0;
        self.awaiting_player_input = false;
        let delta = SimonDelta {
            sequence: None,
            score: self.current_score,
        };

        if self.current_score == self.sequence.len() {
            let score = self.current_score as i32;
            self.score = Some(score);
            return Ok(Outcome::terminal(MoveStatus::Won, delta, score));
        }

        Ok(Outcome::ongoing(MoveStatus::Continue, delta))
    }
}

/// Sequence-memory engine.
#[derive(Debug, Clone)]
pub struct SimonEngine {
    config: SimonConfig,
}

impl SimonEngine {
    /// Build the engine; the configuration is expected to be validated.
    pub fn new(config: SimonConfig) -> Self {
        Self { config }
    }
}

impl GameEngine for SimonEngine {
    const KIND: GameKind = GameKind::Simon;
    type Round = SimonRound;
    type Move = SimonMove;

    fn rank_order(&self) -> RankOrder {
        self.config.rank_order
    }

    fn max_score(&self) -> i32 {
        self.config.max_sequence as i32
    }

    fn init<R: Rng + ?Sized>(&self, rng: &mut R) -> (Self::Round, InitView) {
        let sequence = (0..self.config.max_sequence)
            .filter_map(|_| COLOURS.choose(&mut *rng).copied())
            .collect();
        let round = SimonRound {
            sequence,
            turn_index: 0,
            current_score: 0,
            awaiting_player_input: false,
            score: None,
        };
        let view = InitView::Simon(SimonInit {
            colours: COLOURS.to_vec(),
            max_sequence: self.config.max_sequence,
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

        match mv {
            SimonMove::Verify { choice } => {
                let colour = Colour::from_code(&choice).ok_or_else(|| {
                    MoveError::Invalid(format!("unexpected choice `{choice}`"))
                })?;
                round.verify(colour)
            }
            SimonMove::Sequence => round.present(),
        }
    }

    fn final_score(round: &Self::Round) -> Option<i32> {
        round.score
    }

    fn wrap(round: Self::Round) -> Round {
        Round::Simon(round)
    }

    fn round_mut(round: &mut Round) -> Option<&mut Self::Round> {
        match round {
            Round::Simon(inner) => Some(inner),
            _ => None,
        }
    }
}
