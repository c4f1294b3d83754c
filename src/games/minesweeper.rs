//! Grid-reveal engine.
//!
//! A round goes `idle → mines placed → (continue)* → won | lost`. Mines are
//! placed lazily on the first reveal so the first cell is always safe.

use rand::{Rng, seq::index};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{GameEngine, GameKind, InitView, MoveDelta, MoveError, MoveStatus, Outcome, Round};
use crate::dao::models::RankOrder;

/// Adjacency value stored in mine cells.
pub const MINE: i8 = -1;

/// Tunables for the grid-reveal game.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MinesweeperConfig {
    /// Side length of the square grid.
    pub ndim: usize,
    /// Number of mines, also the flag budget and the winning score.
    pub mine_count: usize,
    /// Leaderboard direction.
    pub rank_order: RankOrder,
}

impl Default for MinesweeperConfig {
    fn default() -> Self {
        Self {
            ndim: 8,
            mine_count: 10,
            rank_order: RankOrder::Desc,
        }
    }
}

impl MinesweeperConfig {
    /// Check that mines fit on the grid while leaving the first cell free.
    pub fn validate(&self) -> Result<(), String> {
        if self.ndim < 2 {
            return Err(format!("ndim must be at least 2 (got {})", self.ndim));
        }
        if self.mine_count == 0 || self.mine_count >= self.ndim * self.ndim {
            return Err(format!(
                "mine_count must be within 1..{} (got {})",
                self.ndim * self.ndim,
                self.mine_count
            ));
        }
        Ok(())
    }
}

/// Grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
pub struct Cell {
    /// Row index, from 0.
    pub row: usize,
    /// Column index, from 0.
    pub col: usize,
}

/// A newly revealed cell and its adjacency count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct RevealedCell {
    /// Row index, from 0.
    pub row: usize,
    /// Column index, from 0.
    pub col: usize,
    /// Number of neighbouring mines.
    pub count: i8,
}

/// Player move. Coordinates are signed so out-of-range values reach
/// validation instead of failing decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MinesweeperMove {
    /// Reveal a cell.
    Reveal {
        /// Row index.
        row: i64,
        /// Column index.
        col: i64,
    },
    /// Toggle a flag on a cell.
    Flag {
        /// Row index.
        row: i64,
        /// Column index.
        col: i64,
    },
}

/// Configuration returned when a round starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MinesweeperInit {
    /// Side length of the grid.
    pub ndim: usize,
    /// Flag budget.
    pub flags: usize,
}

/// Public change caused by a move.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct MinesweeperDelta {
    /// Cells revealed by this move.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub revealed: Vec<RevealedCell>,
    /// Every mine, exposed once the round is lost.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mines: Option<Vec<Cell>>,
    /// Whether a flag toggle took effect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toggled: Option<bool>,
    /// Flag state of the targeted cell after a toggle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flagged: Option<bool>,
    /// Flags left to place.
    pub flags_remaining: usize,
}

impl From<MinesweeperDelta> for MoveDelta {
    fn from(value: MinesweeperDelta) -> Self {
        MoveDelta::Minesweeper(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellState {
    Hidden,
    Flagged,
    Revealed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    MinesPlaced,
    Won,
    Lost,
}

/// Board state for one player's round.
#[derive(Debug, Clone)]
pub struct MinesweeperRound {
    ndim: usize,
    mine_count: usize,
    counts: Vec<i8>,
    cells: Vec<CellState>,
    mines: Vec<usize>,
    flags_remaining: usize,
    revealed: usize,
    phase: Phase,
    score: Option<i32>,
}

impl MinesweeperRound {
    fn new(ndim: usize, mine_count: usize) -> Self {
        let total = ndim * ndim;
        Self {
            ndim,
            mine_count,
            counts: vec![0; total],
            cells: vec![CellState::Hidden; total],
            mines: Vec::with_capacity(mine_count),
            flags_remaining: mine_count,
            revealed: 0,
            phase: Phase::Idle,
            score: None,
        }
    }

    /// Whether the round can still accept moves.
    pub fn in_progress(&self) -> bool {
        matches!(self.phase, Phase::Idle | Phase::MinesPlaced)
    }

    /// Flags left to place.
    pub fn flags_remaining(&self) -> usize {
        self.flags_remaining
    }

    /// Number of currently flagged cells.
    pub fn flagged_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|state| **state == CellState::Flagged)
            .count()
    }

    fn index(&self, row: i64, col: i64) -> Result<usize, MoveError> {
        let limit = self.ndim as i64;
        if !(0..limit).contains(&row) || !(0..limit).contains(&col) {
            return Err(MoveError::Invalid(format!(
                "cell ({row}, {col}) is outside the {0}x{0} grid",
                self.ndim
            )));
        }
        Ok(row as usize * self.ndim + col as usize)
    }

    fn cell(&self, idx: usize) -> Cell {
        Cell {
            row: idx / self.ndim,
            col: idx % self.ndim,
        }
    }

    fn neighbours(&self, idx: usize) -> impl Iterator<Item = usize> + use<> {
        let ndim = self.ndim as isize;
        let row = (idx / self.ndim) as isize;
        let col = (idx % self.ndim) as isize;
        (-1..=1)
            .flat_map(move |dr| (-1..=1).map(move |dc| (row + dr, col + dc)))
            .filter(move |&(r, c)| {
                (r, c) != (row, col) && (0..ndim).contains(&r) && (0..ndim).contains(&c)
            })
            .map(move |(r, c)| (r * ndim + c) as usize)
    }

    /// Place mines uniformly among every cell except `first`, then count
    /// adjacency for the remaining cells.
    fn place_mines<R: Rng + ?Sized>(&mut self, first: usize, rng: &mut R) {
        let total = self.ndim * self.ndim;
        for pick in index::sample(rng, total - 1, self.mine_count) {
            let idx = if pick >= first { pick + 1 } else { pick };
            self.counts[idx] = MINE;
            self.mines.push(idx);
            for neighbour in self.neighbours(idx) {
                if self.counts[neighbour] != MINE {
                    self.counts[neighbour] += 1;
                }
            }
        }
        self.mines.sort_unstable();
        self.phase = Phase::MinesPlaced;
    }

    /// Reveal `start` and expand through zero-count cells; numbered cells are
    /// revealed but not expanded and flagged cells are never touched.
    fn flood_reveal(&mut self, start: usize) -> Vec<RevealedCell> {
        let mut newly = Vec::new();
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            if self.cells[idx] != CellState::Hidden {
                continue;
            }
            self.cells[idx] = CellState::Revealed;
            self.revealed += 1;
            let Cell { row, col } = self.cell(idx);
            newly.push(RevealedCell {
                row,
                col,
                count: self.counts[idx],
            });
            if self.counts[idx] == 0 {
                stack.extend(
                    self.neighbours(idx)
                        .filter(|&n| self.cells[n] == CellState::Hidden),
                );
            }
        }
        newly
    }

    fn all_safe_cells_revealed(&self) -> bool {
        self.revealed == self.ndim * self.ndim - self.mine_count
    }

    fn delta(&self) -> MinesweeperDelta {
        MinesweeperDelta {
            flags_remaining: self.flags_remaining,
            ..MinesweeperDelta::default()
        }
    }

    fn reveal<R: Rng + ?Sized>(&mut self, idx: usize, rng: &mut R) -> Outcome {
        match self.cells[idx] {
            CellState::Flagged => return Outcome::ongoing(MoveStatus::Flagged, self.delta()),
            CellState::Revealed => return Outcome::ongoing(MoveStatus::Continue, self.delta()),
            CellState::Hidden => {}
        }

        if self.phase == Phase::Idle {
            self.place_mines(idx, rng);
        }

        if self.counts[idx] == MINE {
            let correct_flags = self
                .mines
                .iter()
                .filter(|&&mine| self.cells[mine] == CellState::Flagged)
                .count() as i32;
            self.phase = Phase::Lost;
            self.score = Some(correct_flags);
            let delta = MinesweeperDelta {
                mines: Some(self.mines.iter().map(|&mine| self.cell(mine)).collect()),
                ..self.delta()
            };
            return Outcome::terminal(MoveStatus::GameOver, delta, correct_flags);
        }

        let revealed = self.flood_reveal(idx);
        let delta = MinesweeperDelta {
            revealed,
            ..self.delta()
        };

        if self.all_safe_cells_revealed() {
            let score = self.mine_count as i32;
            self.phase = Phase::Won;
            self.score = Some(score);
            return Outcome::terminal(MoveStatus::Won, delta, score);
        }

        Outcome::ongoing(MoveStatus::Continue, delta)
    }

    fn toggle_flag(&mut self, idx: usize) -> Outcome {
        let toggled = match self.cells[idx] {
            CellState::Revealed => false,
            CellState::Flagged => {
                self.cells[idx] = CellState::Hidden;
                self.flags_remaining += 1;
                true
            }
            CellState::Hidden if self.flags_remaining == 0 => false,
            CellState::Hidden => {
                self.cells[idx] = CellState::Flagged;
                self.flags_remaining -= 1;
                true
            }
        };

        let delta = MinesweeperDelta {
            toggled: Some(toggled),
            flagged: Some(self.cells[idx] == CellState::Flagged),
            ..self.delta()
        };
        Outcome::ongoing(MoveStatus::Continue, delta)
    }
}

/// Grid-reveal engine.
#[derive(Debug, Clone)]
pub struct MinesweeperEngine {
    config: MinesweeperConfig,
}

impl MinesweeperEngine {
    /// Build the engine; the configuration is expected to be validated.
    pub fn new(config: MinesweeperConfig) -> Self {
        Self { config }
    }
}

impl GameEngine for MinesweeperEngine {
    const KIND: GameKind = GameKind::Minesweeper;
    type Round = MinesweeperRound;
    type Move = MinesweeperMove;

    fn rank_order(&self) -> RankOrder {
        self.config.rank_order
    }

    fn max_score(&self) -> i32 {
        self.config.mine_count as i32
    }

    fn init<R: Rng + ?Sized>(&self, _rng: &mut R) -> (Self::Round, InitView) {
        let round = MinesweeperRound::new(self.config.ndim, self.config.mine_count);
        let view = InitView::Minesweeper(MinesweeperInit {
            ndim: self.config.ndim,
            flags: self.config.mine_count,
        });
        (round, view)
    }

    fn play<R: Rng + ?Sized>(
        &self,
        round: &mut Self::Round,
        mv: Self::Move,
        rng: &mut R,
    ) -> Result<Outcome, MoveError> {
        let (row, col) = match mv {
            MinesweeperMove::Reveal { row, col } | MinesweeperMove::Flag { row, col } => (row, col),
        };
        if !round.in_progress() {
            return Ok(Outcome::finished());
        }

        let idx = round.index(row, col)?;

        Ok(match mv {
            MinesweeperMove::Reveal { .. } => round.reveal(idx, rng),
            MinesweeperMove::Flag { .. } => round.toggle_flag(idx),
        })
    }

    fn final_score(round: &Self::Round) -> Option<i32> {
        round.score
    }

    fn wrap(round: Self::Round) -> Round {
        Round::Minesweeper(round)
    }

    fn round_mut(round: &mut Round) -> Option<&mut Self::Round> {
        match round {
            Round::Minesweeper(inner) => Some(inner),
            _ => None,
        }
    }
}
