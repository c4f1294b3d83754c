use std::fmt;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::games::{GameKind, Round};

/// Stable identifier handed over by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Wrap an identifier issued by the identity collaborator.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PlayerId> for String {
    fn from(value: PlayerId) -> Self {
        value.0
    }
}

/// In-progress rounds, one per (player, game).
///
/// Each entry is locked independently, so different players never contend.
/// Closures passed to [`SessionRegistry::with_round`] run while the entry is
/// held and must not block.
#[derive(Default)]
pub struct SessionRegistry {
    rounds: DashMap<(PlayerId, GameKind), Round>,
}

impl SessionRegistry {
    /// Store `round`, replacing whatever the player had for that game.
    pub fn start(&self, player: PlayerId, round: Round) {
        self.rounds.insert((player, round.kind()), round);
    }

    /// Run `work` on the player's round, `None` when no round was started.
    pub fn with_round<T>(
        &self,
        player: &PlayerId,
        kind: GameKind,
        work: impl FnOnce(&mut Round) -> T,
    ) -> Option<T> {
        let mut entry = self.rounds.get_mut(&(player.clone(), kind))?;
        Some(work(entry.value_mut()))
    }

    /// Drop every round that reached a terminal outcome and return how many
    /// were dropped. Rounds still in progress are kept.
    pub fn evict_finished(&self) -> usize {
        let before = self.rounds.len();
        self.rounds.retain(|_, round| round.final_score().is_none());
        before.saturating_sub(self.rounds.len())
    }

    /// Rounds currently held, finished ones included.
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    /// Whether no round is held.
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}
