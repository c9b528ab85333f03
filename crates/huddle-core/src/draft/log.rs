// The draft log: ordered, append-only record of every pick.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use super::pick::{Owner, Pick};
use super::DraftError;
use crate::catalog::{Catalog, PlayerId};

/// Ordered picks plus an index of who took each player.
///
/// Invariant: a player id appears at most once across `picks`.
#[derive(Debug, Clone, Default)]
pub struct DraftLog {
    picks: Vec<Pick>,
    taken: HashMap<PlayerId, Owner>,
}

impl DraftLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pick after checking the player exists and is still free.
    pub fn record(&mut self, pick: Pick, catalog: &Catalog) -> Result<&Pick, DraftError> {
        if !catalog.contains(&pick.player_id) {
            return Err(DraftError::UnknownPlayer {
                player_id: pick.player_id,
            });
        }
        if let Some(&owner) = self.taken.get(&pick.player_id) {
            return Err(DraftError::AlreadyTaken {
                player_id: pick.player_id,
                owner,
            });
        }
        self.taken.insert(pick.player_id.clone(), pick.owner);
        self.picks.push(pick);
        Ok(&self.picks[self.picks.len() - 1])
    }

    /// Remove and return the most recent pick. `None` on an empty log.
    pub fn undo(&mut self) -> Option<Pick> {
        let pick = self.picks.pop()?;
        self.taken.remove(&pick.player_id);
        Some(pick)
    }

    /// Clear every pick.
    pub fn reset(&mut self) {
        self.picks.clear();
        self.taken.clear();
    }

    /// Rebuild the log by replaying `picks` in order.
    ///
    /// Used for crash recovery. Picks that would be rejected by
    /// [`DraftLog::record`] (unknown player, duplicate) are skipped with a
    /// warning. Returns the number of picks skipped.
    pub fn restore_from_picks(&mut self, picks: Vec<Pick>, catalog: &Catalog) -> usize {
        self.reset();
        let mut skipped = 0;
        for pick in picks {
            let id = pick.player_id.clone();
            if let Err(e) = self.record(pick, catalog) {
                warn!("Skipping stored pick {}: {}", id, e);
                skipped += 1;
            }
        }
        skipped
    }

    pub fn picks(&self) -> &[Pick] {
        &self.picks
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    /// Every taken player id, any owner.
    pub fn taken_ids(&self) -> HashSet<&str> {
        self.taken.keys().map(String::as_str).collect()
    }

    /// Self-owned picks in log order.
    pub fn my_picks(&self) -> impl Iterator<Item = &Pick> {
        self.picks.iter().filter(|p| p.is_mine())
    }
}
