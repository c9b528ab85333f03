// League-wide pick counts by position, used for run detection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::pick::Pick;
use crate::catalog::{Catalog, Position};

/// Number of picks (any owner) made at each position.
///
/// Every position is always present, starting at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionalCounts {
    pub counts: BTreeMap<Position, usize>,
}

impl Default for PositionalCounts {
    fn default() -> Self {
        PositionalCounts {
            counts: Position::ALL.iter().map(|&p| (p, 0)).collect(),
        }
    }
}

impl PositionalCounts {
    /// Tally every pick in the log. Picks whose player is missing from the
    /// catalog are skipped.
    pub fn from_picks<'a>(picks: impl IntoIterator<Item = &'a Pick>, catalog: &Catalog) -> Self {
        let mut counts = PositionalCounts::default();
        for pick in picks {
            if let Some(player) = catalog.get(&pick.player_id) {
                *counts.counts.entry(player.position).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn get(&self, position: Position) -> usize {
        self.counts.get(&position).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}
