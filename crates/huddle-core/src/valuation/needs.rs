// Positional need accounting and hard roster caps.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::catalog::Position;
use crate::draft::roster::{Roster, RosterTemplate, SlotCategory};

/// Multiplier while starter slots at the exact position remain open.
pub const STARTER_BOOST: f64 = 1.15;
/// Multiplier once the position's starter slots are full.
pub const BENCH_DAMP: f64 = 0.90;
/// Per-useful-slot need weight.
pub const NEED_WEIGHT: f64 = 0.18;
/// Useful slots beyond this do not add further need.
pub const MAX_USEFUL_SLOTS: f64 = 2.0;
/// Open FLEX capacity is shared among the three flex-eligible positions.
const FLEX_SHARE_DIVISOR: f64 = 3.0;

/// How much room the self-owner's roster has left for a position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionNeed {
    pub starters_remaining: usize,
    pub flex_share: f64,
}

impl PositionNeed {
    /// Starters remaining plus fractional FLEX opportunity.
    pub fn useful_slots(&self) -> f64 {
        self.starters_remaining as f64 + self.flex_share
    }

    /// `1 + 0.18 * min(2, useful_slots)`.
    pub fn need_multiplier(&self) -> f64 {
        1.0 + NEED_WEIGHT * self.useful_slots().min(MAX_USEFUL_SLOTS)
    }

    pub fn starter_boost(&self) -> f64 {
        if self.starters_remaining > 0 {
            STARTER_BOOST
        } else {
            1.0
        }
    }

    pub fn bench_damp(&self) -> f64 {
        if self.starters_remaining == 0 {
            BENCH_DAMP
        } else {
            1.0
        }
    }
}

/// Need for a single position given the current roster.
pub fn position_need(position: Position, roster: &Roster, template: &RosterTemplate) -> PositionNeed {
    let starters_remaining = roster.remaining(SlotCategory::starter_for(position), template);
    let flex_share = if position.is_flex_eligible() {
        roster.remaining(SlotCategory::FLEX, template) as f64 / FLEX_SHARE_DIVISOR
    } else {
        0.0
    };
    PositionNeed {
        starters_remaining,
        flex_share,
    }
}

/// Need for every position.
pub fn compute_needs(roster: &Roster, template: &RosterTemplate) -> BTreeMap<Position, PositionNeed> {
    Position::ALL
        .iter()
        .map(|&pos| (pos, position_need(pos, roster, template)))
        .collect()
}

// ---------------------------------------------------------------------------
// Hard caps
// ---------------------------------------------------------------------------

/// Maximum number of players the self-owner may roster at a position.
/// Positions without a cap are unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionCaps {
    caps: BTreeMap<Position, usize>,
}

impl Default for PositionCaps {
    fn default() -> Self {
        let caps = [
            (Position::QB, 1),
            (Position::TE, 2),
            (Position::DST, 1),
            (Position::K, 1),
        ]
        .into_iter()
        .collect();
        PositionCaps { caps }
    }
}

impl PositionCaps {
    /// Build caps from a config mapping like `{"QB": 1, "TE": 2}`. Keys that
    /// are not positions are ignored.
    pub fn from_config(config: &HashMap<String, usize>) -> Self {
        let caps = config
            .iter()
            .filter_map(|(key, &cap)| Position::from_str_pos(key).map(|pos| (pos, cap)))
            .collect();
        PositionCaps { caps }
    }

    pub fn cap(&self, position: Position) -> Option<usize> {
        self.caps.get(&position).copied()
    }

    /// Whether the roster already holds the maximum at `position`.
    pub fn is_capped(&self, position: Position, roster: &Roster) -> bool {
        self.cap(position)
            .is_some_and(|cap| roster.count_at(position) >= cap)
    }
}
