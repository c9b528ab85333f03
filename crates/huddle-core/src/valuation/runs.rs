// Positional run detection and the pivot bonus.
//
// A position drafted faster than its expected share is "running"; the
// engine pivots toward positions drafted slower than expected.

use std::collections::BTreeMap;

use crate::catalog::Position;
use crate::draft::counts::PositionalCounts;

/// Largest relative boost for a position nobody is running on.
pub const MAX_PIVOT_BONUS: f64 = 0.15;

/// Share of all picks each position takes in an even-paced draft.
pub fn expected_share(position: Position) -> f64 {
    match position {
        Position::QB => 0.17,
        Position::RB => 0.27,
        Position::WR => 0.27,
        Position::TE => 0.10,
        Position::DST => 0.10,
        Position::K => 0.09,
    }
}

/// `run_sensitivity * (actual_share - expected_share)`. Positive means the
/// position is going faster than expected. Zero picks counts as one pick.
pub fn run_bias(counts: &PositionalCounts, position: Position, run_sensitivity: f64) -> f64 {
    let total = counts.total().max(1) as f64;
    let actual = counts.get(position) as f64 / total;
    run_sensitivity * (actual - expected_share(position))
}

/// Run bias for every position.
pub fn compute_run_biases(
    counts: &PositionalCounts,
    run_sensitivity: f64,
) -> BTreeMap<Position, f64> {
    Position::ALL
        .iter()
        .map(|&pos| (pos, run_bias(counts, pos, run_sensitivity)))
        .collect()
}

/// `1 + max(0, 0.15 - max(0, bias))`: a hot position earns a reduced or no
/// bonus, a cold one the full bonus.
pub fn pivot_bonus(run_bias: f64) -> f64 {
    1.0 + (MAX_PIVOT_BONUS - run_bias.max(0.0)).max(0.0)
}
