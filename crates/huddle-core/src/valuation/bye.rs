// Bye-week diversification.

use crate::catalog::Player;
use crate::draft::roster::Roster;

/// Multiplier when two or more rostered players at the position share the
/// candidate's bye.
pub const MULTI_MATCH_PENALTY: f64 = 0.92;
/// Multiplier when exactly one does.
pub const SINGLE_MATCH_PENALTY: f64 = 0.97;

/// Rostered players at the candidate's position (any slot, FLEX and bench
/// included) with the same bye week. Zero when the candidate has no bye.
pub fn bye_matches(candidate: &Player, roster: &Roster) -> usize {
    let Some(bye) = candidate.bye_week else {
        return 0;
    };
    roster
        .players_at(candidate.position)
        .filter(|p| p.bye_week == Some(bye))
        .count()
}

/// Penalty multiplier for a given number of bye matches.
pub fn bye_adjustment(matches: usize) -> f64 {
    match matches {
        0 => 1.0,
        1 => SINGLE_MATCH_PENALTY,
        _ => MULTI_MATCH_PENALTY,
    }
}
