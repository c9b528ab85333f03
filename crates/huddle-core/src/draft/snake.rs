// Snake draft pick arithmetic.
//
// Odd rounds run slot 1..N, even rounds run N..1. Pick numbers are 1-based
// and count across the whole draft.

/// Overall pick number for `slot` (1-based) in `round` (1-based).
pub fn pick_number(round: u32, slot: u32, league_size: u32) -> u32 {
    let base = (round - 1) * league_size;
    if round % 2 == 1 {
        base + slot
    } else {
        base + (league_size - slot + 1)
    }
}

/// The round the next pick belongs to, given how many picks have been made:
/// `ceil((picks_made + 1) / league_size)`.
pub fn current_round(picks_made: usize, league_size: u32) -> u32 {
    let n = league_size.max(1) as usize;
    (picks_made / n + 1) as u32
}

/// Which draft slot is on the clock for the next pick.
pub fn slot_on_clock(picks_made: usize, league_size: u32) -> u32 {
    let n = league_size.max(1);
    let round = current_round(picks_made, n);
    let index_in_round = (picks_made % n as usize) as u32;
    if round % 2 == 1 {
        index_in_round + 1
    } else {
        n - index_in_round
    }
}

/// The next overall pick number belonging to `slot` that has not happened
/// yet, or `None` once the draft's final round has passed it.
pub fn next_pick_for_slot(picks_made: usize, slot: u32, league_size: u32, rounds: u32) -> Option<u32> {
    let start = current_round(picks_made, league_size);
    (start..=rounds)
        .map(|round| pick_number(round, slot, league_size))
        .find(|&pick| pick as usize > picks_made)
}

/// Picks remaining before `slot` is on the clock (0 means on the clock now).
pub fn picks_until_turn(picks_made: usize, slot: u32, league_size: u32, rounds: u32) -> Option<u32> {
    next_pick_for_slot(picks_made, slot, league_size, rounds).map(|pick| pick - picks_made as u32 - 1)
}
