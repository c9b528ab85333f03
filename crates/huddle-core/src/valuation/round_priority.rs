// Round-aware positional priority.
//
// A fixed drafting strategy: hammer RB/WR early, wait on QB, leave DST/K for
// the late rounds. The values are a lookup table, not a formula.

use serde::Serialize;

use crate::catalog::Position;

/// Round groups sharing one row of the priority table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundBucket {
    First,
    Second,
    /// Rounds 3 to 5.
    Early,
    /// Rounds 6 to 9.
    Middle,
    /// Round 10 onward.
    Late,
}

impl RoundBucket {
    /// Bucket for a 1-based round. Round 0 is treated as round 1.
    pub fn from_round(round: u32) -> Self {
        match round {
            0 | 1 => RoundBucket::First,
            2 => RoundBucket::Second,
            3..=5 => RoundBucket::Early,
            6..=9 => RoundBucket::Middle,
            _ => RoundBucket::Late,
        }
    }
}

/// Priority multiplier for `position` in `bucket`.
pub fn round_priority(position: Position, bucket: RoundBucket) -> f64 {
    use Position::*;
    use RoundBucket::*;
    match (bucket, position) {
        (First, QB) => 0.05,
        (First, RB) => 1.25,
        (First, WR) => 1.25,
        (First, TE) => 0.85,
        (First, DST) => 0.05,
        (First, K) => 0.05,

        (Second, QB) => 0.35,
        (Second, RB) => 1.15,
        (Second, WR) => 1.15,
        (Second, TE) => 0.90,
        (Second, DST) => 0.10,
        (Second, K) => 0.10,

        (Early, QB) => 0.90,
        (Early, RB) => 1.08,
        (Early, WR) => 1.08,
        (Early, TE) => 0.95,
        (Early, DST) => 0.25,
        (Early, K) => 0.20,

        (Middle, QB) => 1.00,
        (Middle, RB) => 1.02,
        (Middle, WR) => 1.02,
        (Middle, TE) => 1.00,
        (Middle, DST) => 0.50,
        (Middle, K) => 0.40,

        (Late, _) => 1.00,
    }
}
