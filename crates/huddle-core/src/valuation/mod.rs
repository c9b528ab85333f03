// Valuation: turns the catalog and the current draft state into a ranked
// list of available players.

pub mod bye;
pub mod needs;
pub mod qb_context;
pub mod rank;
pub mod round_priority;
pub mod runs;
pub mod vor;

pub use needs::PositionCaps;
pub use rank::{rank_players, RankedPlayer, RankingInputs, ScoreBreakdown};
