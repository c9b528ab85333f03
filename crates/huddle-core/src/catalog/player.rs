// Player records and fantasy football positions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, catalog-unique player identifier.
pub type PlayerId = String;

/// Draftable fantasy football positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
    DST,
    K,
}

impl Position {
    /// Every position, in display order.
    pub const ALL: [Position; 6] = [
        Position::QB,
        Position::RB,
        Position::WR,
        Position::TE,
        Position::DST,
        Position::K,
    ];

    /// Parse a position string into a Position enum.
    ///
    /// Case-insensitive. Accepts the usual defense aliases
    /// ("D/ST", "DEF", "D") and "PK" for kickers.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(Position::QB),
            "RB" => Some(Position::RB),
            "WR" => Some(Position::WR),
            "TE" => Some(Position::TE),
            "DST" | "D/ST" | "DEF" | "D" => Some(Position::DST),
            "K" | "PK" => Some(Position::K),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
            Position::DST => "DST",
            Position::K => "K",
        }
    }

    /// Whether this position may occupy the FLEX slot.
    pub fn is_flex_eligible(&self) -> bool {
        matches!(self, Position::RB | Position::WR | Position::TE)
    }

    /// Whether quarterback context (pass volume, QB rushing) affects value.
    pub fn is_pass_catcher(&self) -> bool {
        matches!(self, Position::WR | Position::TE)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// Projected season statistics for a player.
///
/// Only `points` drives the core valuation. The rest are secondary signals;
/// every one of them is optional and a missing value never fails a ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectedStats {
    /// Projected season fantasy points (full PPR).
    pub points: f64,
    pub pass_att: Option<f64>,
    pub pass_yds: Option<f64>,
    pub pass_td: Option<f64>,
    pub interceptions: Option<f64>,
    pub rush_att: Option<f64>,
    pub rush_yds: Option<f64>,
    pub rush_td: Option<f64>,
    pub receptions: Option<f64>,
    pub rec_yds: Option<f64>,
    pub rec_td: Option<f64>,
    /// Pass attempts of this receiver's quarterback, when supplied directly.
    pub qb_pass_att: Option<f64>,
    /// Share of this receiver's quarterback's plays that are QB rushes.
    pub qb_rush_share: Option<f64>,
}

/// A draftable player. Immutable once the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    /// NFL team abbreviation; `None` for free agents.
    pub team: Option<String>,
    pub bye_week: Option<u8>,
    /// Consensus average draft position.
    pub adp: Option<f64>,
    pub stats: ProjectedStats,
}

impl Player {
    pub fn projected_points(&self) -> f64 {
        self.stats.points
    }
}
