// Live draft settings shared by every connected view.
//
// Settings start from league.toml and are then updated in place by partial
// patches. A patch is merged onto the current settings and the merged result
// is validated as a whole; on any violation nothing changes.

use serde::{Deserialize, Serialize};

use crate::catalog::Position;
use crate::draft::DraftError;

/// League scoring format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    Standard,
    HalfPpr,
    Ppr,
}

impl ScoringMode {
    /// Multiplier applied to a player's (full PPR) projection under this
    /// scoring mode. Receptions matter only to RB/WR/TE.
    pub fn weight(&self, position: Position) -> f64 {
        match (self, position) {
            (ScoringMode::Ppr, _) => 1.0,
            (ScoringMode::HalfPpr, Position::RB) => 0.95,
            (ScoringMode::HalfPpr, Position::WR) => 0.93,
            (ScoringMode::HalfPpr, Position::TE) => 0.94,
            (ScoringMode::Standard, Position::RB) => 0.90,
            (ScoringMode::Standard, Position::WR) => 0.86,
            (ScoringMode::Standard, Position::TE) => 0.88,
            (_, Position::QB | Position::DST | Position::K) => 1.0,
        }
    }
}

pub const MIN_LEAGUE_SIZE: u32 = 2;
pub const MAX_LEAGUE_SIZE: u32 = 32;
pub const MAX_ROUNDS: u32 = 30;

/// The six live-tunable draft settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Number of drafters.
    pub league_size: u32,
    /// 1-based position in the snake order.
    pub draft_slot: u32,
    pub rounds: u32,
    pub scoring: ScoringMode,
    /// 0..=1; how strongly quarterback context moves WR/TE values.
    pub qb_influence: f64,
    /// 0..=2; how strongly positional runs damp the pivot bonus.
    pub run_sensitivity: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            league_size: 12,
            draft_slot: 6,
            rounds: 16,
            scoring: ScoringMode::Ppr,
            qb_influence: 0.5,
            run_sensitivity: 1.0,
        }
    }
}

/// A partial settings update. Absent fields keep their current value; a
/// field this struct does not know is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsPatch {
    #[serde(default)]
    pub league_size: Option<u32>,
    #[serde(default)]
    pub draft_slot: Option<u32>,
    #[serde(default)]
    pub rounds: Option<u32>,
    #[serde(default)]
    pub scoring: Option<ScoringMode>,
    #[serde(default)]
    pub qb_influence: Option<f64>,
    #[serde(default)]
    pub run_sensitivity: Option<f64>,
}

impl Settings {
    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), DraftError> {
        if !(MIN_LEAGUE_SIZE..=MAX_LEAGUE_SIZE).contains(&self.league_size) {
            return Err(invalid(
                "league_size",
                format!(
                    "must be between {MIN_LEAGUE_SIZE} and {MAX_LEAGUE_SIZE}, got {}",
                    self.league_size
                ),
            ));
        }
        if self.draft_slot == 0 || self.draft_slot > self.league_size {
            return Err(invalid(
                "draft_slot",
                format!(
                    "must be between 1 and league_size ({}), got {}",
                    self.league_size, self.draft_slot
                ),
            ));
        }
        if self.rounds == 0 || self.rounds > MAX_ROUNDS {
            return Err(invalid(
                "rounds",
                format!("must be between 1 and {MAX_ROUNDS}, got {}", self.rounds),
            ));
        }
        if !(0.0..=1.0).contains(&self.qb_influence) {
            return Err(invalid(
                "qb_influence",
                format!("must be between 0.0 and 1.0 inclusive, got {}", self.qb_influence),
            ));
        }
        if !(0.0..=2.0).contains(&self.run_sensitivity) {
            return Err(invalid(
                "run_sensitivity",
                format!(
                    "must be between 0.0 and 2.0 inclusive, got {}",
                    self.run_sensitivity
                ),
            ));
        }
        Ok(())
    }

    /// Return these settings with `patch` merged on top, or an error if the
    /// merged result is out of range. `self` is never modified.
    pub fn merged(&self, patch: &SettingsPatch) -> Result<Settings, DraftError> {
        let merged = Settings {
            league_size: patch.league_size.unwrap_or(self.league_size),
            draft_slot: patch.draft_slot.unwrap_or(self.draft_slot),
            rounds: patch.rounds.unwrap_or(self.rounds),
            scoring: patch.scoring.unwrap_or(self.scoring),
            qb_influence: patch.qb_influence.unwrap_or(self.qb_influence),
            run_sensitivity: patch.run_sensitivity.unwrap_or(self.run_sensitivity),
        };
        merged.validate()?;
        Ok(merged)
    }

    /// Apply `patch` in place. On error the current settings are retained.
    pub fn apply(&mut self, patch: &SettingsPatch) -> Result<(), DraftError> {
        *self = self.merged(patch)?;
        Ok(())
    }
}

fn invalid(field: &str, message: String) -> DraftError {
    DraftError::InvalidSettings {
        field: field.to_string(),
        message,
    }
}
