// Quarterback context for pass catchers.
//
// A receiver tied to a high-volume passer gains value; one tied to a
// quarterback who runs a lot loses some.

use serde::Serialize;

use crate::catalog::Player;

pub const DEFAULT_PASS_ATTEMPTS: f64 = 550.0;
pub const DEFAULT_RUSH_SHARE: f64 = 0.2;
pub const MAX_RUSH_SHARE: f64 = 0.8;

const VOLUME_WEIGHT: f64 = 0.15;
const RUSH_WEIGHT: f64 = 0.25;

/// The passing environment a WR/TE plays in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QbContext {
    pub pass_attempts: f64,
    /// Always within `[0, MAX_RUSH_SHARE]`.
    pub rush_share: f64,
}

impl Default for QbContext {
    fn default() -> Self {
        QbContext {
            pass_attempts: DEFAULT_PASS_ATTEMPTS,
            rush_share: DEFAULT_RUSH_SHARE,
        }
    }
}

/// Resolve quarterback context for `player`.
///
/// Each field is taken from the player's own `qb_*` stats if present, then
/// from `team_qb` (the lead quarterback of the player's team), then from the
/// defaults.
pub fn context_with_team_qb(player: &Player, team_qb: Option<&Player>) -> QbContext {
    let pass_attempts = player
        .stats
        .qb_pass_att
        .or_else(|| team_qb.and_then(|qb| qb.stats.pass_att))
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(DEFAULT_PASS_ATTEMPTS);

    let rush_share = player
        .stats
        .qb_rush_share
        .or_else(|| team_qb.and_then(team_rush_share))
        .filter(|v| v.is_finite())
        .unwrap_or(DEFAULT_RUSH_SHARE)
        .clamp(0.0, MAX_RUSH_SHARE);

    QbContext {
        pass_attempts,
        rush_share,
    }
}

/// Rush attempts as a share of the quarterback's total plays.
fn team_rush_share(qb: &Player) -> Option<f64> {
    let pass = qb.stats.pass_att?;
    let rush = qb.stats.rush_att?;
    let plays = pass + rush;
    if plays > 0.0 {
        Some(rush / plays)
    } else {
        None
    }
}

/// Additive adjustment to a player's pre-multiplier value.
///
/// Zero for anyone but WR/TE and whenever `influence` is zero.
pub fn qb_adjustment(player: &Player, context: &QbContext, influence: f64) -> f64 {
    if !player.position.is_pass_catcher() || influence == 0.0 {
        return 0.0;
    }
    let volume = ((context.pass_attempts - DEFAULT_PASS_ATTEMPTS) / DEFAULT_PASS_ATTEMPTS)
        .clamp(-1.0, 1.0);
    let rush = DEFAULT_RUSH_SHARE - context.rush_share;
    influence * player.projected_points() * (VOLUME_WEIGHT * volume + RUSH_WEIGHT * rush)
}
