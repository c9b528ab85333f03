// Ranking engine: scores every untaken, uncapped player and orders them.
//
// score = (base + VOR * 1.4 + qb_adj)
//       * (1 + 0.18 * min(2, useful_slots))
//       * starter_boost * bench_damp * pivot_bonus * round_priority * bye_adj
//       + adp_bonus
//
// Recomputed from scratch on every call; nothing is cached between calls.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use super::bye::{bye_adjustment, bye_matches};
use super::needs::{compute_needs, PositionCaps, PositionNeed};
use super::qb_context::{context_with_team_qb, qb_adjustment};
use super::round_priority::{round_priority, RoundBucket};
use super::runs::{compute_run_biases, pivot_bonus};
use super::vor::{compute_vor, determine_replacement_levels};
use crate::catalog::{Catalog, Player, PlayerId, Position};
use crate::draft::counts::PositionalCounts;
use crate::draft::roster::{Roster, RosterTemplate};
use crate::draft::snake::current_round;
use crate::settings::Settings;

/// Weight of VOR relative to the scoring-adjusted projection.
pub const VOR_WEIGHT: f64 = 1.4;
/// ADP at or beyond which no bonus is given.
pub const ADP_BONUS_CEILING: f64 = 100.0;
/// Bonus per ADP spot under the ceiling.
pub const ADP_BONUS_PER_SPOT: f64 = 0.01;

/// Everything the engine reads. All borrowed; ranking never mutates state.
#[derive(Debug, Clone, Copy)]
pub struct RankingInputs<'a> {
    pub catalog: &'a Catalog,
    /// Ids taken by anyone.
    pub taken: &'a HashSet<&'a str>,
    /// The self-owner's projected roster.
    pub roster: &'a Roster,
    pub counts: &'a PositionalCounts,
    pub settings: &'a Settings,
    pub template: &'a RosterTemplate,
    pub caps: &'a PositionCaps,
    /// Length of the draft log.
    pub picks_made: usize,
}

/// Every term that went into a player's score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub projected_points: f64,
    pub scoring_weight: f64,
    pub base: f64,
    pub vor: f64,
    pub qb_adjustment: f64,
    pub useful_slots: f64,
    pub need_multiplier: f64,
    pub starter_boost: f64,
    pub bench_damp: f64,
    pub run_bias: f64,
    pub pivot_bonus: f64,
    pub round: u32,
    pub round_priority: f64,
    pub bye_matches: usize,
    pub bye_adjustment: f64,
    pub adp_bonus: f64,
}

impl ScoreBreakdown {
    /// Value before any multiplier.
    pub fn pre_multiplier(&self) -> f64 {
        self.base + self.vor * VOR_WEIGHT + self.qb_adjustment
    }

    /// Product of every multiplicative term.
    pub fn multiplier(&self) -> f64 {
        self.need_multiplier
            * self.starter_boost
            * self.bench_damp
            * self.pivot_bonus
            * self.round_priority
            * self.bye_adjustment
    }

    pub fn score(&self) -> f64 {
        self.pre_multiplier() * self.multiplier() + self.adp_bonus
    }

    /// One-line human-readable explanation of the score.
    pub fn describe(&self) -> String {
        let mut parts = vec![format!(
            "base {:.1} + VOR {:.1}x{VOR_WEIGHT}",
            self.base, self.vor
        )];
        if self.qb_adjustment != 0.0 {
            parts.push(format!("QB {:+.1}", self.qb_adjustment));
        }
        let mut text = parts.join(" ");
        text.push_str(&format!(
            " | need x{:.2} ({:.2} slots)",
            self.need_multiplier, self.useful_slots
        ));
        if self.starter_boost != 1.0 {
            text.push_str(&format!(" | starter x{:.2}", self.starter_boost));
        }
        if self.bench_damp != 1.0 {
            text.push_str(&format!(" | bench x{:.2}", self.bench_damp));
        }
        text.push_str(&format!(
            " | pivot x{:.2} (run {:+.2})",
            self.pivot_bonus, self.run_bias
        ));
        text.push_str(&format!(
            " | round {} x{:.2}",
            self.round, self.round_priority
        ));
        if self.bye_matches > 0 {
            text.push_str(&format!(
                " | bye x{:.2} ({} same-bye)",
                self.bye_adjustment, self.bye_matches
            ));
        }
        if self.adp_bonus > 0.0 {
            text.push_str(&format!(" | ADP +{:.2}", self.adp_bonus));
        }
        text
    }
}

/// One row of ranking output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPlayer {
    /// 1-based position in the ranking.
    pub rank: usize,
    pub player_id: PlayerId,
    pub name: String,
    pub position: Position,
    pub team: Option<String>,
    pub bye_week: Option<u8>,
    pub adp: Option<f64>,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    pub explanation: String,
}

/// `max(0, (100 - adp) * 0.01)`; no ADP means no bonus.
pub fn adp_bonus(adp: Option<f64>) -> f64 {
    adp.filter(|v| v.is_finite())
        .map(|v| ((ADP_BONUS_CEILING - v) * ADP_BONUS_PER_SPOT).max(0.0))
        .unwrap_or(0.0)
}

/// Per-call values shared by every candidate.
struct Context<'a> {
    replacement_levels: HashMap<Position, f64>,
    run_biases: BTreeMap<Position, f64>,
    needs: BTreeMap<Position, PositionNeed>,
    lead_qbs: HashMap<&'a str, &'a Player>,
    round: u32,
    bucket: RoundBucket,
}

/// Rank every untaken player whose position is not at its cap.
///
/// Output is sorted by descending score; exact ties keep catalog order.
pub fn rank_players(inputs: &RankingInputs<'_>) -> Vec<RankedPlayer> {
    let round = current_round(inputs.picks_made, inputs.settings.league_size);
    let ctx = Context {
        replacement_levels: determine_replacement_levels(inputs.catalog),
        run_biases: compute_run_biases(inputs.counts, inputs.settings.run_sensitivity),
        needs: compute_needs(inputs.roster, inputs.template),
        lead_qbs: inputs.catalog.lead_quarterbacks(),
        round,
        bucket: RoundBucket::from_round(round),
    };

    let capped: HashSet<Position> = Position::ALL
        .into_iter()
        .filter(|&pos| inputs.caps.is_capped(pos, inputs.roster))
        .collect();

    let mut ranked: Vec<RankedPlayer> = inputs
        .catalog
        .players()
        .iter()
        .filter(|p| !inputs.taken.contains(p.id.as_str()))
        .filter(|p| !capped.contains(&p.position))
        .map(|p| {
            let breakdown = score_breakdown(p, inputs, &ctx);
            RankedPlayer {
                rank: 0,
                player_id: p.id.clone(),
                name: p.name.clone(),
                position: p.position,
                team: p.team.clone(),
                bye_week: p.bye_week,
                adp: p.adp,
                score: breakdown.score(),
                explanation: breakdown.describe(),
                breakdown,
            }
        })
        .collect();

    // Stable: equal scores keep catalog order.
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (i, row) in ranked.iter_mut().enumerate() {
        row.rank = i + 1;
    }

    debug!(
        "Ranked {} players (round {}, {} taken, capped: {:?})",
        ranked.len(),
        round,
        inputs.taken.len(),
        capped
    );
    ranked
}

fn score_breakdown(player: &Player, inputs: &RankingInputs<'_>, ctx: &Context<'_>) -> ScoreBreakdown {
    let position = player.position;
    let settings = inputs.settings;

    let scoring_weight = settings.scoring.weight(position);
    let base = player.projected_points() * scoring_weight;
    let vor = compute_vor(player, &ctx.replacement_levels);

    let qb_adj = if position.is_pass_catcher() && settings.qb_influence != 0.0 {
        let team_qb = player
            .team
            .as_deref()
            .and_then(|team| ctx.lead_qbs.get(team).copied());
        let qb_ctx = context_with_team_qb(player, team_qb);
        qb_adjustment(player, &qb_ctx, settings.qb_influence)
    } else {
        0.0
    };

    let need = ctx.needs.get(&position).copied().unwrap_or(PositionNeed {
        starters_remaining: 0,
        flex_share: 0.0,
    });
    let run_bias = ctx.run_biases.get(&position).copied().unwrap_or(0.0);
    let matches = bye_matches(player, inputs.roster);

    ScoreBreakdown {
        projected_points: player.projected_points(),
        scoring_weight,
        base,
        vor,
        qb_adjustment: qb_adj,
        useful_slots: need.useful_slots(),
        need_multiplier: need.need_multiplier(),
        starter_boost: need.starter_boost(),
        bench_damp: need.bench_damp(),
        run_bias,
        pivot_bonus: pivot_bonus(run_bias),
        round: ctx.round,
        round_priority: round_priority(position, ctx.bucket),
        bye_matches: matches,
        bye_adjustment: bye_adjustment(matches),
        adp_bonus: adp_bonus(player.adp),
    }
}
