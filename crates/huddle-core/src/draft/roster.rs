// Roster construction and slot assignment.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::pick::Pick;
use crate::catalog::{Catalog, Player, Position};

/// Roster slot categories, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SlotCategory {
    QB,
    RB,
    WR,
    TE,
    FLEX,
    DST,
    K,
    BENCH,
    IR,
}

impl SlotCategory {
    pub const ALL: [SlotCategory; 9] = [
        SlotCategory::QB,
        SlotCategory::RB,
        SlotCategory::WR,
        SlotCategory::TE,
        SlotCategory::FLEX,
        SlotCategory::DST,
        SlotCategory::K,
        SlotCategory::BENCH,
        SlotCategory::IR,
    ];

    /// Parse a roster config key. Accepts "BE"/"BN" for bench and "IL" for IR.
    pub fn from_str_slot(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(SlotCategory::QB),
            "RB" => Some(SlotCategory::RB),
            "WR" => Some(SlotCategory::WR),
            "TE" => Some(SlotCategory::TE),
            "FLEX" | "W/R/T" => Some(SlotCategory::FLEX),
            "DST" | "D/ST" | "DEF" => Some(SlotCategory::DST),
            "K" => Some(SlotCategory::K),
            "BENCH" | "BE" | "BN" => Some(SlotCategory::BENCH),
            "IR" | "IL" => Some(SlotCategory::IR),
            _ => None,
        }
    }

    /// The dedicated starter slot for a playing position.
    pub fn starter_for(position: Position) -> Self {
        match position {
            Position::QB => SlotCategory::QB,
            Position::RB => SlotCategory::RB,
            Position::WR => SlotCategory::WR,
            Position::TE => SlotCategory::TE,
            Position::DST => SlotCategory::DST,
            Position::K => SlotCategory::K,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            SlotCategory::QB => "QB",
            SlotCategory::RB => "RB",
            SlotCategory::WR => "WR",
            SlotCategory::TE => "TE",
            SlotCategory::FLEX => "FLEX",
            SlotCategory::DST => "DST",
            SlotCategory::K => "K",
            SlotCategory::BENCH => "BENCH",
            SlotCategory::IR => "IR",
        }
    }
}

impl fmt::Display for SlotCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Roster template
// ---------------------------------------------------------------------------

/// Slot capacities per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterTemplate {
    capacities: BTreeMap<SlotCategory, usize>,
}

impl Default for RosterTemplate {
    fn default() -> Self {
        let capacities = [
            (SlotCategory::QB, 1),
            (SlotCategory::RB, 2),
            (SlotCategory::WR, 2),
            (SlotCategory::TE, 1),
            (SlotCategory::FLEX, 1),
            (SlotCategory::DST, 1),
            (SlotCategory::K, 1),
            (SlotCategory::BENCH, 7),
            (SlotCategory::IR, 1),
        ]
        .into_iter()
        .collect();
        RosterTemplate { capacities }
    }
}

impl RosterTemplate {
    /// Build a template from a config mapping of slot names to counts, e.g.
    /// `{"QB": 1, "RB": 2, "FLEX": 1, "BENCH": 7}`.
    ///
    /// Unknown keys are ignored; categories absent from the config get 0.
    pub fn from_config(roster_config: &HashMap<String, usize>) -> Self {
        let mut capacities: BTreeMap<SlotCategory, usize> =
            SlotCategory::ALL.iter().map(|&c| (c, 0)).collect();
        for (key, &count) in roster_config {
            match SlotCategory::from_str_slot(key) {
                Some(cat) => {
                    capacities.insert(cat, count);
                }
                None => debug!("ignoring unknown roster slot key '{}'", key),
            }
        }
        RosterTemplate { capacities }
    }

    pub fn capacity(&self, category: SlotCategory) -> usize {
        self.capacities.get(&category).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// The self-owner's players allocated into slot categories.
///
/// Every category is always present (possibly empty) so consumers can render
/// a stable layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub slots: BTreeMap<SlotCategory, Vec<Player>>,
}

impl Default for Roster {
    fn default() -> Self {
        Roster::empty()
    }
}

impl Roster {
    /// A roster with every slot category present and empty.
    pub fn empty() -> Self {
        Roster {
            slots: SlotCategory::ALL.iter().map(|&c| (c, Vec::new())).collect(),
        }
    }

    pub fn players_in(&self, category: SlotCategory) -> &[Player] {
        self.slots.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of players in a slot category.
    pub fn filled(&self, category: SlotCategory) -> usize {
        self.players_in(category).len()
    }

    /// Remaining capacity of a slot category under `template`.
    pub fn remaining(&self, category: SlotCategory, template: &RosterTemplate) -> usize {
        template.capacity(category).saturating_sub(self.filled(category))
    }

    /// Every rostered player at `position`, whatever slot they occupy.
    pub fn players_at(&self, position: Position) -> impl Iterator<Item = &Player> {
        self.slots
            .values()
            .flatten()
            .filter(move |p| p.position == position)
    }

    /// How many rostered players play `position`.
    pub fn count_at(&self, position: Position) -> usize {
        self.players_at(position).count()
    }

    /// Total number of rostered players.
    pub fn total(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    /// Place a player using the greedy, order-sensitive rule:
    /// 1. Starter slot for the exact position, if capacity remains
    /// 2. FLEX (RB/WR/TE only), if capacity remains
    /// 3. BENCH
    ///
    /// Bench never refuses a player, so every drafted player lands somewhere.
    /// Returns the category the player was placed in.
    pub fn add_player(&mut self, player: Player, template: &RosterTemplate) -> SlotCategory {
        let starter = SlotCategory::starter_for(player.position);
        let category = if self.remaining(starter, template) > 0 {
            starter
        } else if player.position.is_flex_eligible()
            && self.remaining(SlotCategory::FLEX, template) > 0
        {
            SlotCategory::FLEX
        } else {
            SlotCategory::BENCH
        };
        self.slots.entry(category).or_default().push(player);
        category
    }
}

/// Replay the self-owner's picks, in draft order, into a fresh roster.
///
/// Always rebuilds from scratch: assignment is irrevocable per pick, so the
/// result depends on draft order, and the log may have been undone or reset
/// since the last call. Picks whose player is missing from the catalog are
/// skipped.
pub fn project_roster<'a>(
    my_picks: impl IntoIterator<Item = &'a Pick>,
    catalog: &Catalog,
    template: &RosterTemplate,
) -> Roster {
    let mut roster = Roster::empty();
    for pick in my_picks {
        match catalog.get(&pick.player_id) {
            Some(player) => {
                roster.add_player(player.clone(), template);
            }
            None => debug!("roster projection skipping unknown player {}", pick.player_id),
        }
    }
    roster
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProjectedStats;
    use crate::draft::pick::Owner;

    fn player(id: &str, position: Position) -> Player {
        Player {
            id: id.to_string(),
            name: id.to_string(),
            position,
            team: None,
            bye_week: None,
            adp: None,
            stats: ProjectedStats::default(),
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            player("qb1", Position::QB),
            player("qb2", Position::QB),
            player("rb1", Position::RB),
            player("rb2", Position::RB),
            player("rb3", Position::RB),
            player("rb4", Position::RB),
            player("wr1", Position::WR),
            player("wr2", Position::WR),
            player("wr3", Position::WR),
            player("te1", Position::TE),
            player("te2", Position::TE),
            player("k1", Position::K),
        ])
    }

    fn picks(ids: &[&str]) -> Vec<Pick> {
        ids.iter().map(|id| Pick::new(*id, Owner::SelfOwner)).collect()
    }

    fn ids_in(roster: &Roster, cat: SlotCategory) -> Vec<String> {
        roster.players_in(cat).iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn default_template_counts() {
        let t = RosterTemplate::default();
        assert_eq!(t.capacity(SlotCategory::QB), 1);
        assert_eq!(t.capacity(SlotCategory::RB), 2);
        assert_eq!(t.capacity(SlotCategory::WR), 2);
        assert_eq!(t.capacity(SlotCategory::TE), 1);
        assert_eq!(t.capacity(SlotCategory::FLEX), 1);
        assert_eq!(t.capacity(SlotCategory::DST), 1);
        assert_eq!(t.capacity(SlotCategory::K), 1);
        assert_eq!(t.capacity(SlotCategory::BENCH), 7);
        assert_eq!(t.capacity(SlotCategory::IR), 1);
    }

    #[test]
    fn template_from_config_accepts_aliases() {
        let mut config = HashMap::new();
        config.insert("QB".to_string(), 2);
        config.insert("BE".to_string(), 5);
        config.insert("D/ST".to_string(), 1);
        config.insert("XYZ".to_string(), 9);
        let t = RosterTemplate::from_config(&config);
        assert_eq!(t.capacity(SlotCategory::QB), 2);
        assert_eq!(t.capacity(SlotCategory::BENCH), 5);
        assert_eq!(t.capacity(SlotCategory::DST), 1);
        assert_eq!(t.capacity(SlotCategory::FLEX), 0);
    }

    #[test]
    fn empty_roster_has_every_category() {
        let roster = Roster::empty();
        assert_eq!(roster.slots.len(), SlotCategory::ALL.len());
        assert_eq!(roster.total(), 0);
    }

    #[test]
    fn starters_then_flex_then_bench() {
        let roster = project_roster(
            &picks(&["rb1", "rb2", "rb3", "rb4"]),
            &catalog(),
            &RosterTemplate::default(),
        );
        assert_eq!(ids_in(&roster, SlotCategory::RB), vec!["rb1", "rb2"]);
        assert_eq!(ids_in(&roster, SlotCategory::FLEX), vec!["rb3"]);
        assert_eq!(ids_in(&roster, SlotCategory::BENCH), vec!["rb4"]);
    }

    #[test]
    fn non_flex_position_overflow_goes_to_bench() {
        let roster = project_roster(&picks(&["qb1", "qb2"]), &catalog(), &RosterTemplate::default());
        assert_eq!(ids_in(&roster, SlotCategory::QB), vec!["qb1"]);
        assert!(ids_in(&roster, SlotCategory::FLEX).is_empty());
        assert_eq!(ids_in(&roster, SlotCategory::BENCH), vec!["qb2"]);
    }

    #[test]
    fn te_fills_te_and_later_rb_fills_flex() {
        // RB starters already full; only TE's starter slot and FLEX remain.
        let roster = project_roster(
            &picks(&["rb1", "rb2", "te1", "rb3"]),
            &catalog(),
            &RosterTemplate::default(),
        );
        assert_eq!(ids_in(&roster, SlotCategory::TE), vec!["te1"]);
        assert_eq!(ids_in(&roster, SlotCategory::FLEX), vec!["rb3"]);
        assert!(ids_in(&roster, SlotCategory::BENCH).is_empty());
    }

    #[test]
    fn assignment_depends_on_draft_order() {
        let cat = catalog();
        let t = RosterTemplate::default();
        // Second TE drafted before the third WR: TE2 takes FLEX, WR3 benched.
        let a = project_roster(&picks(&["wr1", "wr2", "te1", "te2", "wr3"]), &cat, &t);
        assert_eq!(ids_in(&a, SlotCategory::FLEX), vec!["te2"]);
        assert_eq!(ids_in(&a, SlotCategory::BENCH), vec!["wr3"]);

        // Swap the last two: WR3 takes FLEX, TE2 benched.
        let b = project_roster(&picks(&["wr1", "wr2", "te1", "wr3", "te2"]), &cat, &t);
        assert_eq!(ids_in(&b, SlotCategory::FLEX), vec!["wr3"]);
        assert_eq!(ids_in(&b, SlotCategory::BENCH), vec!["te2"]);
    }

    #[test]
    fn bench_overflow_still_rosters_every_player() {
        let mut config = HashMap::new();
        config.insert("RB".to_string(), 1);
        config.insert("BENCH".to_string(), 1);
        let t = RosterTemplate::from_config(&config);
        let roster = project_roster(&picks(&["rb1", "rb2", "rb3", "rb4"]), &catalog(), &t);
        assert_eq!(roster.total(), 4);
        assert_eq!(roster.filled(SlotCategory::BENCH), 3);
    }

    #[test]
    fn every_pick_in_exactly_one_category() {
        let my = picks(&["qb1", "rb1", "wr1", "te1", "rb2", "wr2", "rb3", "wr3", "te2", "k1", "qb2"]);
        let roster = project_roster(&my, &catalog(), &RosterTemplate::default());
        assert_eq!(roster.total(), my.len());
        for pick in &my {
            let hits = roster
                .slots
                .values()
                .flatten()
                .filter(|p| p.id == pick.player_id)
                .count();
            assert_eq!(hits, 1, "{} should appear exactly once", pick.player_id);
        }
        assert_eq!(roster.filled(SlotCategory::IR), 0);
    }

    #[test]
    fn unknown_picks_are_skipped() {
        let roster = project_roster(&picks(&["rb1", "ghost"]), &catalog(), &RosterTemplate::default());
        assert_eq!(roster.total(), 1);
    }

    #[test]
    fn count_at_includes_flex_and_bench() {
        let roster = project_roster(
            &picks(&["rb1", "rb2", "rb3", "rb4"]),
            &catalog(),
            &RosterTemplate::default(),
        );
        assert_eq!(roster.count_at(Position::RB), 4);
        assert_eq!(roster.count_at(Position::WR), 0);
        assert_eq!(roster.remaining(SlotCategory::RB, &RosterTemplate::default()), 0);
        assert!(roster.remaining(SlotCategory::WR, &RosterTemplate::default()) > 0);
    }
}
