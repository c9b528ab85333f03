// Player catalog: the read-only pool of draftable players.

pub mod load;
pub mod player;

use std::collections::HashMap;

pub use player::{Player, PlayerId, Position, ProjectedStats};

/// The full set of draftable players, in load order.
///
/// Load order is meaningful: it is the tie-break order when two players
/// rank with exactly equal scores.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    players: Vec<Player>,
    index: HashMap<PlayerId, usize>,
}

impl Catalog {
    /// Build a catalog from players. Later duplicates of an id are dropped.
    pub fn new(players: Vec<Player>) -> Self {
        let mut kept = Vec::with_capacity(players.len());
        let mut index = HashMap::with_capacity(players.len());
        for player in players {
            if index.contains_key(&player.id) {
                continue;
            }
            index.insert(player.id.clone(), kept.len());
            kept.push(player);
        }
        Catalog {
            players: kept,
            index,
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.index.get(id).map(|&i| &self.players[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// The highest-projected quarterback of every team. On a tie the one
    /// loaded later wins.
    pub fn lead_quarterbacks(&self) -> HashMap<&str, &Player> {
        let mut leads: HashMap<&str, &Player> = HashMap::new();
        for qb in self.players.iter().filter(|p| p.position == Position::QB) {
            let Some(team) = qb.team.as_deref() else {
                continue;
            };
            match leads.get(team) {
                Some(current) if current.projected_points() > qb.projected_points() => {}
                _ => {
                    leads.insert(team, qb);
                }
            }
        }
        leads
    }
}
