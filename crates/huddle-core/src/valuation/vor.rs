// Value Over Replacement (VOR).
//
// A player's projection minus the projection of the nominal last
// starter-worthy player at the same position. Replacement levels come from
// the whole catalog, drafted or not, so they stay fixed through the draft.

use std::collections::HashMap;

use crate::catalog::{Catalog, Player, Position};

/// 1-based rank within a position whose projection defines replacement level.
pub fn replacement_rank(position: Position) -> usize {
    match position {
        Position::QB => 12,
        Position::RB => 24,
        Position::WR => 30,
        Position::TE => 12,
        Position::DST => 12,
        Position::K => 12,
    }
}

/// Determine the replacement-level projection for every position present in
/// the catalog.
///
/// Players are grouped by position and sorted descending by projected
/// points. Replacement is the player at `replacement_rank`, or the lowest
/// ranked player when the position has fewer than that. Positions with no
/// players get no entry.
pub fn determine_replacement_levels(catalog: &Catalog) -> HashMap<Position, f64> {
    let mut by_position: HashMap<Position, Vec<f64>> = HashMap::new();
    for player in catalog.players() {
        by_position
            .entry(player.position)
            .or_default()
            .push(player.projected_points());
    }

    let mut levels = HashMap::new();
    for (position, mut points) in by_position {
        points.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        let idx = (replacement_rank(position) - 1).min(points.len() - 1);
        levels.insert(position, points[idx]);
    }
    levels
}

/// VOR for a single player. A position without a replacement level (which
/// cannot happen for a player drawn from the same catalog) counts as 0.
pub fn compute_vor(player: &Player, replacement_levels: &HashMap<Position, f64>) -> f64 {
    let repl = replacement_levels
        .get(&player.position)
        .copied()
        .unwrap_or(0.0);
    player.projected_points() - repl
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProjectedStats;

    fn player(id: &str, position: Position, points: f64) -> Player {
        Player {
            id: id.to_string(),
            name: id.to_string(),
            position,
            team: None,
            bye_week: None,
            adp: None,
            stats: ProjectedStats {
                points,
                ..Default::default()
            },
        }
    }

    /// `n` players at `position` with projections n*10, (n-1)*10, ..., 10,
    /// listed in ascending order to make sure sorting happens.
    fn ladder(position: Position, n: usize) -> Vec<Player> {
        (1..=n)
            .map(|i| player(&format!("{position}{i}"), position, i as f64 * 10.0))
            .collect()
    }

    #[test]
    fn replacement_ranks() {
        assert_eq!(replacement_rank(Position::QB), 12);
        assert_eq!(replacement_rank(Position::RB), 24);
        assert_eq!(replacement_rank(Position::WR), 30);
        assert_eq!(replacement_rank(Position::TE), 12);
        assert_eq!(replacement_rank(Position::DST), 12);
        assert_eq!(replacement_rank(Position::K), 12);
    }

    #[test]
    fn replacement_is_player_at_rank() {
        let mut players = ladder(Position::QB, 20);
        players.extend(ladder(Position::RB, 40));
        let catalog = Catalog::new(players);
        let levels = determine_replacement_levels(&catalog);

        // QB: 200, 190, ... -> 12th is 200 - 11*10 = 90.
        assert!((levels[&Position::QB] - 90.0).abs() < 1e-9);
        // RB: 400 down -> 24th is 400 - 23*10 = 170.
        assert!((levels[&Position::RB] - 170.0).abs() < 1e-9);
        assert!(!levels.contains_key(&Position::K));
    }

    #[test]
    fn short_position_uses_lowest_ranked() {
        let catalog = Catalog::new(ladder(Position::K, 5));
        let levels = determine_replacement_levels(&catalog);
        assert!((levels[&Position::K] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn replacement_player_has_zero_vor() {
        let catalog = Catalog::new(ladder(Position::WR, 45));
        let levels = determine_replacement_levels(&catalog);

        let mut sorted: Vec<&Player> = catalog.players().iter().collect();
        sorted.sort_by(|a, b| b.projected_points().partial_cmp(&a.projected_points()).unwrap());
        let thirtieth = sorted[29];
        assert_eq!(compute_vor(thirtieth, &levels), 0.0);
        assert!(compute_vor(sorted[0], &levels) > 0.0);
        assert!(compute_vor(sorted[40], &levels) < 0.0);
    }
}
