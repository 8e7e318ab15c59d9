//! Autonomous order policies
//!
//! A policy only reads the game model and answers with an [`Order`]; the
//! scheduler applies it through the same path as interactive orders.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::board::Hex;
use crate::combat::select_defender;
use crate::game::{GameState, PlayerId};
use crate::orders::Order;
use crate::pathfinding::path_for_unit;
use crate::units::UnitId;

/// How many frontier targets are tried before giving up on exploration
const EXPLORE_CANDIDATES: usize = 8;

/// Decides orders for units of a non-interactive player
pub trait OrderPolicy: Send {
    fn order_for(&mut self, state: &GameState, unit: UnitId) -> Order;
}

/// Attack what is adjacent, close in on what is visible, explore otherwise
pub struct AdvancePolicy {
    rng: ChaCha8Rng,
}

impl AdvancePolicy {
    pub fn new() -> Self {
        Self::with_seed(42)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Adjacent visible enemy hex with the weakest defender
    fn attack_target(&mut self, state: &GameState, hex: Hex, owner: PlayerId) -> Option<Hex> {
        let vis = state.visibility(owner);
        let scored: Vec<(Hex, u32)> = state
            .grid()
            .neighbors(hex)
            .filter(|&h| vis.is_visible(h) && state.is_hostile_to(h, owner))
            .filter_map(|h| {
                let defender = select_defender(state, h)?;
                state.unit(defender).map(|d| (h, d.defense()))
            })
            .collect();
        let weakest = scored.iter().map(|&(_, d)| d).min()?;
        let choices: Vec<Hex> = scored
            .into_iter()
            .filter(|&(_, d)| d == weakest)
            .map(|(h, _)| h)
            .collect();
        choices.choose(&mut self.rng).copied()
    }

    /// Enterable hex next to the nearest visible enemy stack
    fn approach_target(&mut self, state: &GameState, unit: UnitId, hex: Hex, owner: PlayerId) -> Option<Hex> {
        let vis = state.visibility(owner);
        let mut enemies: Vec<Hex> = state
            .grid()
            .hexes()
            .filter(|&h| vis.is_visible(h) && state.is_hostile_to(h, owner))
            .collect();
        enemies.sort_by_key(|h| h.distance_to(hex));

        for enemy in enemies {
            let mut staging: Vec<Hex> = state
                .grid()
                .neighbors(enemy)
                .filter(|&h| h != hex && state.is_enterable_by(h, owner))
                .collect();
            staging.shuffle(&mut self.rng);
            staging.sort_by_key(|h| h.distance_to(hex));
            if let Some(&goal) = staging
                .iter()
                .find(|&&goal| !path_for_unit(state, unit, goal).is_empty())
            {
                return Some(goal);
            }
        }
        None
    }

    /// Nearest reachable frontier cell
    fn explore_target(&mut self, state: &GameState, unit: UnitId, hex: Hex, owner: PlayerId) -> Option<Hex> {
        let mut frontier = state.visibility(owner).frontier_sorted();
        frontier.shuffle(&mut self.rng);
        frontier.sort_by_key(|h| h.distance_to(hex));
        frontier
            .into_iter()
            .filter(|&h| state.is_enterable_by(h, owner))
            .take(EXPLORE_CANDIDATES)
            .find(|&goal| !path_for_unit(state, unit, goal).is_empty())
    }
}

impl Default for AdvancePolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderPolicy for AdvancePolicy {
    fn order_for(&mut self, state: &GameState, unit: UnitId) -> Order {
        let Some(u) = state.unit(unit) else {
            return Order::Skip;
        };
        let (hex, owner) = (u.hex, u.owner);

        if u.attacks_left > 0 {
            if let Some(target) = self.attack_target(state, hex, owner) {
                return Order::MoveTo(target);
            }
        }
        if state.has_adjacent_threat(hex, owner) {
            return Order::Skip;
        }
        if let Some(goal) = self.approach_target(state, unit, hex, owner) {
            return Order::MoveTo(goal);
        }
        if let Some(goal) = self.explore_target(state, unit, hex, owner) {
            return Order::MoveTo(goal);
        }
        Order::Skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{PlayerInfo, PlayerKind};
    use crate::grid::HexGrid;
    use crate::units::{get_unit_type, unit_type_index};

    fn game(width: u32, height: u32) -> GameState {
        let players = vec![
            PlayerInfo::new("Red", [200, 40, 40], PlayerKind::Computer),
            PlayerInfo::new("Blue", [40, 40, 200], PlayerKind::Computer),
        ];
        GameState::new(HexGrid::new(width, height), players)
    }

    fn kind(id: &str) -> u8 {
        unit_type_index(id).unwrap()
    }

    #[test]
    fn test_attacks_weakest_adjacent_enemy() {
        let mut game = game(7, 7);
        let inf = game.add_unit(kind("INF"), PlayerId(0), Hex::new(3, 3));
        game.add_unit(kind("ARM"), PlayerId(1), Hex::new(3, 2));
        game.add_unit(kind("SCT"), PlayerId(1), Hex::new(3, 4));
        assert!(get_unit_type(kind("SCT")).defense < get_unit_type(kind("ARM")).defense);

        let mut policy = AdvancePolicy::new();
        assert_eq!(policy.order_for(&game, inf), Order::MoveTo(Hex::new(3, 4)));
    }

    #[test]
    fn test_explores_when_no_enemy_in_sight() {
        let mut game = game(9, 9);
        let scout = game.add_unit(kind("SCT"), PlayerId(0), Hex::new(2, 4));
        let enemy = Hex::new(4, 4);
        game.add_unit(kind("INF"), PlayerId(1), enemy);
        assert!(game.visibility(PlayerId(0)).is_visible(Hex::new(3, 4)));
        // Not visible yet: only the ring around the scout is in sight
        assert!(!game.visibility(PlayerId(0)).is_visible(enemy));

        let mut policy = AdvancePolicy::new();
        let Order::MoveTo(goal) = policy.order_for(&game, scout) else {
            panic!("expected a move");
        };
        // Nothing visible to chase, so the scout heads for the frontier
        assert!(game.visibility(PlayerId(0)).frontier().contains(&goal));
    }

    #[test]
    fn test_closes_in_on_enemy_in_sight() {
        let mut game = game(9, 9);
        let red = game.add_unit(kind("INF"), PlayerId(0), Hex::new(2, 4));
        game.add_unit(kind("SCT"), PlayerId(0), Hex::new(5, 4));
        let enemy = Hex::new(6, 4);
        game.add_unit(kind("INF"), PlayerId(1), enemy);
        assert!(game.visibility(PlayerId(0)).is_visible(enemy));

        let mut policy = AdvancePolicy::with_seed(1);
        let Order::MoveTo(goal) = policy.order_for(&game, red) else {
            panic!("expected a move");
        };
        assert!(goal.is_adjacent(enemy));
        assert!(game.is_enterable_by(goal, PlayerId(0)));
    }

    #[test]
    fn test_skips_when_nothing_to_do() {
        let mut game = game(1, 1);
        let inf = game.add_unit(kind("INF"), PlayerId(0), Hex::new(0, 0));
        let mut policy = AdvancePolicy::new();
        assert_eq!(policy.order_for(&game, inf), Order::Skip);
    }

    #[test]
    fn test_same_seed_same_orders() {
        let mut game = game(9, 9);
        let inf = game.add_unit(kind("INF"), PlayerId(0), Hex::new(4, 4));
        let mut a = AdvancePolicy::with_seed(9);
        let mut b = AdvancePolicy::with_seed(9);
        for _ in 0..5 {
            assert_eq!(a.order_for(&game, inf), b.order_for(&game, inf));
        }
    }
}
