//! A* pathfinding over the hex grid
//!
//! Every step costs 1 and the heuristic is hex distance, which never
//! overestimates the remaining step count. Nodes with equal `f` leave the
//! open set in insertion order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;

use crate::board::Hex;
use crate::game::GameState;
use crate::grid::HexGrid;
use crate::units::UnitId;

/// Node in the A* open set
#[derive(Debug, Clone, PartialEq, Eq)]
struct PathNode {
    coord: Hex,
    g_cost: u32,
    f_cost: u32,
    /// Insertion sequence, breaks `f` ties first-in first-out
    seq: u64,
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a path from `start` to `goal` through hexes accepted by `passable`.
///
/// The returned path excludes `start` and ends at `goal`. It is empty when
/// `start == goal` or when no route exists. `start` itself is never tested
/// against the filter; `goal` is.
pub fn find_path<F>(grid: &HexGrid, start: Hex, goal: Hex, mut passable: F) -> Vec<Hex>
where
    F: FnMut(Hex) -> bool,
{
    if start == goal || !grid.contains(start) || !grid.contains(goal) {
        return Vec::new();
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: FxHashMap<Hex, Hex> = FxHashMap::default();
    // Best known g for every hex ever reached, open or already expanded
    let mut g_scores: FxHashMap<Hex, u32> = FxHashMap::default();
    let mut seq = 0u64;

    g_scores.insert(start, 0);
    open_set.push(PathNode {
        coord: start,
        g_cost: 0,
        f_cost: start.distance_to(goal),
        seq,
    });

    while let Some(current) = open_set.pop() {
        if current.coord == goal {
            return reconstruct_path(&came_from, start, goal);
        }

        // Stale entry superseded by a cheaper one
        if g_scores.get(&current.coord).is_some_and(|&g| g < current.g_cost) {
            continue;
        }

        let tentative_g = current.g_cost + 1;
        for neighbor in grid.neighbors(current.coord) {
            if !passable(neighbor) {
                continue;
            }

            let known_g = g_scores.get(&neighbor).copied().unwrap_or(u32::MAX);
            if tentative_g >= known_g {
                continue;
            }

            came_from.insert(neighbor, current.coord);
            g_scores.insert(neighbor, tentative_g);

            seq += 1;
            open_set.push(PathNode {
                coord: neighbor,
                g_cost: tentative_g,
                f_cost: tentative_g + neighbor.distance_to(goal),
                seq,
            });
        }
    }

    Vec::new()
}

/// Follow predecessor links back from the goal, dropping the start hex
fn reconstruct_path(came_from: &FxHashMap<Hex, Hex>, start: Hex, goal: Hex) -> Vec<Hex> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        if prev == start {
            break;
        }
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Path for a unit, through hexes that are empty or held by its owner
pub fn path_for_unit(state: &GameState, unit: UnitId, goal: Hex) -> Vec<Hex> {
    let Some(u) = state.unit(unit) else {
        return Vec::new();
    };
    let owner = u.owner;
    find_path(state.grid(), u.hex, goal, |hex| state.is_enterable_by(hex, owner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;
    use crate::game::{PlayerId, PlayerInfo, PlayerKind};
    use crate::units::unit_type_index;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::collections::VecDeque;

    /// Independent breadth-first step count under the same filter
    fn bfs_steps<F>(grid: &HexGrid, start: Hex, goal: Hex, passable: F) -> Option<u32>
    where
        F: Fn(Hex) -> bool,
    {
        let mut seen = FxHashSet::default();
        let mut queue = VecDeque::new();
        seen.insert(start);
        queue.push_back((start, 0));
        while let Some((hex, steps)) = queue.pop_front() {
            if hex == goal {
                return Some(steps);
            }
            for n in grid.neighbors(hex) {
                if passable(n) && seen.insert(n) {
                    queue.push_back((n, steps + 1));
                }
            }
        }
        None
    }

    fn assert_well_formed(path: &[Hex], start: Hex, goal: Hex) {
        assert_eq!(path.last(), Some(&goal));
        assert!(!path.contains(&start));
        let mut prev = start;
        for &hex in path {
            assert!(prev.is_adjacent(hex), "{:?} -> {:?} not adjacent", prev, hex);
            prev = hex;
        }
    }

    fn game_7x7() -> GameState {
        let players = vec![
            PlayerInfo::new("Red", [200, 40, 40], PlayerKind::Computer),
            PlayerInfo::new("Blue", [40, 40, 200], PlayerKind::Computer),
        ];
        GameState::new(HexGrid::new(7, 7), players)
    }

    #[test]
    fn test_straight_path_on_empty_grid() {
        let mut game = game_7x7();
        let inf = unit_type_index("INF").unwrap();
        let unit = game.add_unit(inf, PlayerId(0), Hex::new(0, 0));

        let path = path_for_unit(&game, unit, Hex::new(0, 4));
        assert_eq!(path.len() as u32, Hex::new(0, 0).distance_to(Hex::new(0, 4)));
        assert_well_formed(&path, Hex::new(0, 0), Hex::new(0, 4));

        assert!(path_for_unit(&game, unit, Hex::new(0, 0)).is_empty());
    }

    #[test]
    fn test_blocked_corridor_yields_empty_path() {
        // Column 2 is a wall of water except for one gap at row 3,
        // and the gap is held by the enemy.
        let grid = HexGrid::new(5, 7);
        let gap = Hex::new(2, 3);
        let wall = |hex: Hex| hex.col == 2 && hex != gap;

        let open = find_path(&grid, Hex::new(0, 3), Hex::new(4, 3), |h| !wall(h));
        assert!(!open.is_empty());
        assert!(open.contains(&gap));

        let mut game = GameState::new(
            grid,
            vec![
                PlayerInfo::new("Red", [200, 40, 40], PlayerKind::Computer),
                PlayerInfo::new("Blue", [40, 40, 200], PlayerKind::Computer),
            ],
        );
        let inf = unit_type_index("INF").unwrap();
        let mover = game.add_unit(inf, PlayerId(0), Hex::new(0, 3));
        game.add_unit(inf, PlayerId(1), gap);

        let owner = game.unit(mover).unwrap().owner;
        let blocked = find_path(game.grid(), Hex::new(0, 3), Hex::new(4, 3), |h| {
            !wall(h) && game.is_enterable_by(h, owner)
        });
        assert!(blocked.is_empty());
    }

    #[test]
    fn test_path_through_own_units() {
        let mut game = game_7x7();
        let inf = unit_type_index("INF").unwrap();
        let mover = game.add_unit(inf, PlayerId(0), Hex::new(3, 0));
        game.add_unit(inf, PlayerId(0), Hex::new(3, 1));

        let path = path_for_unit(&game, mover, Hex::new(3, 2));
        assert_eq!(path, vec![Hex::new(3, 1), Hex::new(3, 2)]);
    }

    #[test]
    fn test_matches_bfs_on_random_obstacles() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..200 {
            let grid = HexGrid::new(8, 8);
            let blocked: FxHashSet<Hex> = grid
                .hexes()
                .filter(|_| rng.gen_bool(0.3))
                .collect();
            let start = Hex::new(rng.gen_range(0..8), rng.gen_range(0..8));
            let goal = Hex::new(rng.gen_range(0..8), rng.gen_range(0..8));
            let passable = |h: Hex| !blocked.contains(&h);

            let path = find_path(&grid, start, goal, passable);
            let reference = bfs_steps(&grid, start, goal, passable);

            match reference {
                Some(0) => assert!(path.is_empty()),
                Some(steps) => {
                    assert_eq!(path.len() as u32, steps);
                    assert_well_formed(&path, start, goal);
                    assert!(path.iter().all(|h| passable(*h)));
                }
                None => assert!(path.is_empty()),
            }
        }
    }

    #[test]
    fn test_equal_cost_routes_are_reproducible() {
        let grid = HexGrid::new(9, 9);
        let a = find_path(&grid, Hex::new(0, 0), Hex::new(8, 8), |_| true);
        let b = find_path(&grid, Hex::new(0, 0), Hex::new(8, 8), |_| true);
        assert_eq!(a, b);
        assert_eq!(a.len() as u32, Hex::new(0, 0).distance_to(Hex::new(8, 8)));
    }
}
