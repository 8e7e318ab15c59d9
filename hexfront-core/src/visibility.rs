//! Fog of war: per-player explored and visible cells plus the exploration frontier

use rustc_hash::FxHashSet;

use crate::board::Hex;
use crate::grid::HexGrid;

/// Visibility record for one player
///
/// `explored` only ever grows. `visible` is rebuilt from scratch whenever the
/// player's units change. The frontier holds every unexplored cell that has
/// at least one explored neighbour.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibilityMap {
    width: u32,
    height: u32,
    explored: Vec<bool>,
    visible: Vec<bool>,
    frontier: FxHashSet<Hex>,
}

impl VisibilityMap {
    pub fn new(width: u32, height: u32) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            explored: vec![false; size],
            visible: vec![false; size],
            frontier: FxHashSet::default(),
        }
    }

    pub fn for_grid(grid: &HexGrid) -> Self {
        Self::new(grid.width(), grid.height())
    }

    fn index(&self, hex: Hex) -> Option<usize> {
        if hex.col >= 0 && hex.row >= 0 && (hex.col as u32) < self.width && (hex.row as u32) < self.height {
            Some(hex.col as usize * self.height as usize + hex.row as usize)
        } else {
            None
        }
    }

    fn hex_at(&self, index: usize) -> Hex {
        let height = self.height as usize;
        Hex::new((index / height) as i32, (index % height) as i32)
    }

    pub fn is_explored(&self, hex: Hex) -> bool {
        self.index(hex).is_some_and(|i| self.explored[i])
    }

    pub fn is_visible(&self, hex: Hex) -> bool {
        self.index(hex).is_some_and(|i| self.visible[i])
    }

    pub fn frontier(&self) -> &FxHashSet<Hex> {
        &self.frontier
    }

    /// Frontier cells in column-major order
    pub fn frontier_sorted(&self) -> Vec<Hex> {
        let mut cells: Vec<Hex> = self.frontier.iter().copied().collect();
        cells.sort();
        cells
    }

    /// Mark cells explored and update the frontier around them.
    ///
    /// Out-of-bounds cells are ignored.
    pub fn set_explored(&mut self, cells: &[Hex]) {
        let mut newly_explored = Vec::new();
        for &hex in cells {
            if let Some(i) = self.index(hex) {
                if !self.explored[i] {
                    self.explored[i] = true;
                    newly_explored.push(hex);
                }
                self.frontier.remove(&hex);
            }
        }

        for hex in newly_explored {
            for neighbor in hex.neighbors() {
                if self.index(neighbor).is_some() && self.is_frontier_candidate(neighbor) {
                    self.frontier.insert(neighbor);
                }
            }
        }
    }

    fn is_frontier_candidate(&self, hex: Hex) -> bool {
        !self.is_explored(hex) && hex.neighbors().iter().any(|&n| self.is_explored(n))
    }

    pub fn set_visible(&mut self, cells: &[Hex]) {
        for &hex in cells {
            if let Some(i) = self.index(hex) {
                self.visible[i] = true;
            }
        }
    }

    pub fn clear_visible(&mut self) {
        self.visible.fill(false);
    }

    /// Cells whose explored or visible flag differs between the two maps
    pub fn diff(&self, other: &VisibilityMap) -> Vec<Hex> {
        assert_eq!(
            (self.width, self.height),
            (other.width, other.height),
            "visibility maps of different grids"
        );
        (0..self.explored.len())
            .filter(|&i| {
                self.explored[i] != other.explored[i] || self.visible[i] != other.visible[i]
            })
            .map(|i| self.hex_at(i))
            .collect()
    }
}
