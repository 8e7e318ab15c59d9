//! Bounded hex grid and per-cell occupancy

use serde::{Deserialize, Serialize};

use crate::board::Hex;
use crate::game::PlayerId;
use crate::units::UnitId;

/// Terrain kind of a cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    #[default]
    Plains,
    Forest,
    Hills,
    Mountains,
    Water,
}

/// A static objective sitting on a cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    /// Current holder (`None` = neutral)
    pub holder: Option<PlayerId>,
}

/// One grid cell
#[derive(Clone, Debug)]
pub struct Cell {
    pub hex: Hex,
    pub terrain: Terrain,
    pub elevation: u8,
    pub objective: Option<Objective>,
    /// Stacked units; the head is the rendering and defender-priority unit
    units: Vec<UnitId>,
    owner: Option<PlayerId>,
}

impl Cell {
    fn new(hex: Hex) -> Self {
        Self {
            hex,
            terrain: Terrain::Plains,
            elevation: 0,
            objective: None,
            units: Vec::new(),
            owner: None,
        }
    }

    pub fn units(&self) -> &[UnitId] {
        &self.units
    }

    pub fn has_units(&self) -> bool {
        !self.units.is_empty()
    }

    /// Owner of the stacked units, else holder of the objective
    pub fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    fn derive_owner(&mut self) {
        if self.units.is_empty() {
            self.owner = self.objective.and_then(|o| o.holder);
        }
    }
}

/// Rectangular grid of offset-column hexes, stored column-major
#[derive(Clone, Debug)]
pub struct HexGrid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl HexGrid {
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "grid must have at least one cell");
        let cells = (0..width as i32)
            .flat_map(|col| (0..height as i32).map(move |row| Cell::new(Hex::new(col, row))))
            .collect();
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, hex: Hex) -> bool {
        hex.col >= 0 && hex.row >= 0 && (hex.col as u32) < self.width && (hex.row as u32) < self.height
    }

    /// Dense index of an in-bounds hex
    pub fn index(&self, hex: Hex) -> Option<usize> {
        if self.contains(hex) {
            Some(hex.col as usize * self.height as usize + hex.row as usize)
        } else {
            None
        }
    }

    pub fn get(&self, hex: Hex) -> Option<&Cell> {
        self.index(hex).map(|i| &self.cells[i])
    }

    /// Cell at an in-bounds hex. Out-of-bounds access is a caller bug.
    pub fn cell(&self, hex: Hex) -> &Cell {
        match self.get(hex) {
            Some(cell) => cell,
            None => panic!("hex {:?} is outside the {}x{} grid", hex, self.width, self.height),
        }
    }

    pub fn cell_mut(&mut self, hex: Hex) -> &mut Cell {
        match self.index(hex) {
            Some(i) => &mut self.cells[i],
            None => panic!("hex {:?} is outside the {}x{} grid", hex, self.width, self.height),
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter()
    }

    pub fn hexes(&self) -> impl Iterator<Item = Hex> + '_ {
        self.cells.iter().map(|c| c.hex)
    }

    /// In-bounds neighbours of a hex
    pub fn neighbors(&self, hex: Hex) -> impl Iterator<Item = Hex> + '_ {
        hex.neighbors().into_iter().filter(move |&h| self.contains(h))
    }

    /// In-bounds hexes within `radius` (center excluded)
    pub fn within(&self, hex: Hex, radius: u32) -> Vec<Hex> {
        hex.within(radius)
            .into_iter()
            .filter(|&h| self.contains(h))
            .collect()
    }

    pub fn set_terrain(&mut self, hex: Hex, terrain: Terrain, elevation: u8) {
        let cell = self.cell_mut(hex);
        cell.terrain = terrain;
        cell.elevation = elevation;
    }

    pub fn set_objective(&mut self, hex: Hex, objective: Objective) {
        let cell = self.cell_mut(hex);
        cell.objective = Some(objective);
        cell.derive_owner();
    }

    /// Stack a unit on a cell. Entering an objective captures it.
    pub(crate) fn push_unit(&mut self, hex: Hex, unit: UnitId, owner: PlayerId) {
        let cell = self.cell_mut(hex);
        assert!(
            cell.units.is_empty() || cell.owner == Some(owner),
            "cannot stack {:?} of {:?} onto {:?} owned by {:?}",
            unit,
            owner,
            hex,
            cell.owner
        );
        cell.units.push(unit);
        cell.owner = Some(owner);
        if let Some(objective) = cell.objective.as_mut() {
            objective.holder = Some(owner);
        }
    }

    pub(crate) fn remove_unit(&mut self, hex: Hex, unit: UnitId) {
        let cell = self.cell_mut(hex);
        cell.units.retain(|&u| u != unit);
        cell.derive_owner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        let grid = HexGrid::new(7, 5);
        assert!(grid.contains(Hex::new(0, 0)));
        assert!(grid.contains(Hex::new(6, 4)));
        assert!(!grid.contains(Hex::new(7, 0)));
        assert!(!grid.contains(Hex::new(0, -1)));
        assert_eq!(grid.cells().count(), 35);
        assert_eq!(grid.cell(Hex::new(3, 2)).hex, Hex::new(3, 2));
    }

    #[test]
    fn test_corner_neighbors_are_clipped() {
        let grid = HexGrid::new(5, 5);
        let corner: Vec<Hex> = grid.neighbors(Hex::new(0, 0)).collect();
        assert_eq!(corner, vec![Hex::new(1, 0), Hex::new(1, 1), Hex::new(0, 1)]);
    }

    #[test]
    fn test_owner_follows_units_then_objective() {
        let mut grid = HexGrid::new(3, 3);
        let hex = Hex::new(1, 1);
        grid.set_objective(hex, Objective { holder: None });
        assert_eq!(grid.cell(hex).owner(), None);

        grid.push_unit(hex, UnitId(1), PlayerId(0));
        grid.push_unit(hex, UnitId(2), PlayerId(0));
        assert_eq!(grid.cell(hex).owner(), Some(PlayerId(0)));
        assert_eq!(grid.cell(hex).units(), &[UnitId(1), UnitId(2)]);

        grid.remove_unit(hex, UnitId(1));
        grid.remove_unit(hex, UnitId(2));
        // The objective stays captured after the units leave
        assert_eq!(grid.cell(hex).owner(), Some(PlayerId(0)));
        assert!(!grid.cell(hex).has_units());

        let plain = Hex::new(0, 0);
        grid.push_unit(plain, UnitId(3), PlayerId(1));
        grid.remove_unit(plain, UnitId(3));
        assert_eq!(grid.cell(plain).owner(), None);
    }

    #[test]
    #[should_panic]
    fn test_mixed_stack_panics() {
        let mut grid = HexGrid::new(3, 3);
        grid.push_unit(Hex::new(0, 0), UnitId(1), PlayerId(0));
        grid.push_unit(Hex::new(0, 0), UnitId(2), PlayerId(1));
    }
}
