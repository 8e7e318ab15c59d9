//! Hex board geometry with offset-column coordinates
//!
//! Columns run left to right, rows top to bottom. Even columns sit half a
//! cell lower than odd columns, so the two diagonal neighbours on each side
//! depend on the parity of the column.

use serde::{Deserialize, Serialize};

/// Offset-column hex coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hex {
    pub col: i32,
    pub row: i32,
}

/// The six neighbour directions, clockwise from north
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    SouthEast,
    South,
    SouthWest,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> Direction {
        Self::ALL[(self.index() + 3) % 6]
    }
}

/// Neighbour offsets as (dcol, drow from even column, drow from odd column)
/// Index: 0=N, 1=NE, 2=SE, 3=S, 4=SW, 5=NW
const OFFSETS: [(i32, i32, i32); 6] = [
    (0, -1, -1), // N
    (1, 0, -1),  // NE
    (1, 1, 0),   // SE
    (0, 1, 1),   // S
    (-1, 1, 0),  // SW
    (-1, 0, -1), // NW
];

impl Hex {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Even columns carry the half-cell downward offset
    pub fn is_even_column(&self) -> bool {
        self.col.rem_euclid(2) == 0
    }

    /// Neighbour in the given direction
    pub fn neighbor(&self, direction: Direction) -> Hex {
        let (dc, dr_even, dr_odd) = OFFSETS[direction.index()];
        let dr = if self.is_even_column() { dr_even } else { dr_odd };
        Hex::new(self.col + dc, self.row + dr)
    }

    /// All six neighbours, in `Direction::ALL` order
    pub fn neighbors(&self) -> [Hex; 6] {
        Direction::ALL.map(|d| self.neighbor(d))
    }

    /// Distance in hex steps.
    ///
    /// Moving `|dcol|` diagonal steps sweeps a band of reachable rows: a step
    /// out of an even column lands on the same row or one below, a step out
    /// of an odd column on the same row or one above. Rows outside that band
    /// cost one extra vertical step each.
    pub fn distance_to(&self, other: Hex) -> u32 {
        let dc = self.col.abs_diff(other.col);
        if dc == 0 {
            return self.row.abs_diff(other.row);
        }

        let (from_even, from_odd) = if self.is_even_column() {
            ((dc + 1) / 2, dc / 2)
        } else {
            (dc / 2, (dc + 1) / 2)
        };
        let low = self.row - from_odd as i32;
        let high = self.row + from_even as i32;

        if other.row < low {
            dc + low.abs_diff(other.row)
        } else if other.row > high {
            dc + other.row.abs_diff(high)
        } else {
            dc
        }
    }

    pub fn is_adjacent(&self, other: Hex) -> bool {
        self.distance_to(other) == 1
    }

    /// Direction `d` with `self.neighbor(d) == other`, for adjacent hexes only
    pub fn direction_to(&self, other: Hex) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|&d| self.neighbor(d) == other)
    }

    /// The ring of hexes at exactly `radius` steps, walked side by side.
    ///
    /// Radius 0 yields the hex itself. Coordinates are not bounds-checked.
    pub fn ring(&self, radius: u32) -> Vec<Hex> {
        if radius == 0 {
            return vec![*self];
        }

        let mut hex = *self;
        for _ in 0..radius {
            hex = hex.neighbor(Direction::SouthWest);
        }

        let mut ring = Vec::with_capacity(6 * radius as usize);
        for direction in Direction::ALL {
            for _ in 0..radius {
                ring.push(hex);
                hex = hex.neighbor(direction);
            }
        }
        ring
    }

    /// Union of rings `1..=radius` (the hex itself is excluded)
    pub fn within(&self, radius: u32) -> Vec<Hex> {
        (1..=radius).flat_map(|r| self.ring(r)).collect()
    }
}
