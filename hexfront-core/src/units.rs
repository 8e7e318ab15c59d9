//! Unit type definitions and per-unit state

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::board::Hex;
use crate::game::PlayerId;

/// Unit type identifier (index into UNIT_TYPES)
pub type UnitTypeId = u8;

/// Unit identifier, unique for the lifetime of a game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// Unit type definition
#[derive(Clone, Debug)]
pub struct UnitType {
    pub id: &'static str,
    pub name: &'static str,
    pub attack: u32,
    pub defense: u32,
    pub attacks_per_turn: u32,
    pub movement: u32,
    pub cost: u32,
}

impl UnitType {
    const fn new(
        id: &'static str,
        name: &'static str,
        attack: u32,
        defense: u32,
        attacks_per_turn: u32,
        movement: u32,
        cost: u32,
    ) -> Self {
        Self {
            id,
            name,
            attack,
            defense,
            attacks_per_turn,
            movement,
            cost,
        }
    }
}

/// All unit types
pub static UNIT_TYPES: [UnitType; 5] = [
    UnitType::new("INF", "Infantry", 4, 5, 1, 2, 10),
    UnitType::new("SCT", "Scout", 1, 2, 1, 5, 6),
    UnitType::new("CAV", "Cavalry", 5, 3, 1, 4, 15),
    UnitType::new("ART", "Artillery", 7, 2, 1, 1, 20),
    UnitType::new("ARM", "Armor", 8, 7, 2, 3, 30),
];

/// Get unit type index from string ID
pub fn unit_type_index(id: &str) -> Option<UnitTypeId> {
    UNIT_TYPES.iter().position(|ut| ut.id == id).map(|i| i as u8)
}

/// Get unit type from index
pub fn get_unit_type(idx: UnitTypeId) -> &'static UnitType {
    &UNIT_TYPES[idx as usize]
}

/// Health state. Transitions only step forward one at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Health {
    #[default]
    Healthy,
    Damaged,
    Destroyed,
}

impl Health {
    /// The state after taking one damage step
    pub fn damaged(self) -> Health {
        match self {
            Health::Healthy => Health::Damaged,
            Health::Damaged | Health::Destroyed => Health::Destroyed,
        }
    }

    /// Combat value adjusted for health (halved, rounded down, while damaged)
    pub fn adjust(self, value: u32) -> u32 {
        match self {
            Health::Healthy => value,
            Health::Damaged => value / 2,
            Health::Destroyed => 0,
        }
    }
}

/// Where a unit stands within its owner's turn
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitPhase {
    /// Eligible to be offered to its player
    Ready,
    /// Handed to its player, order pending or being applied
    Acting,
    /// Carries a queued path that will be applied mechanically
    Queued,
    /// Skipped or asleep
    Idle,
    /// No movement left this turn
    Exhausted,
}

/// A unit on the board
#[derive(Clone, Debug)]
pub struct Unit {
    pub id: UnitId,
    pub kind: UnitTypeId,
    pub owner: PlayerId,
    pub hex: Hex,
    pub health: Health,
    pub moves_left: u32,
    pub attacks_left: u32,
    pub skipped: bool,
    pub asleep: bool,
    pub selected: bool,
    /// Hexes still to traverse, consumed from the front
    pub path: VecDeque<Hex>,
}

impl Unit {
    /// Fresh unit with full budgets
    pub fn new(id: UnitId, kind: UnitTypeId, owner: PlayerId, hex: Hex) -> Self {
        let ut = get_unit_type(kind);
        Self {
            id,
            kind,
            owner,
            hex,
            health: Health::Healthy,
            moves_left: ut.movement,
            attacks_left: ut.attacks_per_turn,
            skipped: false,
            asleep: false,
            selected: false,
            path: VecDeque::new(),
        }
    }

    pub fn unit_type(&self) -> &'static UnitType {
        get_unit_type(self.kind)
    }

    pub fn attack(&self) -> u32 {
        self.health.adjust(self.unit_type().attack)
    }

    pub fn defense(&self) -> u32 {
        self.health.adjust(self.unit_type().defense)
    }

    /// Start-of-turn reset: budgets to maxima, skip cleared, sleep kept
    pub fn reset_budgets(&mut self) {
        let ut = self.unit_type();
        self.moves_left = ut.movement;
        self.attacks_left = ut.attacks_per_turn;
        self.skipped = false;
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == UnitPhase::Ready
    }

    pub fn phase(&self) -> UnitPhase {
        if self.selected {
            UnitPhase::Acting
        } else if self.moves_left == 0 {
            UnitPhase::Exhausted
        } else if !self.path.is_empty() {
            UnitPhase::Queued
        } else if self.skipped || self.asleep {
            UnitPhase::Idle
        } else {
            UnitPhase::Ready
        }
    }
}
