//! Errors raised while building a game from external data

use crate::board::Hex;

/// A scenario that cannot be turned into a consistent game
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("scenario has no players")]
    NoPlayers,

    #[error("grid must be at least 1x1, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },

    #[error("{what} at {hex:?} lies outside the {width}x{height} grid")]
    OutOfBounds {
        what: &'static str,
        hex: Hex,
        width: u32,
        height: u32,
    },

    #[error("unit {index}: unknown unit type {kind:?}")]
    UnknownUnitType { index: usize, kind: String },

    #[error("{what} refers to player {player}, but only {players} exist")]
    UnknownPlayer {
        what: String,
        player: usize,
        players: usize,
    },

    #[error("unit {index} at {hex:?} would share a hex with another player's units")]
    MixedStack { index: usize, hex: Hex },

    #[error("unit {index} is destroyed")]
    DestroyedUnit { index: usize },

    #[error("unit {index} has {moves_left} moves left, more than its type allows")]
    BudgetExceeded { index: usize, moves_left: u32 },
}
