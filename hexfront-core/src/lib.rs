//! HEXFRONT Core - Rules engine for a turn-based hex strategy game
//!
//! This crate provides the game model and every rule that mutates it:
//! - Board geometry (offset-column hex coordinates)
//! - Bounded grid with per-cell unit stacks and derived ownership
//! - A* pathfinding under an occupancy filter
//! - Combat with an injectable random source
//! - Queued-path order execution with the adjacent-threat halt rule
//! - Per-player fog of war with an exploration frontier
//! - Scenario load/save and a default autonomous policy

pub mod board;
pub mod grid;
pub mod units;
pub mod game;
pub mod events;
pub mod visibility;
pub mod pathfinding;
pub mod combat;
pub mod orders;
pub mod ai;
pub mod scenario;
pub mod error;

// Re-exports for convenient access
pub use board::{Direction, Hex};
pub use grid::{Cell, HexGrid, Objective, Terrain};
pub use units::{get_unit_type, unit_type_index, Health, Unit, UnitId, UnitPhase, UnitType, UnitTypeId, UNIT_TYPES};
pub use game::{Color, GameState, PlayerId, PlayerInfo, PlayerKind};
pub use events::{GameEvent, GameObserver, NullObserver, UnitStatus};
pub use visibility::VisibilityMap;
pub use pathfinding::{find_path, path_for_unit};
pub use combat::{can_attack, resolve_attack, select_defender, CombatOutcome, RandomSource, ScriptedRolls};
pub use orders::{apply_order, execute_orders, ExecutionReport, Order};
pub use ai::{AdvancePolicy, OrderPolicy};
pub use scenario::{ObjectiveSpec, PlayerSpec, Scenario, TerrainSpec, UnitSpec};
pub use error::SetupError;
