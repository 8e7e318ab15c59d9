//! Scenario - starting positions and saved games
//!
//! A scenario is the serializable picture of a game: grid size, terrain,
//! objectives, the ordered player list, every unit with its turn state and
//! whose turn it is. Loading validates everything before a `GameState` is
//! built, so a bad file is reported as a [`SetupError`] instead of tripping
//! an engine assertion.

use std::path::Path;

use anyhow::Context;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::board::Hex;
use crate::error::SetupError;
use crate::game::{Color, GameState, PlayerId, PlayerInfo, PlayerKind};
use crate::grid::{HexGrid, Objective, Terrain};
use crate::units::{get_unit_type, unit_type_index, Health, Unit, UnitId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSpec {
    pub name: String,
    pub color: Color,
    pub kind: PlayerKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainSpec {
    pub hex: Hex,
    pub terrain: Terrain,
    #[serde(default)]
    pub elevation: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveSpec {
    pub hex: Hex,
    /// Index into the player list, `None` for unheld
    #[serde(default)]
    pub holder: Option<usize>,
}

/// One unit. Budgets default to the type's maxima when omitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Unit type id, e.g. "INF"
    pub kind: String,
    pub owner: usize,
    pub hex: Hex,
    #[serde(default)]
    pub health: Health,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moves_left: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attacks_left: Option<u32>,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub asleep: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Hex>,
}

impl UnitSpec {
    pub fn new(kind: &str, owner: usize, hex: Hex) -> Self {
        Self {
            kind: kind.to_string(),
            owner,
            hex,
            health: Health::Healthy,
            moves_left: None,
            attacks_left: None,
            skipped: false,
            asleep: false,
            path: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub terrain: Vec<TerrainSpec>,
    #[serde(default)]
    pub objectives: Vec<ObjectiveSpec>,
    pub players: Vec<PlayerSpec>,
    pub units: Vec<UnitSpec>,
    /// Whose turn it is; a resumed game starts with this player
    #[serde(default)]
    pub current_player: usize,
    /// Completed rounds
    #[serde(default)]
    pub round: u32,
}

impl Scenario {
    /// Validate and build a game
    pub fn to_game_state(&self) -> Result<GameState, SetupError> {
        self.validate()?;

        let mut grid = HexGrid::new(self.width, self.height);
        for t in &self.terrain {
            grid.set_terrain(t.hex, t.terrain, t.elevation);
        }
        for o in &self.objectives {
            grid.set_objective(
                o.hex,
                Objective {
                    holder: o.holder.map(PlayerId),
                },
            );
        }

        let players = self
            .players
            .iter()
            .map(|p| PlayerInfo::new(p.name.clone(), p.color, p.kind))
            .collect();
        let mut state = GameState::new(grid, players);

        for (index, spec) in self.units.iter().enumerate() {
            let kind = unit_type_index(&spec.kind).ok_or_else(|| SetupError::UnknownUnitType {
                index,
                kind: spec.kind.clone(),
            })?;
            let mut unit = Unit::new(UnitId(index as u32), kind, PlayerId(spec.owner), spec.hex);
            unit.health = spec.health;
            if let Some(moves) = spec.moves_left {
                unit.moves_left = moves;
            }
            if let Some(attacks) = spec.attacks_left {
                unit.attacks_left = attacks;
            }
            unit.skipped = spec.skipped;
            unit.asleep = spec.asleep;
            unit.path = spec.path.iter().copied().collect();
            state.insert_unit(unit);
        }

        state.set_current_player(PlayerId(self.current_player));
        state.round = self.round;
        Ok(state)
    }

    fn validate(&self) -> Result<(), SetupError> {
        if self.players.is_empty() {
            return Err(SetupError::NoPlayers);
        }
        if self.width == 0 || self.height == 0 {
            return Err(SetupError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }

        let players = self.players.len();
        let check_player = |what: String, player: usize| {
            if player < players {
                Ok(())
            } else {
                Err(SetupError::UnknownPlayer {
                    what,
                    player,
                    players,
                })
            }
        };
        let check_bounds = |what: &'static str, hex: Hex| {
            let inside = hex.col >= 0
                && hex.row >= 0
                && (hex.col as u32) < self.width
                && (hex.row as u32) < self.height;
            if inside {
                Ok(())
            } else {
                Err(SetupError::OutOfBounds {
                    what,
                    hex,
                    width: self.width,
                    height: self.height,
                })
            }
        };

        check_player("current player".to_string(), self.current_player)?;
        for t in &self.terrain {
            check_bounds("terrain", t.hex)?;
        }
        for o in &self.objectives {
            check_bounds("objective", o.hex)?;
            if let Some(holder) = o.holder {
                check_player(format!("objective at {:?}", o.hex), holder)?;
            }
        }

        let mut stack_owner: FxHashMap<Hex, usize> = FxHashMap::default();
        for (index, spec) in self.units.iter().enumerate() {
            let kind = unit_type_index(&spec.kind).ok_or_else(|| SetupError::UnknownUnitType {
                index,
                kind: spec.kind.clone(),
            })?;
            check_player(format!("unit {}", index), spec.owner)?;
            check_bounds("unit", spec.hex)?;
            for &hex in &spec.path {
                check_bounds("queued path", hex)?;
            }
            if spec.health == Health::Destroyed {
                return Err(SetupError::DestroyedUnit { index });
            }
            if let Some(moves_left) = spec.moves_left {
                if moves_left > get_unit_type(kind).movement {
                    return Err(SetupError::BudgetExceeded { index, moves_left });
                }
            }
            let owner = *stack_owner.entry(spec.hex).or_insert(spec.owner);
            if owner != spec.owner {
                return Err(SetupError::MixedStack {
                    index,
                    hex: spec.hex,
                });
            }
        }
        Ok(())
    }

    /// The player whose turn comes first when this scenario is played
    pub fn start_player(&self) -> PlayerId {
        PlayerId(self.current_player)
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let scenario = serde_json::from_str(&content)
            .with_context(|| format!("parsing scenario {}", path.display()))?;
        Ok(scenario)
    }

    /// Save to a JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("writing scenario {}", path.display()))?;
        Ok(())
    }
}

impl Default for Scenario {
    /// Two armies facing each other across a 12x10 field, with a neutral
    /// garrison holding the centre objective
    fn default() -> Self {
        let mut units = Vec::new();
        for (kind, col, row) in [
            ("ART", 0, 4),
            ("CAV", 0, 5),
            ("INF", 1, 4),
            ("INF", 1, 6),
            ("SCT", 2, 5),
        ] {
            units.push(UnitSpec::new(kind, 0, Hex::new(col, row)));
            units.push(UnitSpec::new(kind, 1, Hex::new(11 - col, row)));
        }
        units.push(UnitSpec::new("INF", 2, Hex::new(6, 5)));

        let terrain = [
            (5, 2, Terrain::Forest, 0),
            (5, 3, Terrain::Forest, 0),
            (6, 7, Terrain::Hills, 1),
            (3, 8, Terrain::Water, 0),
            (4, 8, Terrain::Water, 0),
        ]
        .into_iter()
        .map(|(col, row, terrain, elevation)| TerrainSpec {
            hex: Hex::new(col, row),
            terrain,
            elevation,
        })
        .collect();

        let objectives = [(6, 1), (6, 5), (6, 8)]
            .into_iter()
            .map(|(col, row)| ObjectiveSpec {
                hex: Hex::new(col, row),
                holder: None,
            })
            .collect();

        Self {
            name: "skirmish".to_string(),
            width: 12,
            height: 10,
            terrain,
            objectives,
            players: vec![
                PlayerSpec {
                    name: "Red".to_string(),
                    color: [200, 40, 40],
                    kind: PlayerKind::Computer,
                },
                PlayerSpec {
                    name: "Blue".to_string(),
                    color: [40, 40, 200],
                    kind: PlayerKind::Computer,
                },
                PlayerSpec {
                    name: "Rebels".to_string(),
                    color: [120, 120, 120],
                    kind: PlayerKind::Neutral,
                },
            ],
            units,
            current_player: 0,
            round: 0,
        }
    }
}

impl GameState {
    /// Capture the game as a scenario. Units are listed cell by cell in
    /// stack order so a reload rebuilds identical stacks.
    pub fn to_scenario(&self, name: &str) -> Scenario {
        let grid = self.grid();
        let mut terrain = Vec::new();
        let mut objectives = Vec::new();
        let mut units = Vec::new();

        for cell in grid.cells() {
            if cell.terrain != Terrain::Plains || cell.elevation != 0 {
                terrain.push(TerrainSpec {
                    hex: cell.hex,
                    terrain: cell.terrain,
                    elevation: cell.elevation,
                });
            }
            if let Some(objective) = cell.objective {
                objectives.push(ObjectiveSpec {
                    hex: cell.hex,
                    holder: objective.holder.map(|p| p.0),
                });
            }
            for unit in cell.units().iter().filter_map(|&id| self.unit(id)) {
                units.push(UnitSpec {
                    kind: unit.unit_type().id.to_string(),
                    owner: unit.owner.0,
                    hex: unit.hex,
                    health: unit.health,
                    moves_left: Some(unit.moves_left),
                    attacks_left: Some(unit.attacks_left),
                    skipped: unit.skipped,
                    asleep: unit.asleep,
                    path: unit.path.iter().copied().collect(),
                });
            }
        }

        Scenario {
            name: name.to_string(),
            width: grid.width(),
            height: grid.height(),
            terrain,
            objectives,
            players: self
                .players()
                .iter()
                .map(|p| PlayerSpec {
                    name: p.name.clone(),
                    color: p.color,
                    kind: p.kind,
                })
                .collect(),
            units,
            current_player: self.next_to_act().0,
            round: self.round,
        }
    }
}
