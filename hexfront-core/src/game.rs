//! Game model: grid, units, players and fog of war
//!
//! `GameState` is the single owner of all mutable game data. Every mutation
//! goes through one of its methods, which keep the grid occupancy, the
//! player unit sets and the visibility maps consistent and queue a
//! `GameEvent` for the boundary.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::board::{Direction, Hex};
use crate::events::{GameEvent, UnitStatus};
use crate::grid::HexGrid;
use crate::units::{Health, Unit, UnitId, UnitTypeId};
use crate::visibility::VisibilityMap;

// ============================================================================
// PLAYERS
// ============================================================================

/// Player identifier (index into the ordered player list)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub usize);

/// How a player is controlled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerKind {
    Human,
    Computer,
    Neutral,
}

/// RGB color
pub type Color = [u8; 3];

/// A seat at the table
#[derive(Clone, Debug)]
pub struct PlayerInfo {
    pub name: String,
    pub color: Color,
    pub kind: PlayerKind,
    units: BTreeSet<UnitId>,
}

impl PlayerInfo {
    pub fn new(name: impl Into<String>, color: Color, kind: PlayerKind) -> Self {
        Self {
            name: name.into(),
            color,
            kind,
            units: BTreeSet::new(),
        }
    }

    /// Owned units in creation order
    pub fn units(&self) -> &BTreeSet<UnitId> {
        &self.units
    }

    pub fn has_units(&self) -> bool {
        !self.units.is_empty()
    }
}

// ============================================================================
// GAME STATE
// ============================================================================

#[derive(Clone, Debug)]
pub struct GameState {
    grid: HexGrid,
    players: Vec<PlayerInfo>,
    units: FxHashMap<UnitId, Unit>,
    visibility: Vec<VisibilityMap>,
    next_unit_id: u32,
    current_player: PlayerId,
    /// The current player has ended their turn
    turn_finished: bool,
    /// Completed full rounds
    pub round: u32,
    events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(grid: HexGrid, players: Vec<PlayerInfo>) -> Self {
        assert!(!players.is_empty(), "a game needs at least one player");
        let visibility = players.iter().map(|_| VisibilityMap::for_grid(&grid)).collect();
        Self {
            grid,
            players,
            units: FxHashMap::default(),
            visibility,
            next_unit_id: 0,
            current_player: PlayerId(0),
            turn_finished: false,
            round: 0,
            events: Vec::new(),
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn grid(&self) -> &HexGrid {
        &self.grid
    }

    pub fn players(&self) -> &[PlayerInfo] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> &PlayerInfo {
        &self.players[id.0]
    }

    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        (0..self.players.len()).map(PlayerId)
    }

    pub fn current_player(&self) -> PlayerId {
        self.current_player
    }

    /// The player who acts next: the current one while their turn is
    /// open, otherwise the next player with units later in the round, or
    /// the first player when the round is complete.
    pub fn next_to_act(&self) -> PlayerId {
        if !self.turn_finished {
            return self.current_player;
        }
        (self.current_player.0 + 1..self.players.len())
            .map(PlayerId)
            .find(|&p| self.players[p.0].has_units())
            .unwrap_or(PlayerId(0))
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    fn unit_mut(&mut self, id: UnitId) -> &mut Unit {
        self.units
            .get_mut(&id)
            .unwrap_or_else(|| panic!("unknown unit {:?}", id))
    }

    /// Units owned by a player, in creation order
    pub fn units_of(&self, player: PlayerId) -> impl Iterator<Item = &Unit> + '_ {
        self.players[player.0]
            .units
            .iter()
            .filter_map(move |id| self.units.get(id))
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Units eligible to be offered to their player, in creation order
    pub fn ready_units(&self, player: PlayerId) -> Vec<UnitId> {
        self.units_of(player)
            .filter(|u| u.is_ready())
            .map(|u| u.id)
            .collect()
    }

    pub fn visibility(&self, player: PlayerId) -> &VisibilityMap {
        &self.visibility[player.0]
    }

    // ========================================================================
    // OCCUPANCY QUERIES
    // ========================================================================

    /// Empty of units, or already held by `player`
    pub fn is_enterable_by(&self, hex: Hex, player: PlayerId) -> bool {
        self.grid
            .get(hex)
            .is_some_and(|c| !c.has_units() || c.owner() == Some(player))
    }

    /// Occupied by units of another player
    pub fn is_hostile_to(&self, hex: Hex, player: PlayerId) -> bool {
        self.grid
            .get(hex)
            .is_some_and(|c| c.has_units() && c.owner() != Some(player))
    }

    pub fn has_adjacent_threat(&self, hex: Hex, player: PlayerId) -> bool {
        self.grid
            .neighbors(hex)
            .any(|h| self.is_hostile_to(h, player))
    }

    /// The only non-neutral player that still owns units, if exactly one does
    pub fn winner(&self) -> Option<PlayerId> {
        let mut alive = self
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.kind != PlayerKind::Neutral && p.has_units());
        match (alive.next(), alive.next()) {
            (Some((i, _)), None) => Some(PlayerId(i)),
            _ => None,
        }
    }

    // ========================================================================
    // EVENTS
    // ========================================================================

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit_status(&mut self, unit: UnitId, status: UnitStatus) {
        self.emit(GameEvent::UnitStatusChanged {
            unit,
            status,
            viewer: None,
        });
    }

    // ========================================================================
    // TURN BOOKKEEPING
    // ========================================================================

    pub fn set_current_player(&mut self, player: PlayerId) {
        assert!(player.0 < self.players.len(), "unknown player {:?}", player);
        self.current_player = player;
        self.turn_finished = false;
        self.emit(GameEvent::CurrentPlayerChanged { player });
    }

    /// Close the current player's turn
    pub fn finish_turn(&mut self) {
        self.turn_finished = true;
    }

    /// Make `player` current and reset its units' budgets
    pub fn begin_turn(&mut self, player: PlayerId) {
        self.set_current_player(player);
        let ids: Vec<UnitId> = self.players[player.0].units.iter().copied().collect();
        for id in ids {
            self.unit_mut(id).reset_budgets();
        }
    }

    // ========================================================================
    // UNIT LIFECYCLE
    // ========================================================================

    /// Create a fresh unit and place it
    pub fn add_unit(&mut self, kind: UnitTypeId, owner: PlayerId, hex: Hex) -> UnitId {
        let id = UnitId(self.next_unit_id);
        self.insert_unit(Unit::new(id, kind, owner, hex));
        id
    }

    /// Place an existing unit record (used when restoring a saved game)
    pub fn insert_unit(&mut self, unit: Unit) {
        assert!(unit.owner.0 < self.players.len(), "unknown owner {:?}", unit.owner);
        assert!(unit.health != Health::Destroyed, "cannot place a destroyed unit");
        assert!(!self.units.contains_key(&unit.id), "duplicate unit {:?}", unit.id);

        let (id, owner, hex) = (unit.id, unit.owner, unit.hex);
        self.grid.push_unit(hex, id, owner);
        self.players[owner.0].units.insert(id);
        self.next_unit_id = self.next_unit_id.max(id.0 + 1);
        self.units.insert(id, unit);

        self.emit(GameEvent::UnitAdded { unit: id, owner, hex });
        self.refresh_visibility(owner);
        self.report_sighting(id, owner, None, Some(hex));
    }

    /// Apply one damage step. A unit reaching `Destroyed` is removed from its
    /// hex and its owner in the same call.
    pub fn damage_unit(&mut self, id: UnitId) -> Health {
        let next = self.unit_mut(id).health.damaged();
        if next == Health::Destroyed {
            self.destroy_unit(id);
        } else {
            self.unit_mut(id).health = next;
            self.emit_status(id, UnitStatus::Damaged);
        }
        next
    }

    fn destroy_unit(&mut self, id: UnitId) -> Unit {
        let Some(mut unit) = self.units.remove(&id) else {
            panic!("unknown unit {:?}", id);
        };
        unit.health = Health::Destroyed;
        self.grid.remove_unit(unit.hex, id);
        self.players[unit.owner.0].units.remove(&id);
        self.emit_status(id, UnitStatus::Destroyed);
        self.refresh_visibility(unit.owner);
        unit
    }

    /// Restore a damaged unit to full health
    pub fn repair_unit(&mut self, id: UnitId) {
        let unit = self.unit_mut(id);
        if unit.health == Health::Damaged {
            unit.health = Health::Healthy;
            self.emit_status(id, UnitStatus::Healthy);
        }
    }

    // ========================================================================
    // UNIT ORDERS STATE
    // ========================================================================

    pub fn set_selected(&mut self, id: UnitId, selected: bool) {
        let unit = self.unit_mut(id);
        if unit.selected == selected {
            return;
        }
        unit.selected = selected;
        let hex = unit.hex;
        if selected {
            self.emit_status(id, UnitStatus::Selected);
            self.emit(GameEvent::HexSelected { hex });
        } else {
            self.emit_status(id, UnitStatus::Unselected);
        }
    }

    pub fn skip_unit(&mut self, id: UnitId) {
        self.unit_mut(id).skipped = true;
        self.emit_status(id, UnitStatus::Skipped);
    }

    /// Use up one attack
    pub(crate) fn spend_attack(&mut self, id: UnitId) {
        let unit = self.unit_mut(id);
        assert!(unit.attacks_left > 0, "{:?} has no attacks left", id);
        unit.attacks_left -= 1;
    }

    pub fn set_asleep(&mut self, id: UnitId, asleep: bool) {
        self.unit_mut(id).asleep = asleep;
    }

    pub fn set_path(&mut self, id: UnitId, path: impl IntoIterator<Item = Hex>) {
        let unit = self.unit_mut(id);
        unit.path.clear();
        unit.path.extend(path);
    }

    pub fn clear_path(&mut self, id: UnitId) {
        self.unit_mut(id).path.clear();
    }

    pub(crate) fn pop_path(&mut self, id: UnitId) -> Option<Hex> {
        self.unit_mut(id).path.pop_front()
    }

    // ========================================================================
    // MOVEMENT
    // ========================================================================

    /// Move a unit one hex, spending one move.
    ///
    /// The target must be adjacent and enterable and the unit must have
    /// movement left; anything else is a caller bug.
    pub fn move_unit_step(&mut self, id: UnitId, to: Hex) -> Direction {
        let unit = self.unit_mut(id);
        let (from, owner) = (unit.hex, unit.owner);
        assert!(unit.moves_left > 0, "{:?} has no moves left", id);
        let Some(direction) = from.direction_to(to) else {
            panic!("{:?} cannot step from {:?} to non-adjacent {:?}", id, from, to);
        };
        assert!(
            self.is_enterable_by(to, owner),
            "{:?} cannot enter {:?}",
            id,
            to
        );

        self.grid.remove_unit(from, id);
        self.grid.push_unit(to, id, owner);
        let unit = self.unit_mut(id);
        unit.hex = to;
        unit.moves_left -= 1;

        self.emit(GameEvent::UnitMoved {
            unit: id,
            from,
            to,
            direction,
        });
        self.refresh_visibility(owner);
        self.report_sighting(id, owner, Some(from), Some(to));
        direction
    }

    // ========================================================================
    // FOG OF WAR
    // ========================================================================

    /// Rebuild a player's visible set from its units (each sees its own hex
    /// and the ring around it) and explore everything seen.
    pub fn refresh_visibility(&mut self, player: PlayerId) {
        let sight: Vec<Hex> = self
            .units_of(player)
            .flat_map(|u| std::iter::once(u.hex).chain(self.grid.within(u.hex, 1)))
            .collect();

        let before = self.visibility[player.0].clone();
        let map = &mut self.visibility[player.0];
        map.clear_visible();
        map.set_visible(&sight);
        map.set_explored(&sight);

        let changed = before.diff(map);
        if changed.is_empty() {
            return;
        }

        let mut sightings = Vec::new();
        for &hex in &changed {
            let now_visible = self.visibility[player.0].is_visible(hex);
            if before.is_visible(hex) == now_visible {
                continue;
            }
            let cell = self.grid.cell(hex);
            if cell.owner() == Some(player) {
                continue;
            }
            let status = if now_visible {
                UnitStatus::Revealed
            } else {
                UnitStatus::Hidden
            };
            sightings.extend(cell.units().iter().map(|&unit| (unit, status)));
        }

        for (unit, status) in sightings {
            self.emit(GameEvent::UnitStatusChanged {
                unit,
                status,
                viewer: Some(player),
            });
        }
        self.emit(GameEvent::VisibilityChanged {
            player,
            cells: changed,
        });
    }

    /// Tell other players when a unit enters or leaves their sight
    fn report_sighting(&mut self, unit: UnitId, owner: PlayerId, from: Option<Hex>, to: Option<Hex>) {
        for viewer in 0..self.players.len() {
            if viewer == owner.0 {
                continue;
            }
            let map = &self.visibility[viewer];
            let was = from.is_some_and(|h| map.is_visible(h));
            let now = to.is_some_and(|h| map.is_visible(h));
            if was == now {
                continue;
            }
            let status = if now {
                UnitStatus::Revealed
            } else {
                UnitStatus::Hidden
            };
            self.emit(GameEvent::UnitStatusChanged {
                unit,
                status,
                viewer: Some(PlayerId(viewer)),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::unit_type_index;

    fn two_player_game() -> GameState {
        let players = vec![
            PlayerInfo::new("Red", [200, 40, 40], PlayerKind::Computer),
            PlayerInfo::new("Blue", [40, 40, 200], PlayerKind::Computer),
        ];
        GameState::new(HexGrid::new(7, 7), players)
    }

    fn infantry() -> UnitTypeId {
        unit_type_index("INF").unwrap()
    }

    #[test]
    fn test_add_unit_updates_grid_player_and_visibility() {
        let mut game = two_player_game();
        let id = game.add_unit(infantry(), PlayerId(0), Hex::new(3, 3));

        assert_eq!(game.grid().cell(Hex::new(3, 3)).units(), &[id]);
        assert_eq!(game.grid().cell(Hex::new(3, 3)).owner(), Some(PlayerId(0)));
        assert!(game.player(PlayerId(0)).units().contains(&id));

        let vis = game.visibility(PlayerId(0));
        assert!(vis.is_visible(Hex::new(3, 3)));
        for hex in Hex::new(3, 3).ring(1) {
            assert!(vis.is_visible(hex));
            assert!(vis.is_explored(hex));
        }
        assert!(!game.visibility(PlayerId(1)).is_explored(Hex::new(3, 3)));

        let events = game.drain_events();
        assert!(matches!(events[0], GameEvent::UnitAdded { unit, .. } if unit == id));
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn test_move_step_spends_move_and_refreshes_sight() {
        let mut game = two_player_game();
        let id = game.add_unit(infantry(), PlayerId(0), Hex::new(0, 0));
        game.drain_events();

        let dir = game.move_unit_step(id, Hex::new(0, 1));
        assert_eq!(dir, Direction::South);

        let unit = game.unit(id).unwrap();
        assert_eq!(unit.hex, Hex::new(0, 1));
        assert_eq!(unit.moves_left, 1);
        assert!(!game.grid().cell(Hex::new(0, 0)).has_units());
        assert!(game.visibility(PlayerId(0)).is_visible(Hex::new(0, 2)));

        let events = game.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::UnitMoved { direction: Direction::South, .. })));
        assert!(events.iter().any(|e| matches!(e, GameEvent::VisibilityChanged { .. })));
    }

    #[test]
    fn test_moving_into_sight_reveals_unit() {
        let mut game = two_player_game();
        game.add_unit(infantry(), PlayerId(1), Hex::new(4, 3));
        let scout = game.add_unit(unit_type_index("SCT").unwrap(), PlayerId(0), Hex::new(2, 3));
        game.drain_events();

        game.move_unit_step(scout, Hex::new(3, 3));
        let events = game.drain_events();
        // Blue sees the scout step into its sight
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::UnitStatusChanged { unit, status: UnitStatus::Revealed, viewer: Some(PlayerId(1)) } if *unit == scout
        )));
    }

    #[test]
    fn test_destroyed_unit_is_removed_in_same_step() {
        let mut game = two_player_game();
        let id = game.add_unit(infantry(), PlayerId(1), Hex::new(2, 2));
        assert_eq!(game.damage_unit(id), Health::Damaged);
        assert_eq!(game.unit(id).unwrap().health, Health::Damaged);

        assert_eq!(game.damage_unit(id), Health::Destroyed);
        assert!(game.unit(id).is_none());
        assert!(!game.grid().cell(Hex::new(2, 2)).has_units());
        assert_eq!(game.grid().cell(Hex::new(2, 2)).owner(), None);
        assert!(!game.player(PlayerId(1)).has_units());
    }

    #[test]
    fn test_begin_turn_resets_budgets_and_keeps_sleep() {
        let mut game = two_player_game();
        let id = game.add_unit(infantry(), PlayerId(0), Hex::new(0, 0));
        game.move_unit_step(id, Hex::new(0, 1));
        game.skip_unit(id);
        game.set_asleep(id, true);

        game.begin_turn(PlayerId(0));
        let unit = game.unit(id).unwrap();
        assert_eq!(unit.moves_left, 2);
        assert!(!unit.skipped);
        assert!(unit.asleep);
        assert_eq!(game.current_player(), PlayerId(0));
    }

    #[test]
    fn test_winner_by_elimination_ignores_neutral() {
        let players = vec![
            PlayerInfo::new("Red", [200, 40, 40], PlayerKind::Human),
            PlayerInfo::new("Blue", [40, 40, 200], PlayerKind::Computer),
            PlayerInfo::new("Rebels", [90, 90, 90], PlayerKind::Neutral),
        ];
        let mut game = GameState::new(HexGrid::new(5, 5), players);
        game.add_unit(infantry(), PlayerId(0), Hex::new(0, 0));
        let blue = game.add_unit(infantry(), PlayerId(1), Hex::new(4, 4));
        game.add_unit(infantry(), PlayerId(2), Hex::new(2, 2));
        assert_eq!(game.winner(), None);

        game.damage_unit(blue);
        game.damage_unit(blue);
        assert_eq!(game.winner(), Some(PlayerId(0)));
    }

    #[test]
    fn test_hostility_queries() {
        let mut game = two_player_game();
        game.add_unit(infantry(), PlayerId(0), Hex::new(1, 1));
        game.add_unit(infantry(), PlayerId(1), Hex::new(2, 1));

        assert!(game.is_enterable_by(Hex::new(1, 1), PlayerId(0)));
        assert!(!game.is_enterable_by(Hex::new(2, 1), PlayerId(0)));
        assert!(game.is_enterable_by(Hex::new(5, 5), PlayerId(0)));
        assert!(!game.is_enterable_by(Hex::new(9, 9), PlayerId(0)));
        assert!(game.is_hostile_to(Hex::new(2, 1), PlayerId(0)));
        assert!(game.has_adjacent_threat(Hex::new(1, 1), PlayerId(0)));
        assert!(!game.has_adjacent_threat(Hex::new(5, 5), PlayerId(0)));
    }
}
