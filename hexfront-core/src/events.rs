//! Events reported to the presentation boundary

use serde::{Deserialize, Serialize};

use crate::board::{Direction, Hex};
use crate::game::PlayerId;
use crate::units::UnitId;

/// Unit status notifications
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitStatus {
    Selected,
    Unselected,
    Damaged,
    Destroyed,
    Healthy,
    Hidden,
    Revealed,
    Skipped,
}

/// Something the engine did
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    UnitAdded {
        unit: UnitId,
        owner: PlayerId,
        hex: Hex,
    },
    UnitMoved {
        unit: UnitId,
        from: Hex,
        to: Hex,
        direction: Direction,
    },
    AttackInitiated {
        attacker: UnitId,
        defender: UnitId,
    },
    HexSelected {
        hex: Hex,
    },
    /// `viewer` is set for `Hidden`/`Revealed`, which are relative to one player
    UnitStatusChanged {
        unit: UnitId,
        status: UnitStatus,
        viewer: Option<PlayerId>,
    },
    VisibilityChanged {
        player: PlayerId,
        cells: Vec<Hex>,
    },
    CurrentPlayerChanged {
        player: PlayerId,
    },
    WinnerDeclared {
        player: PlayerId,
    },
}

/// Receives engine events. Delivery is fire-and-forget.
pub trait GameObserver: Send {
    fn on_event(&mut self, event: &GameEvent);
}

impl<F> GameObserver for F
where
    F: FnMut(&GameEvent) + Send,
{
    fn on_event(&mut self, event: &GameEvent) {
        self(event)
    }
}

/// Observer that drops every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl GameObserver for NullObserver {
    fn on_event(&mut self, _event: &GameEvent) {}
}
