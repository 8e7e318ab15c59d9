//! Unit orders and their mechanical execution

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::Hex;
use crate::combat::{can_attack, resolve_attack, CombatOutcome, RandomSource};
use crate::game::GameState;
use crate::pathfinding::path_for_unit;
use crate::units::UnitId;

/// A player's answer to "what should this unit do?"
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    /// Head for a hex. An adjacent hostile hex is attacked.
    MoveTo(Hex),
    /// Leave the unit alone for the rest of this turn
    Skip,
    /// Leave the unit alone until it gets an explicit order
    Sleep,
    /// Ask again in a later selection pass
    Wait,
}

/// What happened while a queued path was being executed
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExecutionReport {
    pub steps: u32,
    pub combat: Option<CombatOutcome>,
    /// Remaining path dropped because a threat came adjacent or the way was blocked
    pub halted: bool,
    pub destroyed: bool,
}

/// Apply an order to a unit.
///
/// Movement orders queue a path and execute it at once. A `MoveTo` with no
/// route (or out of bounds, or onto the unit's own hex) is rejected and
/// leaves the unit unchanged; the result is then `None`.
pub fn apply_order(
    state: &mut GameState,
    unit: UnitId,
    order: Order,
    random: &mut impl RandomSource,
) -> Option<ExecutionReport> {
    let Some(u) = state.unit(unit) else {
        panic!("order for unknown unit {:?}", unit);
    };
    let (from, asleep) = (u.hex, u.asleep);

    match order {
        Order::Skip => {
            state.clear_path(unit);
            state.skip_unit(unit);
            None
        }
        Order::Sleep => {
            state.clear_path(unit);
            state.set_asleep(unit, true);
            None
        }
        Order::Wait => None,
        Order::MoveTo(goal) => {
            if goal == from || !state.grid().contains(goal) {
                debug!("{:?}: ignoring move to {:?}", unit, goal);
                return None;
            }
            let path = if from.is_adjacent(goal) {
                vec![goal]
            } else {
                path_for_unit(state, unit, goal)
            };
            if path.is_empty() {
                debug!("{:?}: no route from {:?} to {:?}", unit, from, goal);
                return None;
            }
            if asleep {
                state.set_asleep(unit, false);
            }
            state.set_path(unit, path);
            Some(execute_orders(state, unit, random))
        }
    }
}

/// Walk a unit along its queued path.
///
/// A final hostile hex is attacked instead of entered, and entered after
/// all if the fight vacates it. Steps continue while the next hex is
/// enterable and moves remain. After each step an adjacent enemy cancels
/// the rest of the path. The unit is deselected once its moves run out.
pub fn execute_orders(
    state: &mut GameState,
    unit: UnitId,
    random: &mut impl RandomSource,
) -> ExecutionReport {
    let Some(u) = state.unit(unit) else {
        panic!("executing orders for unknown unit {:?}", unit);
    };
    assert!(!u.path.is_empty(), "{:?} has no queued path", unit);
    let owner = u.owner;

    let mut report = ExecutionReport::default();
    loop {
        let Some(u) = state.unit(unit) else {
            report.destroyed = true;
            break;
        };
        let Some(&next) = u.path.front() else {
            break;
        };
        if u.moves_left == 0 {
            break;
        }

        if u.path.len() == 1 && report.combat.is_none() && can_attack(state, unit, next) {
            let outcome = resolve_attack(state, unit, next, random);
            report.combat = Some(outcome);
            if state.unit(unit).is_none() {
                report.destroyed = true;
                break;
            }
            if !state.is_enterable_by(next, owner) {
                state.clear_path(unit);
                break;
            }
            continue;
        }

        if !u.hex.is_adjacent(next) || !state.is_enterable_by(next, owner) {
            debug!("{:?}: path blocked at {:?}", unit, next);
            state.clear_path(unit);
            report.halted = true;
            break;
        }

        state.pop_path(unit);
        state.move_unit_step(unit, next);
        report.steps += 1;

        let remaining = state.unit(unit).map_or(0, |u| u.path.len());
        if remaining > 0 && state.has_adjacent_threat(next, owner) {
            debug!("{:?}: halting at {:?}, enemy adjacent", unit, next);
            state.clear_path(unit);
            report.halted = true;
            break;
        }
    }

    if state.unit(unit).is_some_and(|u| u.moves_left == 0) {
        state.set_selected(unit, false);
    }
    report
}
