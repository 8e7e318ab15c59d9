//! Combat resolution
//!
//! Both sides roll `value * 2/3 + r * value * 2/3` with `r` drawn from a
//! [`RandomSource`]. The attacker wins only with a strictly higher roll. The
//! loser takes one damage step.

use std::collections::VecDeque;

use rand::{Rng, RngCore};
use tracing::debug;

use crate::board::Hex;
use crate::events::GameEvent;
use crate::game::GameState;
use crate::units::{Health, UnitId};

/// Supplier of uniform values in `[0, 1)` for combat rolls
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

impl<R: RngCore> RandomSource for R {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Fixed roll sequence, replayed in a cycle
#[derive(Clone, Debug)]
pub struct ScriptedRolls {
    rolls: VecDeque<f64>,
}

impl ScriptedRolls {
    pub fn new(rolls: impl IntoIterator<Item = f64>) -> Self {
        let rolls: VecDeque<f64> = rolls.into_iter().collect();
        assert!(!rolls.is_empty(), "scripted rolls need at least one value");
        assert!(
            rolls.iter().all(|r| (0.0..1.0).contains(r)),
            "scripted rolls must lie in [0, 1)"
        );
        Self { rolls }
    }
}

impl RandomSource for ScriptedRolls {
    fn next_unit(&mut self) -> f64 {
        let roll = self.rolls.pop_front().unwrap_or_default();
        self.rolls.push_back(roll);
        roll
    }
}

/// Result of one attack
#[derive(Clone, Debug, PartialEq)]
pub struct CombatOutcome {
    pub attacker: UnitId,
    pub defender: UnitId,
    pub attack_roll: f64,
    pub defense_roll: f64,
    pub attacker_won: bool,
    /// The unit that took the damage step
    pub loser: UnitId,
    /// Health of the loser after the hit
    pub loser_health: Health,
}

/// One side's modified combat value. The fixed part is whole-number
/// two thirds of `value`; only the random part keeps fractions.
pub fn roll(value: u32, random: &mut impl RandomSource) -> f64 {
    let base = (value * 2 / 3) as f64;
    base + random.next_unit() * value as f64 * 2.0 / 3.0
}

/// The defender of a hex: highest health-adjusted defense, earliest in the
/// stack on ties
pub fn select_defender(state: &GameState, hex: Hex) -> Option<UnitId> {
    let cell = state.grid().get(hex)?;
    let mut best: Option<(UnitId, u32)> = None;
    for &id in cell.units() {
        let Some(unit) = state.unit(id) else { continue };
        let defense = unit.defense();
        if best.map_or(true, |(_, d)| defense > d) {
            best = Some((id, defense));
        }
    }
    best.map(|(id, _)| id)
}

/// Whether `attacker` may attack `target` right now
pub fn can_attack(state: &GameState, attacker: UnitId, target: Hex) -> bool {
    let Some(unit) = state.unit(attacker) else {
        return false;
    };
    unit.attacks_left > 0 && unit.hex.is_adjacent(target) && state.is_hostile_to(target, unit.owner)
}

/// Resolve an attack from `attacker` on the stack at `target`.
///
/// Spends exactly one attack whatever the outcome and never touches the
/// movement budget. Calling this when [`can_attack`] is false is a bug.
pub fn resolve_attack(
    state: &mut GameState,
    attacker: UnitId,
    target: Hex,
    random: &mut impl RandomSource,
) -> CombatOutcome {
    assert!(
        can_attack(state, attacker, target),
        "{:?} cannot attack {:?}",
        attacker,
        target
    );
    let Some(defender) = select_defender(state, target) else {
        panic!("no defender at {:?}", target);
    };

    let (attack_value, defense_value) = match (state.unit(attacker), state.unit(defender)) {
        (Some(a), Some(d)) => (a.attack(), d.defense()),
        _ => panic!("combatants {:?} / {:?} vanished", attacker, defender),
    };

    state.emit(GameEvent::AttackInitiated { attacker, defender });
    state.spend_attack(attacker);

    let attack_roll = roll(attack_value, random);
    let defense_roll = roll(defense_value, random);
    let attacker_won = attack_roll > defense_roll;
    let loser = if attacker_won { defender } else { attacker };
    let loser_health = state.damage_unit(loser);

    debug!(
        "combat {:?} ({:.2}) vs {:?} ({:.2}): {:?} -> {:?}",
        attacker, attack_roll, defender, defense_roll, loser, loser_health
    );

    CombatOutcome {
        attacker,
        defender,
        attack_roll,
        defense_roll,
        attacker_won,
        loser,
        loser_health,
    }
}
