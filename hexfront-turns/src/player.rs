//! Player controllers
//!
//! Every seat at the table is driven by one of three controllers. The set
//! is closed: interactive players answer through the handshake, autonomous
//! players through an [`OrderPolicy`], and inert players never act.

use std::time::Duration;

use hexfront_core::{AdvancePolicy, GameState, Order, OrderPolicy, PlayerId, PlayerKind, UnitId};
use tracing::debug;

use crate::config::SchedulerConfig;
use crate::handshake::{Interrupted, Prompt, Reply, Seat};

/// What a controller decided for a ready unit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Order(Order),
    /// Stop selecting and end the turn
    EndTurn,
}

pub enum Controller {
    Interactive(Seat),
    Autonomous(Box<dyn OrderPolicy>),
    Inert,
}

impl Controller {
    pub fn autonomous(policy: impl OrderPolicy + 'static) -> Self {
        Controller::Autonomous(Box::new(policy))
    }

    /// One controller per player.
    ///
    /// Players listed in `seats` are interactive. Everyone else follows
    /// their kind: computers (and humans without a seat) get an
    /// [`AdvancePolicy`] seeded with `policy_seed + index`, neutrals are inert.
    pub fn for_players(state: &GameState, config: &SchedulerConfig, seats: Vec<(PlayerId, Seat)>) -> Vec<Controller> {
        let mut slots: Vec<Option<Seat>> = state.players().iter().map(|_| None).collect();
        for (player, seat) in seats {
            assert!(player.0 < slots.len(), "seat for unknown player {:?}", player);
            slots[player.0] = Some(seat);
        }

        state
            .players()
            .iter()
            .zip(slots)
            .enumerate()
            .map(|(idx, (info, seat))| match (seat, info.kind) {
                (Some(seat), _) => Controller::Interactive(seat),
                (None, PlayerKind::Neutral) => Controller::Inert,
                (None, PlayerKind::Human | PlayerKind::Computer) => Controller::autonomous(
                    AdvancePolicy::with_seed(config.policy_seed.wrapping_add(idx as u64)),
                ),
            })
            .collect()
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, Controller::Interactive(_))
    }

    /// Ask for an order for a ready unit. Blocks for interactive players.
    pub fn decide(
        &mut self,
        state: &GameState,
        unit: UnitId,
        timeout: Option<Duration>,
    ) -> Result<Decision, Interrupted> {
        match self {
            Controller::Interactive(seat) => {
                let Some(u) = state.unit(unit) else {
                    return Ok(Decision::Order(Order::Wait));
                };
                let prompt = Prompt::Unit {
                    player: u.owner,
                    unit,
                    hex: u.hex,
                };
                match seat.ask(prompt, timeout)? {
                    Some(Reply::Order(order)) => Ok(Decision::Order(order)),
                    Some(Reply::EndTurn) => Ok(Decision::EndTurn),
                    None => Ok(Decision::Order(Order::Wait)),
                }
            }
            Controller::Autonomous(policy) => Ok(Decision::Order(policy.order_for(state, unit))),
            Controller::Inert => Ok(Decision::Order(Order::Wait)),
        }
    }

    /// Player-specific end of turn. Interactive players must confirm; unit
    /// orders that arrive meanwhile are ignored.
    pub fn finish_turn(&mut self, player: PlayerId, timeout: Option<Duration>) -> Result<(), Interrupted> {
        let Controller::Interactive(seat) = self else {
            return Ok(());
        };
        seat.publish(Prompt::EndTurn { player })?;
        loop {
            match seat.wait_reply(timeout)? {
                Some(Reply::EndTurn) | None => return Ok(()),
                Some(Reply::Order(order)) => {
                    debug!("{:?}: ignoring {:?} while waiting for end of turn", player, order);
                }
            }
        }
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Controller::Interactive(_) => write!(f, "Interactive"),
            Controller::Autonomous(_) => write!(f, "Autonomous"),
            Controller::Inert => write!(f, "Inert"),
        }
    }
}
