//! Turn scheduler - the single writer of game state
//!
//! Players take turns in list order. Within a turn the scheduler offers
//! every ready unit to its player once per selection pass, applies the
//! answer, then mechanically executes units that already carry a queued
//! path. Passes repeat while they make progress. After every full round the
//! win check runs.

use hexfront_core::{
    apply_order, execute_orders, GameEvent, GameObserver, GameState, NullObserver, PlayerId, PlayerKind,
    RandomSource, UnitId,
};
use tracing::{debug, info};

use crate::config::SchedulerConfig;
use crate::handshake::{CancelToken, Interrupted};
use crate::player::{Controller, Decision};

/// Where the scheduler stands within the current player's turn
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    Starting,
    Selecting,
    ApplyingOrders,
    Finishing,
    TurnOver,
}

/// How a game session ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameOutcome {
    Winner(PlayerId),
    /// Every non-neutral player lost its last unit
    NoSurvivors { rounds: u32 },
    RoundLimit { rounds: u32 },
    Cancelled,
}

impl GameOutcome {
    pub fn winner(&self) -> Option<PlayerId> {
        match self {
            GameOutcome::Winner(player) => Some(*player),
            _ => None,
        }
    }
}

/// Progress fingerprint of one player's units. Every component moves in
/// one direction during a turn, so an unchanged fingerprint means a pass
/// achieved nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Progress {
    moves_left: u32,
    attacks_left: u32,
    skipped: usize,
    asleep: usize,
    units: usize,
}

pub struct TurnScheduler<R: RandomSource> {
    state: GameState,
    controllers: Vec<Controller>,
    config: SchedulerConfig,
    random: R,
    observer: Box<dyn GameObserver>,
    cancel: CancelToken,
    phase: TurnPhase,
    start_player: Option<PlayerId>,
}

impl<R: RandomSource> TurnScheduler<R> {
    pub fn new(state: GameState, controllers: Vec<Controller>, random: R) -> Self {
        assert_eq!(
            state.players().len(),
            controllers.len(),
            "one controller per player"
        );
        Self {
            state,
            controllers,
            config: SchedulerConfig::default(),
            random,
            observer: Box::new(NullObserver),
            cancel: CancelToken::new(),
            phase: TurnPhase::Idle,
            start_player: None,
        }
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_observer(mut self, observer: impl GameObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Use a token shared with interactive seats and the boundary
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Begin the first round at `player` (resuming a saved game)
    pub fn with_start_player(mut self, player: PlayerId) -> Self {
        assert!(player.0 < self.state.players().len(), "unknown player {:?}", player);
        self.start_player = Some(player);
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn into_state(self) -> GameState {
        self.state
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Play rounds until someone wins, the round limit is hit or the
    /// session is cancelled
    pub fn run(&mut self) -> GameOutcome {
        let outcome = match self.run_rounds() {
            Ok(outcome) => outcome,
            Err(reason) => {
                info!("session ended while waiting for input: {:?}", reason);
                GameOutcome::Cancelled
            }
        };
        self.phase = TurnPhase::TurnOver;
        self.flush_events();
        outcome
    }

    fn run_rounds(&mut self) -> Result<GameOutcome, Interrupted> {
        let players = self.state.players().len();
        let mut first = self.start_player.take().map_or(0, |p| p.0);

        loop {
            for idx in first..players {
                self.play_turn(PlayerId(idx))?;
            }
            first = 0;
            self.state.round += 1;

            if let Some(winner) = self.state.winner() {
                info!(
                    "{} wins after {} rounds",
                    self.state.player(winner).name,
                    self.state.round
                );
                self.state.emit(GameEvent::WinnerDeclared { player: winner });
                return Ok(GameOutcome::Winner(winner));
            }
            let survivors = self
                .state
                .players()
                .iter()
                .any(|p| p.kind != PlayerKind::Neutral && p.has_units());
            if !survivors {
                info!("no player has units left after {} rounds", self.state.round);
                return Ok(GameOutcome::NoSurvivors {
                    rounds: self.state.round,
                });
            }
            if self.config.max_rounds.is_some_and(|max| self.state.round >= max) {
                info!("round limit reached after {} rounds", self.state.round);
                return Ok(GameOutcome::RoundLimit {
                    rounds: self.state.round,
                });
            }
        }
    }

    /// Play one player's turn from STARTING to TURN_OVER
    pub fn play_turn(&mut self, player: PlayerId) -> Result<(), Interrupted> {
        self.check_cancelled()?;
        if !self.state.player(player).has_units() {
            debug!("{:?} has no units, turn skipped", player);
            return Ok(());
        }

        self.phase = TurnPhase::Starting;
        self.state.begin_turn(player);
        info!(
            "round {}: {}'s turn",
            self.state.round + 1,
            self.state.player(player).name
        );
        self.flush_events();

        let ended = loop {
            let before = self.progress(player);

            self.phase = TurnPhase::Selecting;
            let ended = self.selection_pass(player)?;

            self.phase = TurnPhase::ApplyingOrders;
            self.apply_queued(player);

            if ended || self.progress(player) == before {
                break ended;
            }
            debug!("{:?}: pass made progress, selecting again", player);
        };

        self.phase = TurnPhase::Finishing;
        if !ended {
            self.controllers[player.0].finish_turn(player, self.config.prompt_timeout)?;
        }
        self.state.finish_turn();
        self.phase = TurnPhase::TurnOver;
        self.flush_events();
        Ok(())
    }

    /// Offer each currently ready unit once. Returns true if the player
    /// ended the turn early.
    fn selection_pass(&mut self, player: PlayerId) -> Result<bool, Interrupted> {
        for unit in self.state.ready_units(player) {
            self.check_cancelled()?;
            // Earlier orders this pass may have used up or destroyed it
            if !self.state.unit(unit).is_some_and(|u| u.is_ready()) {
                continue;
            }

            self.state.set_selected(unit, true);
            self.flush_events();

            let decision = self.controllers[player.0].decide(&self.state, unit, self.config.prompt_timeout)?;
            match decision {
                Decision::Order(order) => {
                    debug!("{:?}: {:?} ordered {:?}", player, unit, order);
                    apply_order(&mut self.state, unit, order, &mut self.random);
                    self.release(unit);
                }
                Decision::EndTurn => {
                    debug!("{:?} ends the turn early", player);
                    self.release(unit);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Execute every unit of `player` that carries a queued path
    fn apply_queued(&mut self, player: PlayerId) {
        let queued: Vec<UnitId> = self
            .state
            .units_of(player)
            .filter(|u| !u.path.is_empty() && u.moves_left > 0 && !u.selected)
            .map(|u| u.id)
            .collect();
        for unit in queued {
            if self.state.unit(unit).is_some_and(|u| !u.path.is_empty()) {
                let report = execute_orders(&mut self.state, unit, &mut self.random);
                debug!("{:?}: queued orders applied: {:?}", unit, report);
            }
        }
        self.flush_events();
    }

    fn release(&mut self, unit: UnitId) {
        if self.state.unit(unit).is_some() {
            self.state.set_selected(unit, false);
        }
        self.flush_events();
    }

    fn progress(&self, player: PlayerId) -> Progress {
        let mut progress = Progress {
            moves_left: 0,
            attacks_left: 0,
            skipped: 0,
            asleep: 0,
            units: 0,
        };
        for unit in self.state.units_of(player) {
            progress.moves_left += unit.moves_left;
            progress.attacks_left += unit.attacks_left;
            progress.skipped += unit.skipped as usize;
            progress.asleep += unit.asleep as usize;
            progress.units += 1;
        }
        progress
    }

    fn check_cancelled(&self) -> Result<(), Interrupted> {
        if self.cancel.is_cancelled() {
            Err(Interrupted::Cancelled)
        } else {
            Ok(())
        }
    }

    fn flush_events(&mut self) {
        for event in self.state.drain_events() {
            self.observer.on_event(&event);
        }
    }
}
