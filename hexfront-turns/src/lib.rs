//! HEXFRONT Turns - Turn scheduling and the interactive handshake
//!
//! This crate drives a `hexfront_core::GameState` through a session:
//! - The turn scheduler state machine (single writer of game state)
//! - Player controllers: interactive, autonomous, inert
//! - The blocking prompt/reply handshake with cancellation
//! - Parallel series of autonomous games

mod config;
mod handshake;
mod match_play;
mod player;
mod scheduler;

pub use config::{SchedulerConfig, SeriesConfig};
pub use handshake::{seat, CancelToken, InputHandle, Interrupted, Prompt, Reply, Seat};
pub use match_play::{play_series, SeriesGame, SeriesResult};
pub use player::{Controller, Decision};
pub use scheduler::{GameOutcome, TurnPhase, TurnScheduler};
