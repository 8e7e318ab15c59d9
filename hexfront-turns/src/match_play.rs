//! Series play - many autonomous games of one scenario
//!
//! Every seat, human ones included, is driven by the default policy. Game
//! `i` seeds both its combat rolls and its policies from `seed + i`, so a
//! series is reproducible whether it runs sequentially or in parallel.

use std::collections::BTreeMap;

use hexfront_core::{Scenario, SetupError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::config::{SchedulerConfig, SeriesConfig};
use crate::player::Controller;
use crate::scheduler::{GameOutcome, TurnScheduler};

/// Result of one game in a series
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeriesGame {
    pub index: usize,
    pub seed: u64,
    /// Winner's name, `None` for a draw
    pub winner: Option<String>,
    pub rounds: u32,
}

/// Aggregated series result
#[derive(Clone, Debug, Default, Serialize)]
pub struct SeriesResult {
    /// Wins per player name
    pub wins: BTreeMap<String, u32>,
    /// Games that hit the round limit or left no survivors
    pub draws: u32,
    /// Average game length in rounds
    pub avg_rounds: f32,
    pub games_played: u32,
    pub games: Vec<SeriesGame>,
}

impl SeriesResult {
    pub fn win_rate(&self, player: &str) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            self.wins.get(player).copied().unwrap_or(0) as f32 / self.games_played as f32
        }
    }

    pub fn draw_rate(&self) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            self.draws as f32 / self.games_played as f32
        }
    }
}

/// Play a series of autonomous games
pub fn play_series(scenario: &Scenario, config: &SeriesConfig) -> Result<SeriesResult, SetupError> {
    // Surface setup errors once instead of per game
    scenario.to_game_state()?;

    let indices: Vec<usize> = (0..config.games).collect();
    let games: Vec<SeriesGame> = if config.parallel {
        indices
            .into_par_iter()
            .map(|i| play_one(scenario, config, i))
            .collect::<Result<_, _>>()?
    } else {
        indices
            .into_iter()
            .map(|i| play_one(scenario, config, i))
            .collect::<Result<_, _>>()?
    };

    let result = aggregate(games);
    info!(
        "series of {} games: {:?} wins, {} draws, {:.1} rounds on average",
        result.games_played, result.wins, result.draws, result.avg_rounds
    );
    Ok(result)
}

fn play_one(scenario: &Scenario, config: &SeriesConfig, index: usize) -> Result<SeriesGame, SetupError> {
    let seed = config.seed.wrapping_add(index as u64);
    let state = scenario.to_game_state()?;
    let scheduler_config = SchedulerConfig::default()
        .with_max_rounds(config.max_rounds)
        .with_policy_seed(seed);
    let controllers = Controller::for_players(&state, &scheduler_config, Vec::new());

    let mut scheduler = TurnScheduler::new(state, controllers, ChaCha8Rng::seed_from_u64(seed))
        .with_config(scheduler_config)
        .with_start_player(scenario.start_player());
    let outcome = scheduler.run();
    let state = scheduler.into_state();

    let winner = match outcome {
        GameOutcome::Winner(player) => Some(state.player(player).name.clone()),
        GameOutcome::NoSurvivors { .. } | GameOutcome::RoundLimit { .. } | GameOutcome::Cancelled => None,
    };
    Ok(SeriesGame {
        index,
        seed,
        winner,
        rounds: state.round,
    })
}

fn aggregate(games: Vec<SeriesGame>) -> SeriesResult {
    let mut result = SeriesResult::default();
    for game in &games {
        match &game.winner {
            Some(name) => *result.wins.entry(name.clone()).or_insert(0) += 1,
            None => result.draws += 1,
        }
    }
    result.games_played = games.len() as u32;
    if !games.is_empty() {
        result.avg_rounds = games.iter().map(|g| g.rounds as f32).sum::<f32>() / games.len() as f32;
    }
    result.games = games;
    result
}
