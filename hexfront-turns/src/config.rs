//! Configuration types for scheduling and series play

use std::time::Duration;

/// Turn scheduler configuration
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Stop after this many full rounds (None = play until a winner)
    pub max_rounds: Option<u32>,
    /// How long an interactive prompt may go unanswered (None = forever)
    pub prompt_timeout: Option<Duration>,
    /// Base seed for autonomous policies; player `i` gets `policy_seed + i`
    pub policy_seed: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_rounds: None,
            prompt_timeout: None,
            policy_seed: 42,
        }
    }
}

impl SchedulerConfig {
    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    pub fn with_prompt_timeout(mut self, timeout: Duration) -> Self {
        self.prompt_timeout = Some(timeout);
        self
    }

    pub fn with_policy_seed(mut self, seed: u64) -> Self {
        self.policy_seed = seed;
        self
    }
}

/// Configuration for a series of autonomous games
#[derive(Clone, Debug)]
pub struct SeriesConfig {
    /// Number of games
    pub games: usize,
    /// Game `i` is seeded with `seed + i`
    pub seed: u64,
    /// Whether to run games in parallel
    pub parallel: bool,
    /// Maximum rounds per game
    pub max_rounds: u32,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            games: 10,
            seed: 42,
            parallel: true,
            max_rounds: 50,
        }
    }
}

impl SeriesConfig {
    pub fn new(games: usize) -> Self {
        Self {
            games,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}
