//! Series command - many autonomous games of one scenario
//!
//! ## Architecture
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_scenario(), report_results()
//! - Level 3: formatting

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use hexfront_core::Scenario;
use hexfront_turns::{play_series, SeriesConfig, SeriesResult};

#[derive(Args)]
pub struct SeriesArgs {
    /// Scenario JSON file (default: built-in skirmish)
    #[arg(long, value_name = "FILE")]
    pub scenario: Option<PathBuf>,

    /// Number of games to play
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Maximum rounds per game
    #[arg(long, default_value = "50")]
    pub max_rounds: u32,

    /// Play games one after another instead of in parallel
    #[arg(long)]
    pub sequential: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run series command
pub fn run(args: SeriesArgs, seed: Option<u64>) -> Result<()> {
    let scenario = load_scenario(&args)?;

    let mut config = SeriesConfig::new(args.games).with_max_rounds(args.max_rounds);
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    if args.sequential {
        config = config.sequential();
    }

    tracing::info!(
        "Starting series: '{}' ({} games, max {} rounds, seed {})",
        scenario.name,
        config.games,
        config.max_rounds,
        config.seed
    );

    let results = play_series(&scenario, &config)
        .with_context(|| format!("Invalid scenario '{}'", scenario.name))?;

    report_results(&scenario, &results, args.json)
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn load_scenario(args: &SeriesArgs) -> Result<Scenario> {
    match &args.scenario {
        Some(path) => Scenario::load(path),
        None => Ok(Scenario::default()),
    }
}

fn report_results(scenario: &Scenario, results: &SeriesResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
    } else {
        print!("{}", format_text_results(scenario, results));
    }
    Ok(())
}

// ============================================================================
// LEVEL 3 - FORMATTING
// ============================================================================

fn format_text_results(scenario: &Scenario, results: &SeriesResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n=== Series Results: {} ===\n", scenario.name));
    out.push_str(&format!("Total games: {}\n", results.games_played));
    for player in &scenario.players {
        let wins = results.wins.get(&player.name).copied().unwrap_or(0);
        out.push_str(&format!(
            "{:<12} {} ({:.1}%)\n",
            format!("{} wins:", player.name),
            wins,
            results.win_rate(&player.name) * 100.0
        ));
    }
    out.push_str(&format!(
        "{:<12} {} ({:.1}%)\n",
        "Draws:",
        results.draws,
        results.draw_rate() * 100.0
    ));
    out.push_str(&format!("{:<12} {:.1}\n", "Avg rounds:", results.avg_rounds));

    out.push_str("\nGame details:\n");
    for game in &results.games {
        let winner = game.winner.as_deref().unwrap_or("draw");
        out.push_str(&format!(
            "  Game {} (seed {}): {} in {} rounds\n",
            game.index + 1,
            game.seed,
            winner,
            game.rounds
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexfront_turns::SeriesGame;
    use std::collections::BTreeMap;

    #[test]
    fn test_format_text_results() {
        let scenario = Scenario::default();
        let mut wins = BTreeMap::new();
        wins.insert("Red".to_string(), 2);
        let results = SeriesResult {
            wins,
            draws: 1,
            avg_rounds: 20.0,
            games_played: 3,
            games: vec![
                SeriesGame {
                    index: 0,
                    seed: 42,
                    winner: Some("Red".to_string()),
                    rounds: 10,
                },
                SeriesGame {
                    index: 1,
                    seed: 43,
                    winner: None,
                    rounds: 30,
                },
                SeriesGame {
                    index: 2,
                    seed: 44,
                    winner: Some("Red".to_string()),
                    rounds: 20,
                },
            ],
        };

        let text = format_text_results(&scenario, &results);
        assert!(text.contains("Total games: 3"));
        assert!(text.contains("Red wins:    2 (66.7%)"));
        assert!(text.contains("Blue wins:   0 (0.0%)"));
        assert!(text.contains("Game 2 (seed 43): draw in 30 rounds"));
    }
}
