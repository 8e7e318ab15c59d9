//! HEXFRONT CLI - Command-line interface
//!
//! Commands:
//! - play: Play one game, humans at the terminal or all autonomous
//! - series: Run many autonomous games and report win rates
//! - scenario: Write the built-in scenario to a file

mod play_cmd;
mod series_cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hexfront_core::Scenario;

#[derive(Parser)]
#[command(name = "hexfront")]
#[command(about = "HEXFRONT turn-based hex strategy engine")]
struct Cli {
    /// Seed for combat rolls and autonomous players
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single game
    Play(play_cmd::PlayArgs),
    /// Run a series of autonomous games
    Series(series_cmd::SeriesArgs),
    /// Write the default scenario as JSON
    Scenario {
        #[arg(long, value_name = "FILE")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => play_cmd::run(args, cli.seed),
        Commands::Series(args) => series_cmd::run(args, cli.seed),
        Commands::Scenario { output } => {
            Scenario::default().save(&output)?;
            println!("Wrote default scenario to {}", output.display());
            Ok(())
        }
    }
}
