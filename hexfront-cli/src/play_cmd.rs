//! Play command - run one game, optionally with humans at the terminal
//!
//! The scheduler runs on its own thread and owns the game state. The main
//! thread is the presentation boundary: it waits for prompts on the human
//! seats, prints them, and turns stdin lines into replies.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use hexfront_core::{GameEvent, GameState, Hex, Order, PlayerId, Scenario, UnitStatus};
use hexfront_turns::{
    seat, CancelToken, Controller, GameOutcome, InputHandle, Prompt, Reply, SchedulerConfig, TurnScheduler,
};

#[derive(Args)]
pub struct PlayArgs {
    /// Scenario JSON file (default: built-in skirmish)
    #[arg(long, value_name = "FILE")]
    pub scenario: Option<PathBuf>,

    /// Seat player N at the terminal (repeatable)
    #[arg(long = "human", value_name = "N")]
    pub humans: Vec<usize>,

    /// Maximum full rounds
    #[arg(long)]
    pub max_rounds: Option<u32>,

    /// Seconds a human prompt may go unanswered
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Write the final position to this scenario file
    #[arg(long, value_name = "FILE")]
    pub save: Option<PathBuf>,
}

/// A line typed at the terminal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Reply(Reply),
    Quit,
}

/// Run play command
pub fn run(args: PlayArgs, seed: Option<u64>) -> Result<()> {
    let scenario = load_scenario(args.scenario.as_ref())?;
    let state = scenario
        .to_game_state()
        .with_context(|| format!("Invalid scenario '{}'", scenario.name))?;
    check_humans(&state, &args.humans)?;

    let mut config = SchedulerConfig::default();
    if let Some(rounds) = args.max_rounds {
        config = config.with_max_rounds(rounds);
    }
    if let Some(secs) = args.timeout {
        config = config.with_prompt_timeout(Duration::from_secs(secs));
    }
    if let Some(seed) = seed {
        config = config.with_policy_seed(seed);
    }

    let cancel = CancelToken::new();
    let mut seats = Vec::new();
    let mut inputs = Vec::new();
    for &idx in &args.humans {
        let (s, input) = seat(&cancel);
        seats.push((PlayerId(idx), s));
        inputs.push((PlayerId(idx), input));
    }
    let controllers = Controller::for_players(&state, &config, seats);

    info!(
        "Starting '{}': {} players, {} units, {} at the terminal",
        scenario.name,
        state.players().len(),
        state.unit_count(),
        inputs.len()
    );

    let names: Vec<String> = state.players().iter().map(|p| p.name.clone()).collect();
    let mut scheduler = TurnScheduler::new(state, controllers, create_rng(seed))
        .with_config(config)
        .with_cancel_token(cancel.clone())
        .with_start_player(scenario.start_player())
        .with_observer(move |event: &GameEvent| log_event(&names, event));

    let session = thread::spawn(move || {
        let outcome = scheduler.run();
        (outcome, scheduler.into_state())
    });

    if !inputs.is_empty() {
        drive_terminal(&inputs, &cancel, || session.is_finished())?;
    }
    drop(inputs);

    let (outcome, state) = match session.join() {
        Ok(result) => result,
        Err(_) => bail!("Scheduler thread panicked"),
    };
    report_outcome(&state, outcome);

    if let Some(path) = &args.save {
        state.to_scenario(&scenario.name).save(path)?;
        info!("Saved final position to {}", path.display());
    }
    Ok(())
}

fn load_scenario(path: Option<&PathBuf>) -> Result<Scenario> {
    match path {
        Some(path) => Scenario::load(path),
        None => Ok(Scenario::default()),
    }
}

fn check_humans(state: &GameState, humans: &[usize]) -> Result<()> {
    for &idx in humans {
        if idx >= state.players().len() {
            bail!("--human {} but the scenario has {} players", idx, state.players().len());
        }
    }
    Ok(())
}

/// Answer prompts from stdin until the session finishes
fn drive_terminal(
    inputs: &[(PlayerId, InputHandle)],
    cancel: &CancelToken,
    finished: impl Fn() -> bool,
) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while !finished() {
        let Some((player, input, prompt)) = poll_prompt(inputs) else {
            continue;
        };
        print_prompt(player, &prompt);

        loop {
            print!("> ");
            io::stdout().flush()?;
            let Some(line) = lines.next() else {
                info!("stdin closed, leaving the game");
                cancel.cancel();
                return Ok(());
            };
            match parse_command(&line?) {
                Ok(Command::Quit) => {
                    cancel.cancel();
                    return Ok(());
                }
                Ok(Command::Reply(reply)) => {
                    if !input.reply(reply) {
                        warn!("{:?}: scheduler is gone", player);
                        return Ok(());
                    }
                    break;
                }
                Err(msg) => println!("{}", msg),
            }
        }
    }
    Ok(())
}

fn poll_prompt(inputs: &[(PlayerId, InputHandle)]) -> Option<(PlayerId, &InputHandle, Prompt)> {
    let slice = Duration::from_millis(50 / inputs.len().max(1) as u64 + 1);
    inputs
        .iter()
        .find_map(|(player, input)| input.next_prompt_timeout(slice).map(|p| (*player, input, p)))
}

fn print_prompt(player: PlayerId, prompt: &Prompt) {
    match prompt {
        Prompt::Unit { unit, hex, .. } => {
            println!("[player {}] unit {} at ({}, {}) is ready", player.0, unit.0, hex.col, hex.row);
            println!("  move C R | skip | sleep | wait | end | quit");
        }
        Prompt::EndTurn { .. } => {
            println!("[player {}] all units handled, type 'end' to finish the turn", player.0);
        }
    }
}

/// Parse one terminal line
pub fn parse_command(line: &str) -> Result<Command, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["move" | "m", col, row] => {
            let col = col.parse::<i32>().map_err(|_| format!("bad column '{}'", col))?;
            let row = row.parse::<i32>().map_err(|_| format!("bad row '{}'", row))?;
            Ok(Command::Reply(Reply::Order(Order::MoveTo(Hex::new(col, row)))))
        }
        ["skip" | "s"] => Ok(Command::Reply(Reply::Order(Order::Skip))),
        ["sleep" | "z"] => Ok(Command::Reply(Reply::Order(Order::Sleep))),
        ["wait" | "w"] => Ok(Command::Reply(Reply::Order(Order::Wait))),
        ["end" | "e"] => Ok(Command::Reply(Reply::EndTurn)),
        ["quit" | "q"] => Ok(Command::Quit),
        [] => Err("empty command".to_string()),
        _ => Err(format!("unknown command '{}'", line.trim())),
    }
}

fn log_event(names: &[String], event: &GameEvent) {
    let name = |p: PlayerId| names.get(p.0).map(String::as_str).unwrap_or("?");
    match event {
        GameEvent::CurrentPlayerChanged { player } => info!("{} to move", name(*player)),
        GameEvent::WinnerDeclared { player } => info!("{} wins", name(*player)),
        GameEvent::AttackInitiated { attacker, defender } => {
            info!("unit {} attacks unit {}", attacker.0, defender.0)
        }
        GameEvent::UnitStatusChanged {
            unit,
            status: UnitStatus::Destroyed,
            ..
        } => info!("unit {} destroyed", unit.0),
        GameEvent::UnitMoved { unit, from, to, .. } => {
            debug!("unit {} moved ({}, {}) -> ({}, {})", unit.0, from.col, from.row, to.col, to.row)
        }
        other => debug!("{:?}", other),
    }
}

fn report_outcome(state: &GameState, outcome: GameOutcome) {
    match outcome {
        GameOutcome::Winner(player) => {
            println!("{} wins after {} rounds", state.player(player).name, state.round)
        }
        GameOutcome::NoSurvivors { rounds } => println!("No survivors after {} rounds", rounds),
        GameOutcome::RoundLimit { rounds } => println!("Round limit reached after {} rounds", rounds),
        GameOutcome::Cancelled => println!("Game cancelled after {} rounds", state.round),
    }
    for (idx, info) in state.players().iter().enumerate() {
        println!("  {:<10} {} units", info.name, state.units_of(PlayerId(idx)).count());
    }
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}
