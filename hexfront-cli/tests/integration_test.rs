//! Integration tests for the HEXFRONT engine
//!
//! Tests the full stack: core rules, autonomous players, the scheduler and
//! its handshake, persistence, and the `hexfront` binary.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use hexfront_core::{GameEvent, GameState, Order, PlayerId, Scenario, UnitId};
use hexfront_turns::{
    play_series, seat, CancelToken, Controller, GameOutcome, Prompt, Reply, SchedulerConfig, SeriesConfig,
    TurnScheduler,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn skirmish() -> GameState {
    Scenario::default().to_game_state().unwrap()
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("hexfront-it-{}-{}", std::process::id(), name))
}

/// Every unit sits in its cell, stacks are single-owner, budgets are sane
fn assert_consistent(state: &GameState) {
    let mut seen = BTreeSet::new();
    for cell in state.grid().cells() {
        let owners: BTreeSet<PlayerId> = cell.units().iter().map(|&id| state.unit(id).unwrap().owner).collect();
        assert!(owners.len() <= 1, "mixed stack at {:?}", cell.hex);
        for &id in cell.units() {
            let unit = state.unit(id).unwrap();
            assert_eq!(unit.hex, cell.hex);
            assert!(seen.insert(id), "{:?} listed twice", id);
        }
        if let Some(&first) = cell.units().first() {
            assert_eq!(cell.owner(), Some(state.unit(first).unwrap().owner));
        }
    }
    assert_eq!(seen.len(), state.unit_count());

    for player in state.player_ids() {
        for unit in state.units_of(player) {
            assert_eq!(unit.owner, player);
            let kind = hexfront_core::get_unit_type(unit.kind);
            assert!(unit.moves_left <= kind.movement);
            assert!(unit.attacks_left <= kind.attacks_per_turn);
        }
    }
}

// ============================================================================
// AUTONOMOUS GAMES
// ============================================================================

#[test]
fn test_autonomous_games_stay_consistent() {
    for seed in 0..5u64 {
        let config = SchedulerConfig::default().with_max_rounds(25).with_policy_seed(seed);
        let state = skirmish();
        let controllers = Controller::for_players(&state, &config, Vec::new());
        let mut scheduler =
            TurnScheduler::new(state, controllers, ChaCha8Rng::seed_from_u64(seed)).with_config(config);

        let outcome = scheduler.run();
        let state = scheduler.into_state();
        assert_consistent(&state);
        assert!(state.round <= 25);

        match outcome {
            GameOutcome::Winner(player) => assert_eq!(state.winner(), Some(player)),
            GameOutcome::RoundLimit { rounds } => assert_eq!(rounds, 25),
            GameOutcome::NoSurvivors { .. } => assert_eq!(state.winner(), None),
            GameOutcome::Cancelled => panic!("nobody cancelled seed {}", seed),
        }
    }
}

#[test]
fn test_same_seed_same_game() {
    let play = |seed: u64| {
        let config = SchedulerConfig::default().with_max_rounds(15).with_policy_seed(seed);
        let state = skirmish();
        let controllers = Controller::for_players(&state, &config, Vec::new());
        let mut events = Vec::new();
        let (tx, rx) = std::sync::mpsc::channel();
        let mut scheduler = TurnScheduler::new(state, controllers, ChaCha8Rng::seed_from_u64(seed))
            .with_config(config)
            .with_observer(move |event: &GameEvent| {
                let _ = tx.send(event.clone());
            });
        let outcome = scheduler.run();
        drop(scheduler);
        events.extend(rx.try_iter());
        (outcome, events)
    };

    let (outcome_a, events_a) = play(9);
    let (outcome_b, events_b) = play(9);
    assert_eq!(outcome_a, outcome_b);
    assert_eq!(events_a, events_b);
    assert!(!events_a.is_empty());
}

#[test]
fn test_series_of_default_scenario() {
    let config = SeriesConfig::new(4).with_seed(3).with_max_rounds(20);
    let result = play_series(&Scenario::default(), &config).unwrap();
    assert_eq!(result.games_played, 4);
    assert!(!result.wins.contains_key("Rebels"));
    let wins: u32 = result.wins.values().sum();
    assert_eq!(wins + result.draws, 4);
}

// ============================================================================
// INTERACTIVE SESSION
// ============================================================================

#[test]
fn test_human_session_over_handshake() {
    let config = SchedulerConfig::default().with_max_rounds(2);
    let state = skirmish();
    let cancel = CancelToken::new();
    let (red_seat, red_input) = seat(&cancel);
    let controllers = Controller::for_players(&state, &config, vec![(PlayerId(0), red_seat)]);
    let mut scheduler = TurnScheduler::new(state, controllers, ChaCha8Rng::seed_from_u64(5))
        .with_config(config)
        .with_cancel_token(cancel);

    let session = thread::spawn(move || {
        let outcome = scheduler.run();
        (outcome, scheduler.into_state())
    });

    // Skip every Red unit, then confirm the end of the turn
    let mut offered = Vec::new();
    let mut turns_ended = 0;
    while let Some(prompt) = red_input.next_prompt() {
        match prompt {
            Prompt::Unit { player, unit, .. } => {
                assert_eq!(player, PlayerId(0));
                offered.push(unit);
                assert!(red_input.order(Order::Skip));
            }
            Prompt::EndTurn { player } => {
                assert_eq!(player, PlayerId(0));
                turns_ended += 1;
                assert!(red_input.reply(Reply::EndTurn));
            }
        }
    }

    let (outcome, state) = session.join().unwrap();
    assert_eq!(outcome, GameOutcome::RoundLimit { rounds: 2 });
    assert_eq!(turns_ended, 2);
    // Five Red units, each offered once per turn
    assert_eq!(offered.len(), 10);
    let distinct: BTreeSet<UnitId> = offered.into_iter().collect();
    assert_eq!(distinct.len(), 5);
    assert_consistent(&state);
}

#[test]
fn test_cancel_mid_session() {
    let state = skirmish();
    let cancel = CancelToken::new();
    let (red_seat, red_input) = seat(&cancel);
    let config = SchedulerConfig::default();
    let controllers = Controller::for_players(&state, &config, vec![(PlayerId(0), red_seat)]);
    let mut scheduler =
        TurnScheduler::new(state, controllers, ChaCha8Rng::seed_from_u64(1)).with_cancel_token(cancel.clone());

    let session = thread::spawn(move || scheduler.run());
    assert!(matches!(red_input.next_prompt(), Some(Prompt::Unit { .. })));
    cancel.cancel();
    assert_eq!(session.join().unwrap(), GameOutcome::Cancelled);
}

// ============================================================================
// PERSISTENCE
// ============================================================================

#[test]
fn test_resume_saved_game() {
    let config = SchedulerConfig::default().with_max_rounds(3);
    let state = skirmish();
    let controllers = Controller::for_players(&state, &config, Vec::new());
    let mut scheduler = TurnScheduler::new(state, controllers, ChaCha8Rng::seed_from_u64(21)).with_config(config);
    scheduler.run();
    let state = scheduler.into_state();

    let path = temp_path("resume.json");
    state.to_scenario("midgame").save(&path).unwrap();
    let loaded = Scenario::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let restored = loaded.to_game_state().unwrap();
    assert_eq!(restored.round, state.round);
    assert_eq!(restored.unit_count(), state.unit_count());
    for player in state.player_ids() {
        let before: Vec<_> = state.units_of(player).map(|u| (u.kind, u.hex, u.health)).collect();
        let after: Vec<_> = restored.units_of(player).map(|u| (u.kind, u.hex, u.health)).collect();
        assert_eq!(before.len(), after.len());
        for entry in &before {
            assert!(after.contains(entry), "{:?} lost on restore", entry);
        }
    }
    assert_consistent(&restored);
}

// ============================================================================
// BINARY
// ============================================================================

fn hexfront() -> Command {
    Command::new(env!("CARGO_BIN_EXE_hexfront"))
}

#[test]
fn test_cli_writes_default_scenario() {
    let path = temp_path("default.json");
    let status = hexfront()
        .args(["scenario", "--output"])
        .arg(&path)
        .stdout(Stdio::null())
        .status()
        .unwrap();
    assert!(status.success());

    let scenario = Scenario::load(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(scenario.name, "skirmish");
    assert!(scenario.to_game_state().is_ok());
}

#[test]
fn test_cli_series_json() {
    let output = hexfront()
        .args(["series", "--games", "2", "--max-rounds", "10", "--json", "--seed", "7"])
        .env("RUST_LOG", "off")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["games_played"], 2);
    assert_eq!(json["games"].as_array().unwrap().len(), 2);
}

#[test]
fn test_cli_quit_cancels_play() {
    let mut child = hexfront()
        .args(["play", "--human", "0", "--seed", "1"])
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"bogus\nquit\n").unwrap();

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("is ready"));
    assert!(stdout.contains("unknown command 'bogus'"));
    assert!(stdout.contains("Game cancelled"));
}
