//! Simulate command - play automated games on a scenario
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_scenario(), play_games(), report_results()
//! - Level 3: play_single_game(), choose_move(), compute_statistics()
//! - Level 4: formatting utilities

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use frontline_core::{expected_hits, GameResult, GameState, Move, Scenario, SharedDice, Side};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

/// How automated players pick moves
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Policy {
    /// Uniformly random legal moves
    Random,
    /// Random, except battles go to the highest expected hits
    Greedy,
}

#[derive(Args)]
pub struct SimulateArgs {
    /// Scenario JSON file (built-in skirmish when omitted)
    #[arg(long, value_name = "FILE")]
    pub scenario: Option<PathBuf>,

    /// Number of games to play
    #[arg(long, default_value = "100")]
    pub games: usize,

    /// Moves after which an undecided game is abandoned
    #[arg(long, default_value = "2000")]
    pub max_moves: usize,

    /// Move selection for both sides
    #[arg(long, value_enum, default_value = "random")]
    pub policy: Policy,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Result of a single game
#[derive(Clone, Debug)]
struct GameRecord {
    game_number: usize,
    result: GameResult,
    moves: usize,
    medals: [usize; 2],
}

/// Aggregated results
#[derive(Clone, Debug)]
struct SimulationResults {
    scenario: String,
    games: Vec<GameRecord>,
    wins: [usize; 2],
    undecided: usize,
    avg_moves: f32,
    avg_medals: [f32; 2],
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run simulate command
///
/// 1. Load the scenario
/// 2. Play the games in parallel
/// 3. Report results
pub fn run(args: SimulateArgs, seed: Option<u64>) -> Result<()> {
    let scenario = load_scenario(&args)?;

    tracing::info!(
        "Simulating {} games of '{}' ({:?} policy)",
        args.games,
        scenario.name,
        args.policy
    );

    let results = play_games(&scenario, &args, seed)?;

    report_results(&results, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn load_scenario(args: &SimulateArgs) -> Result<Scenario> {
    match &args.scenario {
        Some(path) => Scenario::load(path),
        None => Ok(Scenario::default()),
    }
}

/// Play all games; each worker builds its own state since dice are not shared across threads
fn play_games(
    scenario: &Scenario,
    args: &SimulateArgs,
    seed: Option<u64>,
) -> Result<SimulationResults> {
    let base_seed = seed.unwrap_or(42);

    let games = (0..args.games)
        .into_par_iter()
        .map(|index| {
            let game_seed = base_seed.wrapping_add(index as u64);
            play_single_game(scenario, index + 1, args, game_seed)
        })
        .collect::<Result<Vec<_>>>()?;

    for record in &games {
        tracing::debug!(
            "Game {}: {:?} after {} moves",
            record.game_number,
            record.result,
            record.moves
        );
    }

    Ok(compute_statistics(scenario.name.clone(), games))
}

fn report_results(results: &SimulationResults, args: &SimulateArgs) {
    if args.json {
        print_json_results(results);
    } else {
        print_text_results(results);
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

fn play_single_game(
    scenario: &Scenario,
    game_number: usize,
    args: &SimulateArgs,
    seed: u64,
) -> Result<GameRecord> {
    let mut state = scenario
        .to_game_state(SharedDice::seeded(seed))
        .with_context(|| format!("setting up game {game_number}"))?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0x5eed);
    let mut moves = 0;

    while state.result() == GameResult::Ongoing && moves < args.max_moves {
        let Some(mv) = choose_move(&state, args.policy, &mut rng) else {
            break;
        };
        state
            .execute_move(&mv)
            .with_context(|| format!("game {game_number}, move {moves}: {mv:?}"))?;
        moves += 1;
    }

    Ok(GameRecord {
        game_number,
        result: state.result(),
        moves,
        medals: Side::BOTH.map(|side| state.medals(side).len()),
    })
}

fn choose_move(state: &GameState, policy: Policy, rng: &mut ChaCha8Rng) -> Option<Move> {
    let moves = state.legal_moves();
    if policy == Policy::Greedy {
        let best = moves
            .iter()
            .filter_map(|mv| expected_hits(state, mv).ok().map(|hits| (mv, hits)))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((mv, _)) = best {
            return Some(*mv);
        }
    }
    moves.choose(rng).copied()
}

fn compute_statistics(scenario: String, games: Vec<GameRecord>) -> SimulationResults {
    let mut wins = [0; 2];
    let mut undecided = 0;
    for game in &games {
        match game.result {
            GameResult::Victory(side) => wins[side.index()] += 1,
            GameResult::Ongoing => undecided += 1,
        }
    }

    let count = games.len().max(1) as f32;
    let avg_moves = games.iter().map(|g| g.moves).sum::<usize>() as f32 / count;
    let avg_medals =
        [0, 1].map(|i| games.iter().map(|g| g.medals[i]).sum::<usize>() as f32 / count);

    SimulationResults {
        scenario,
        games,
        wins,
        undecided,
        avg_moves,
        avg_medals,
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

fn print_json_results(results: &SimulationResults) {
    #[derive(serde::Serialize)]
    struct JsonGame {
        game_number: usize,
        result: String,
        moves: usize,
        allied_medals: usize,
        axis_medals: usize,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        scenario: String,
        total_games: usize,
        allied_wins: usize,
        axis_wins: usize,
        undecided: usize,
        avg_moves: f32,
        avg_allied_medals: f32,
        avg_axis_medals: f32,
        games: Vec<JsonGame>,
    }

    let output = JsonOutput {
        scenario: results.scenario.clone(),
        total_games: results.games.len(),
        allied_wins: results.wins[Side::Allies.index()],
        axis_wins: results.wins[Side::Axis.index()],
        undecided: results.undecided,
        avg_moves: results.avg_moves,
        avg_allied_medals: results.avg_medals[Side::Allies.index()],
        avg_axis_medals: results.avg_medals[Side::Axis.index()],
        games: results
            .games
            .iter()
            .map(|g| JsonGame {
                game_number: g.game_number,
                result: format_result(g.result),
                moves: g.moves,
                allied_medals: g.medals[Side::Allies.index()],
                axis_medals: g.medals[Side::Axis.index()],
            })
            .collect(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

fn print_text_results(results: &SimulationResults) {
    let total = results.games.len();

    println!("\n=== Simulation: {} ===", results.scenario);
    println!("Total games: {}", total);
    for side in Side::BOTH {
        let wins = results.wins[side.index()];
        println!(
            "{:<7} wins: {} ({:.1}%), avg medals {:.2}",
            side.to_string(),
            wins,
            percentage(wins, total),
            results.avg_medals[side.index()]
        );
    }
    println!("Undecided:    {}", results.undecided);
    println!("Avg moves:    {:.1}", results.avg_moves);
}

fn format_result(result: GameResult) -> String {
    match result {
        GameResult::Victory(side) => format!("{side} victory"),
        GameResult::Ongoing => "undecided".to_string(),
    }
}

fn percentage(part: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        part as f32 * 100.0 / total as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(games: usize, policy: Policy) -> SimulateArgs {
        SimulateArgs {
            scenario: None,
            games,
            max_moves: 400,
            policy,
            json: false,
        }
    }

    #[test]
    fn test_games_are_reproducible() {
        let scenario = Scenario::default();
        let first = play_single_game(&scenario, 1, &args(1, Policy::Random), 7).unwrap();
        let second = play_single_game(&scenario, 1, &args(1, Policy::Random), 7).unwrap();
        assert_eq!(first.moves, second.moves);
        assert_eq!(first.result, second.result);
        assert_eq!(first.medals, second.medals);
    }

    #[test]
    fn test_statistics() {
        let games = vec![
            GameRecord {
                game_number: 1,
                result: GameResult::Victory(Side::Axis),
                moves: 10,
                medals: [2, 6],
            },
            GameRecord {
                game_number: 2,
                result: GameResult::Ongoing,
                moves: 30,
                medals: [1, 1],
            },
        ];
        let stats = compute_statistics("test".to_string(), games);
        assert_eq!(stats.wins, [0, 1]);
        assert_eq!(stats.undecided, 1);
        assert_eq!(stats.avg_moves, 20.0);
        assert_eq!(stats.avg_medals, [1.5, 3.5]);
    }

    #[test]
    fn test_greedy_games_finish_without_errors() {
        let scenario = Scenario::default();
        let results = play_games(&scenario, &args(4, Policy::Greedy), Some(3)).unwrap();
        assert_eq!(results.games.len(), 4);
        assert!(results.games.iter().all(|g| g.moves <= 400));
    }
}
