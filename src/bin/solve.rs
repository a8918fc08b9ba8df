//! Blueprint solver binary for Kuhn and Leduc poker.
//!
//! Usage:
//!   cargo run --release --bin solve -- [OPTIONS]
//!
//! Options:
//!   --game <NAME>        kuhn or leduc (default: kuhn)
//!   --players <N>        Number of players (default: 2)
//!   --config <FILE>      Game configuration JSON file (overrides --game)
//!   --algorithm <NAME>   vanilla or mccfr (default: mccfr)
//!   --iterations <N>     Training iterations (default: 100000)
//!   --seed <N>           Random seed (optional)
//!   --output <FILE>      Save the strategy table as JSON (optional)

use std::env;
use std::process;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use cfr_search::cfr::{
    expected_utility, exploitability, MccfrConfig, MonteCarloCfr, StrategyTable, TrainingReport,
    Unexplored, VanillaCfr,
};
use cfr_search::error::Result;
use cfr_search::games::{GameConfig, PokerGame};

/// Progress bar in the style used across the training binaries.
fn progress(n: u64) -> ProgressBar {
    let bar = ProgressBar::new(n);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {elapsed} @ {per_sec:>12} {wide_bar:.cyan}")
    {
        bar.set_style(style);
    }
    bar
}

fn print_usage() {
    println!("Usage: solve [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --game <NAME>        kuhn or leduc (default: kuhn)");
    println!("  --players <N>        Number of players (default: 2)");
    println!("  --config <FILE>      Game configuration JSON file");
    println!("  --algorithm <NAME>   vanilla or mccfr (default: mccfr)");
    println!("  --iterations <N>     Training iterations (default: 100000)");
    println!("  --seed <N>           Random seed");
    println!("  --output <FILE>      Save the strategy table as JSON");
}

struct Args {
    game: String,
    players: usize,
    config_file: Option<String>,
    algorithm: String,
    iterations: u64,
    seed: Option<u64>,
    output: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args {
        game: "kuhn".to_string(),
        players: 2,
        config_file: None,
        algorithm: "mccfr".to_string(),
        iterations: 100_000,
        seed: None,
        output: None,
    };

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).cloned();
        match args[i].as_str() {
            "--game" | "-g" => {
                if let Some(v) = value {
                    parsed.game = v;
                }
                i += 1;
            }
            "--players" | "-p" => {
                parsed.players = value.and_then(|v| v.parse().ok()).unwrap_or(2);
                i += 1;
            }
            "--config" | "-c" => {
                parsed.config_file = value;
                i += 1;
            }
            "--algorithm" | "-a" => {
                if let Some(v) = value {
                    parsed.algorithm = v;
                }
                i += 1;
            }
            "--iterations" | "-i" => {
                parsed.iterations = value.and_then(|v| v.parse().ok()).unwrap_or(100_000);
                i += 1;
            }
            "--seed" | "-s" => {
                parsed.seed = value.and_then(|v| v.parse().ok());
                i += 1;
            }
            "--output" | "-o" => {
                parsed.output = value;
                i += 1;
            }
            "--help" | "-h" => {
                print_usage();
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }
    parsed
}

fn build_game(args: &Args) -> Result<PokerGame> {
    if let Some(path) = &args.config_file {
        println!("Loading game configuration from: {}", path);
        return Ok(PokerGame::from_config(GameConfig::from_json_file(path)?)?);
    }
    match args.game.as_str() {
        "leduc" => Ok(PokerGame::from_config(GameConfig::leduc(args.players))?),
        _ => Ok(PokerGame::from_config(GameConfig::kuhn(args.players))?),
    }
}

fn train(game: &PokerGame, args: &Args) -> Result<StrategyTable> {
    let bar = progress(args.iterations);
    let step = (args.iterations / 100).max(1);

    let table = if args.algorithm == "vanilla" {
        let mut solver = VanillaCfr::new(game.clone(), args.seed);
        let mut done = 0;
        while done < args.iterations {
            let chunk = step.min(args.iterations - done);
            solver.train(chunk)?;
            done += chunk;
            bar.set_position(done);
        }
        solver.into_table()
    } else {
        let mut config = MccfrConfig::default();
        if let Some(seed) = args.seed {
            config = config.with_seed(seed);
        }
        let mut solver = MonteCarloCfr::new(game.clone(), config)?;
        solver.train_with_callback(args.iterations, step, |stats| bar.set_position(stats.iterations))?;
        solver.into_table()
    };

    bar.finish_and_clear();
    Ok(table)
}

fn run(args: Args) -> Result<()> {
    let game = build_game(&args)?;

    println!("=================================================");
    println!("  CFR Blueprint Solver");
    println!("=================================================");
    println!();
    println!("Game: {:?} ({} players)", game.config().variant, game.num_players());
    println!("Algorithm: {}", args.algorithm);
    println!("Iterations: {}", args.iterations);
    if let Some(seed) = args.seed {
        println!("Seed: {}", seed);
    }
    println!();

    let start = Instant::now();
    let table = train(&game, &args)?;
    info!("training finished in {:.2}s", start.elapsed().as_secs_f64());

    let utility = expected_utility(&game, &table, Unexplored::Uniform)?;
    let exploit = exploitability(&game, &table, Unexplored::Uniform)?;
    println!("Info sets: {}", table.num_info_sets());
    println!("Time: {:.2}s", start.elapsed().as_secs_f64());
    println!("Expected utility: {:?}", utility);
    println!("Exploitability: {:.6}", exploit);

    let report = TrainingReport::from_table(&table, utility);
    for (player, lines) in report.strategies.iter().enumerate() {
        println!();
        println!("=== Player {} ===", player);
        for (key, strategy) in lines {
            let probs: Vec<String> = strategy
                .iter()
                .map(|(action, p)| format!("{}: {:.3}", action, p))
                .collect();
            println!("{:<16} {}", key, probs.join(", "));
        }
    }

    if let Some(path) = &args.output {
        table.save_json(path)?;
        println!();
        println!("Strategy table saved to {}", path);
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let args = parse_args();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
