// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Mall & Elo Simulation Suite - Runner
//
// Seedable ChaCha8Rng, optional Monte Carlo repetition, JSON/CSV results.
//
// Usage:
//   cargo run --release --bin simulate -- mall pricing.txt connectivity.txt budgets.txt
//   cargo run --release --bin simulate -- elo history.csv
//   cargo run --release --bin simulate -- --runs 30 --seed 42 mall ...
//   cargo run --release --bin simulate -- --config run.json --trials 10000 elo history.csv
//   cargo run --release --bin simulate -- --max-steps 100000 mall ...   # bound each buyer

mod output;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use log::LevelFilter;
use mall_elo_engine::config::EngineConfig;
use mall_elo_engine::report::{RatingsReport, WalkReport};
use mall_elo_engine::{loaders, monte_carlo, project_win_probabilities, EngineResult, MallSimulation, RatingEngine};

const USAGE: &str = "usage: simulate [--config FILE] [--seed N] [--runs N] [--trials N] [--max-steps N] \
[--out DIR] [--verbose] (mall PRICING CONNECTIVITY BUDGETS | elo HISTORY_CSV)";

// ─── CLI Parsing ────────────────────────────────────────────────────────────

#[derive(Default)]
struct CliArgs {
    config: Option<PathBuf>,
    seed: Option<u64>,
    runs: Option<usize>,
    trials: Option<u32>,
    max_steps: Option<u64>,
    out: Option<String>,
    verbose: bool,
    positional: Vec<String>,
    /// Flags whose value was missing or did not parse.
    invalid: Vec<String>,
}

enum Command {
    Mall { pricing: PathBuf, connectivity: PathBuf, budgets: PathBuf },
    Elo { history: PathBuf },
}

fn parse_args() -> CliArgs {
    parse_args_from(std::env::args().skip(1).collect())
}

fn parse_args_from(args: Vec<String>) -> CliArgs {
    let mut cli = CliArgs::default();

    let mut i = 0;
    while i < args.len() {
        let value = args.get(i + 1).map(String::as_str);
        match args[i].as_str() {
            "--config" => {
                cli.config = value.map(PathBuf::from);
                i += 1;
            }
            "--seed" => {
                cli.seed = parsed(&mut cli.invalid, "--seed", value);
                i += 1;
            }
            "--runs" => {
                cli.runs = parsed(&mut cli.invalid, "--runs", value);
                i += 1;
            }
            "--trials" => {
                cli.trials = parsed(&mut cli.invalid, "--trials", value);
                i += 1;
            }
            "--max-steps" => {
                cli.max_steps = parsed(&mut cli.invalid, "--max-steps", value);
                i += 1;
            }
            "--out" => {
                cli.out = value.map(str::to_string);
                i += 1;
            }
            "--verbose" | "-v" => {
                cli.verbose = true;
            }
            arg if !arg.starts_with('-') => {
                cli.positional.push(arg.to_string());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    cli
}

fn parsed<T: FromStr>(invalid: &mut Vec<String>, flag: &str, value: Option<&str>) -> Option<T> {
    let Some(raw) = value else {
        invalid.push(format!("{flag}: missing value"));
        return None;
    };
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            invalid.push(format!("{flag}: cannot parse {raw:?}"));
            None
        }
    }
}

fn command(positional: &[String]) -> Option<Command> {
    match positional {
        [cmd, pricing, connectivity, budgets] if cmd == "mall" => Some(Command::Mall {
            pricing: pricing.into(),
            connectivity: connectivity.into(),
            budgets: budgets.into(),
        }),
        [cmd, history] if cmd == "elo" => Some(Command::Elo { history: history.into() }),
        _ => None,
    }
}

fn init_logging(verbose: bool) {
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    if simplelog::TermLogger::init(level, config, simplelog::TerminalMode::Mixed, simplelog::ColorChoice::Auto).is_err() {
        eprintln!("logger already initialised");
    }
}

/// File config (or defaults), then CLI overrides on top.
fn resolve_config(cli: &CliArgs) -> EngineResult<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(runs) = cli.runs {
        config.runs = runs;
    }
    if let Some(trials) = cli.trials {
        config.trials = trials;
    }
    if cli.max_steps.is_some() {
        config.limits.max_steps_per_buyer = cli.max_steps;
    }
    if let Some(out) = &cli.out {
        config.output_dir = out.clone();
    }
    config.check()?;
    Ok(config)
}

// ─── Mall walk ──────────────────────────────────────────────────────────────

fn run_mall(config: &EngineConfig, pricing: &Path, connectivity: &Path, budgets: &Path) -> EngineResult<()> {
    let pricing = loaders::load_pricing(pricing)?;
    let edges = loaders::load_connectivity(connectivity)?;
    let budgets = loaders::load_budgets(budgets)?;
    let mut sim = MallSimulation::build(&pricing, &edges, &budgets)?.with_limits(config.limits);
    log::info!("loaded {} mall(s), {} edge(s), {} buyer(s)", sim.nodes().len(), edges.len(), budgets.len());

    let out_dir = Path::new(&config.output_dir);
    if config.runs == 1 {
        let outcome = sim.run(&mut monte_carlo::rng_for_run(config.seed, 0))?;
        let report = WalkReport::new(config.seed, &outcome);
        println!("\n  Total revenue: {}", report.total_revenue);
        println!("  {:<24} {:>16} {:>10}", "Mall", "Share", "Percent");
        println!("  {}", "-".repeat(52));
        for row in &report.shares {
            let pct = row.percent.map(|p| format!("{p}%")).unwrap_or_else(|| "n/a".into());
            println!("  {:<24} {:>16} {:>10}", row.node.to_string(), row.share.to_string(), pct);
        }
        output::write_json(out_dir, "walk", &report)?;
    } else {
        let (_, batch) = monte_carlo::run_walk_batch(&mut sim, config.runs, config.seed)?;
        println!("\n  {} runs, base seed {}", batch.n_runs, batch.base_seed);
        println!("  {:<24} {:>10} {:>10} {:>10}", "Mall", "Mean", "CI low", "CI high");
        println!("  {}", "-".repeat(58));
        for (node, stats) in &batch.node_share {
            println!(
                "  {:<24} {:>10.4} {:>10.4} {:>10.4}",
                node.to_string(),
                stats.mean,
                stats.ci_lower,
                stats.ci_upper
            );
        }
        output::write_json(out_dir, "walk-batch", &batch)?;
    }
    Ok(())
}

// ─── Ratings & projection ───────────────────────────────────────────────────

fn run_elo(config: &EngineConfig, history: &Path) -> EngineResult<()> {
    let history = loaders::load_matches(history)?;
    let mut engine = RatingEngine::new(config.elo);
    engine.apply_history(&history);
    let ratings = engine.ratings();

    let projection = project_win_probabilities(ratings, config.trials, &mut monte_carlo::rng_for_run(config.seed, 0))?;
    println!("\n  {:<8} {:>10} {:>10}", "Player", "Rating", "P(title)");
    println!("  {}", "-".repeat(30));
    for (player, rating) in ratings.ranked() {
        println!("  {:<8} {:>10.2} {:>10.4}", player.to_string(), rating, projection.get(player));
    }

    let out_dir = Path::new(&config.output_dir);
    output::write_text(out_dir, "win_probabilities.csv", &projection.to_csv())?;
    output::write_json(out_dir, "ratings", &RatingsReport::new(history.len(), ratings, Some(projection)))?;

    if config.runs > 1 {
        let (_, batch) = monte_carlo::run_projection_batch(ratings, config.trials, config.runs, config.seed)?;
        output::write_json(out_dir, "projection-batch", &batch)?;
    }
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    let cli = parse_args();
    init_logging(cli.verbose);
    if !cli.invalid.is_empty() {
        for problem in &cli.invalid {
            log::error!("{problem}");
        }
        eprintln!("{USAGE}");
        std::process::exit(1);
    }

    let Some(command) = command(&cli.positional) else {
        eprintln!("{USAGE}");
        std::process::exit(1);
    };

    let started = Instant::now();
    let result = resolve_config(&cli).and_then(|config| match &command {
        Command::Mall { pricing, connectivity, budgets } => run_mall(&config, pricing, connectivity, budgets),
        Command::Elo { history } => run_elo(&config, history),
    });

    match result {
        Ok(()) => log::info!("finished in {:.1?}", started.elapsed()),
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    }
}
