use std::time::Instant;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use search_2048::engine;
use search_2048::game::{GameEngine, GameOutcome};
use search_2048::heuristic::{self, Heuristic};
use search_2048::search::{Expectimax, Minimax, RandomTrials, Strategy, DEFAULT_TRIALS};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyKind {
    Expectimax,
    Minimax,
    RandomTrials,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HeuristicKind {
    Score,
    Merge,
    Corner,
    WallGap,
    FullWall,
    StrictWall,
    SkewedCorner,
    Monotonicity,
}

impl From<HeuristicKind> for Heuristic {
    fn from(kind: HeuristicKind) -> Self {
        match kind {
            HeuristicKind::Score => Heuristic::Score,
            HeuristicKind::Merge => Heuristic::Merge,
            HeuristicKind::Corner => Heuristic::Corner,
            HeuristicKind::WallGap => Heuristic::WallGap,
            HeuristicKind::FullWall => Heuristic::FullWall,
            HeuristicKind::StrictWall => Heuristic::StrictWall,
            HeuristicKind::SkewedCorner => Heuristic::SkewedCorner,
            HeuristicKind::Monotonicity => Heuristic::Monotonicity,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "bench-2048", about = "Play many 2048 games with a search strategy and report results")]
struct Args {
    /// Search strategy to play with
    #[arg(long, value_enum, default_value_t = StrategyKind::Expectimax)]
    strategy: StrategyKind,

    /// Search depth in plies; 0 or below picks it per board, searching that much deeper
    /// (random-trials needs a positive depth)
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    depth: i32,

    /// Spawns sampled per move by random-trials
    #[arg(long, default_value_t = DEFAULT_TRIALS)]
    trials: u32,

    /// Board evaluator used at the leaves
    #[arg(long, value_enum, default_value_t = HeuristicKind::Corner)]
    heuristic: HeuristicKind,

    /// Number of games to play
    #[arg(long, default_value_t = 100)]
    games: u64,

    /// Seed of the first game; game i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Worker threads (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Suppress the progress bar
    #[arg(long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    engine::warm();
    heuristic::warm();

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = args.threads {
        builder = builder.num_threads(n);
    }
    let pool = builder.build().context("building worker pool")?;

    let start = Instant::now();
    let heuristic = Heuristic::from(args.heuristic);
    let outcomes = pool.install(|| match args.strategy {
        StrategyKind::Expectimax => run(Expectimax::new(args.depth, heuristic), &args),
        StrategyKind::Minimax => run(Minimax::new(args.depth, heuristic), &args),
        StrategyKind::RandomTrials => {
            anyhow::ensure!(args.depth > 0, "random-trials needs a positive --depth, got {}", args.depth);
            run(RandomTrials::new(args.depth as u32, args.trials, args.seed, heuristic), &args)
        }
    })?;
    report(&outcomes, start.elapsed().as_secs_f64());
    Ok(())
}

fn run<S>(strategy: S, args: &Args) -> anyhow::Result<Vec<GameOutcome>>
where
    S: Strategy + Clone + Send + Sync,
{
    let pb = if args.quiet { ProgressBar::hidden() } else { ProgressBar::new(args.games) };
    pb.set_style(ProgressStyle::with_template("{elapsed_precise} [{bar:40}] {pos}/{len} games ({eta})")?.progress_chars("=> "));
    log::info!(
        "playing {} games with {} at depth {} from seed {}",
        args.games,
        strategy.name(),
        args.depth,
        args.seed
    );

    let outcomes = (0..args.games)
        .into_par_iter()
        .map_init(
            || strategy.clone(),
            |worker, i| {
                let seed = args.seed.wrapping_add(i);
                let outcome = GameEngine::new(seed)
                    .play_one_game(worker)
                    .with_context(|| format!("game with seed {seed}"));
                pb.inc(1);
                outcome
            },
        )
        .collect::<anyhow::Result<Vec<_>>>()?;
    pb.finish_and_clear();
    Ok(outcomes)
}

fn report(outcomes: &[GameOutcome], elapsed: f64) {
    if outcomes.is_empty() {
        println!("No games played");
        return;
    }
    let games = outcomes.len() as f64;

    // reach[e]: games whose highest tile is exactly 2^e, then accumulated downward
    let mut reach = [0u64; 18];
    for o in outcomes {
        let top = o.board.highest_tile().trailing_zeros() as usize;
        reach[top.min(17)] += 1;
    }
    for e in (0..17).rev() {
        reach[e] += reach[e + 1];
    }
    for (e, &count) in reach.iter().enumerate().skip(3) {
        if count == 0 {
            break;
        }
        println!("{:>6}: {:6.2}%", 1u64 << e, 100.0 * count as f64 / games);
    }

    let total_score: u64 = outcomes.iter().map(GameOutcome::score).sum();
    let total_moves: u64 = outcomes.iter().map(GameOutcome::moves).sum();
    println!("Average score: {:.1}", total_score as f64 / games);
    println!("Total moves: {} | moves/sec: {:.1} | elapsed: {:.1}s", total_moves, total_moves as f64 / elapsed.max(1e-6), elapsed);
}
