//! A small command-line front end over [`graphcp::Solver`]: builds a
//! synthetic symmetric TSP instance of the requested size and reports the
//! optimal tour found.
//!
//! This binary intentionally has no model-DSL/instance-file input: a
//! generic DZN-style front end is out of scope for this crate (see
//! `DESIGN.md`), so the instance lives entirely in command-line flags.

use std::time::Duration;

use clap::Parser;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use graphcp::branching::FirstFailBrancher;
use graphcp::engine::solver_config::{HeldKarpMode, HeldKarpWarmStart, RoundingMode, SolverConfig};
use graphcp::optimisation::OptimisationStrategy;
use graphcp::results::OptimisationResult;
use graphcp::Solver;

/// Solves a randomly generated symmetric travelling-salesman instance.
#[derive(Debug, Parser)]
#[command(name = "munchkin_graph", version, about)]
struct Cli {
    /// Number of cities in the generated instance.
    #[arg(long, default_value_t = 6)]
    nodes: usize,

    /// Seed for the synthetic distance matrix (deterministic given a seed).
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Largest edge weight the generator draws.
    #[arg(long, default_value_t = 20)]
    max_weight: i32,

    /// Whether/when the Held-Karp relaxation participates in propagation:
    /// `off`, `from-root`, or only `after-first-solution`.
    #[arg(long, value_enum, default_value_t = HeldKarpMode::default())]
    hk_mode: HeldKarpMode,

    /// Whether Held-Karp's Lagrangian multipliers warm-start from the
    /// previous call (`fast`) or reset to zero each time (`general`).
    #[arg(long, value_enum, default_value_t = HeldKarpWarmStart::default())]
    hk_warm_start: HeldKarpWarmStart,

    /// Held-Karp bound rounding mode.
    #[arg(long, value_enum, default_value_t = RoundingMode::default())]
    rounding_mode: RoundingMode,

    /// Which optimisation procedure drives the search.
    #[arg(long, value_enum, default_value_t = OptimisationStrategy::default())]
    optimisation_strategy: OptimisationStrategy,

    /// Also posts the redundant all-different flow propagator over the
    /// per-node successor variables; this binary has no such variables, so
    /// the flag only demonstrates config wiring.
    #[arg(long, default_value_t = false)]
    alldiff_ac: bool,

    /// Wall-clock search budget in milliseconds.
    #[arg(long)]
    time_limit_ms: Option<u64>,

    /// Maximum number of failed branches before giving up.
    #[arg(long)]
    fail_limit: Option<u64>,
}

fn random_symmetric_weights(nodes: usize, max_weight: i32, seed: u64) -> Vec<Vec<i32>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut weights = vec![vec![0; nodes]; nodes];
    for i in 0..nodes {
        for j in (i + 1)..nodes {
            let w = rng.gen_range(1..=max_weight);
            weights[i][j] = w;
            weights[j][i] = w;
        }
    }
    weights
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.nodes < 3 {
        anyhow::bail!("a Hamiltonian cycle needs at least 3 nodes, got {}", cli.nodes);
    }

    let weights = random_symmetric_weights(cli.nodes, cli.max_weight, cli.seed);
    let upper_bound: i32 = weights.iter().flatten().sum::<i32>().max(1);

    let config = SolverConfig {
        hk_mode: cli.hk_mode,
        hk_warm_start: cli.hk_warm_start,
        alldiff_ac: cli.alldiff_ac,
        time_limit: cli.time_limit_ms.map(Duration::from_millis),
        fail_limit: cli.fail_limit,
        solution_limit: None,
        restart_on_solution: false,
        rounding_mode: cli.rounding_mode,
        optimisation_strategy: cli.optimisation_strategy,
    };

    let mut solver = Solver::new(config);
    let graph = solver.graph_var(cli.nodes, false)?;
    let cost = solver.int_var(0, upper_bound)?;
    solver.tsp(graph, cost, weights)?;

    let mut brancher = FirstFailBrancher;
    match solver.find_optimal(&mut brancher, cost, false) {
        OptimisationResult::Optimal { objective_value, .. } => {
            solver.log_statistics_with_objective(objective_value);
            println!("optimal tour cost: {objective_value}");
        }
        OptimisationResult::Satisfiable { objective_value, .. } => {
            println!("best tour found before stopping: {objective_value}");
        }
        OptimisationResult::Unsatisfiable => {
            println!("instance has no feasible tour");
        }
        OptimisationResult::Unknown => {
            println!("search stopped before any solution was found");
        }
    }

    Ok(())
}
