//! Solver-wide configuration, separated from the per-call options a
//! propagator or the CLI binary exposes.

use std::fmt::Display;
use std::time::Duration;

use clap::ValueEnum;

use crate::optimisation::OptimisationStrategy;

/// Spec §6.1/§6.4 `hk_mode`: when the Held-Karp one-tree relaxation
/// participates in propagation at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum HeldKarpMode {
    /// Held-Karp is never posted for `tsp`.
    Off,
    /// Held-Karp is posted and propagates from the root.
    #[default]
    FromRoot,
    /// Held-Karp is posted but stays passive until the first solution has
    /// been found, then propagates from then on — spec §4.8's closing
    /// sentence, meant to amortise its cost over a search that would
    /// otherwise pay for it on every node before a single solution exists.
    AfterFirstSolution,
}

impl Display for HeldKarpMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeldKarpMode::Off => write!(f, "off"),
            HeldKarpMode::FromRoot => write!(f, "from-root"),
            HeldKarpMode::AfterFirstSolution => write!(f, "after-first-solution"),
        }
    }
}

/// The spec §9 Open Question this crate resolves by switching on a field
/// rather than two trait implementations: whether Held-Karp's per-node
/// Lagrangian multipliers carry over between propagate calls (`Fast`) or
/// reset to zero each time (`General`). Distinct from [`HeldKarpMode`],
/// which governs *whether* Held-Karp runs at all, not how it warms up once
/// it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum HeldKarpWarmStart {
    /// Recomputes the minimum one-tree from scratch every call.
    #[default]
    General,
    /// Reuses the previous one-tree's Lagrangian multipliers as a warm
    /// start.
    Fast,
}

impl Display for HeldKarpWarmStart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeldKarpWarmStart::General => write!(f, "general"),
            HeldKarpWarmStart::Fast => write!(f, "fast"),
        }
    }
}

/// How a tight cost bound rounds a fractional Held-Karp lower bound before
/// comparing it against an integer domain. Spec §6.4 names all three of
/// `{FLOOR, ROUND, CEIL}`; `Round`'s only sound use as a *lower* bound is
/// when the fractional part is known to vanish at the optimum (its named
/// consumer, TSPLIB-style distance rounding, lives in an external instance
/// loader out of scope for this crate — see `DESIGN.md`), so `held_karp.rs`
/// only ever constructs this config with `Ceil`/`Floor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum RoundingMode {
    #[default]
    Ceil,
    Floor,
    Round,
}

impl Display for RoundingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundingMode::Ceil => write!(f, "ceil"),
            RoundingMode::Floor => write!(f, "floor"),
            RoundingMode::Round => write!(f, "round"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub hk_mode: HeldKarpMode,
    pub hk_warm_start: HeldKarpWarmStart,
    pub alldiff_ac: bool,
    pub time_limit: Option<Duration>,
    pub fail_limit: Option<u64>,
    pub solution_limit: Option<u64>,
    pub restart_on_solution: bool,
    pub rounding_mode: RoundingMode,
    pub optimisation_strategy: OptimisationStrategy,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            hk_mode: HeldKarpMode::default(),
            hk_warm_start: HeldKarpWarmStart::default(),
            alldiff_ac: false,
            time_limit: None,
            fail_limit: None,
            solution_limit: None,
            restart_on_solution: false,
            rounding_mode: RoundingMode::default(),
            optimisation_strategy: OptimisationStrategy::default(),
        }
    }
}
