//! Core result and error types shared across the engine.
//!
//! [`Inconsistency`] is the distinguished failure value threaded through every
//! domain mutator and every [`crate::engine::cp::propagation::Propagator`].
//! It is never an `Err` in the `std::error::Error` sense: the search loop is
//! the sole catcher, using it purely for control flow.

use std::fmt;

use crate::predicates::PropositionalConjunction;

mod csp_solver_execution_flag;
mod solution;

pub use csp_solver_execution_flag::CSPSolverExecutionFlag;
pub use solution::SolutionReference;

/// A short reason tag attached to a contradiction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// Domain emptied entirely.
    EmptyDomain,
    /// Lower bound crossed the upper bound.
    Low,
    /// Upper bound crossed the lower bound.
    Upp,
    /// Instantiation to a value outside the domain.
    Inst,
    /// Removal of a value that closes off every remaining possibility.
    Remove,
    /// Catch-all for propagator-specific contradictions.
    Unknown,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ConflictReason::EmptyDomain => "MSG_EMPTY",
            ConflictReason::Low => "MSG_LOW",
            ConflictReason::Upp => "MSG_UPP",
            ConflictReason::Inst => "MSG_INST",
            ConflictReason::Remove => "MSG_REMOVE",
            ConflictReason::Unknown => "MSG_UNKNOWN",
        };
        write!(f, "{tag}")
    }
}

/// The expected, locally-recoverable failure of propagation.
///
/// Carries the conjunction of literals which explain why the domain became
/// empty; with explanations disabled this is simply the empty conjunction.
#[derive(Debug, Clone, Default)]
pub struct Inconsistency {
    pub reason: PropositionalConjunction,
}

impl Inconsistency {
    pub fn new(reason: PropositionalConjunction) -> Self {
        Self { reason }
    }
}

impl From<PropositionalConjunction> for Inconsistency {
    fn from(reason: PropositionalConjunction) -> Self {
        Inconsistency::new(reason)
    }
}

/// The result type returned by every propagator call and every domain
/// mutator.
pub type PropagationStatusCP = Result<(), Inconsistency>;

/// Misuse of the model-facing API.
///
/// Surfaced immediately; search is never started when this is raised.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("propagator for constraint `{0}` was posted more than once")]
    DuplicatePost(String),
    #[error("domain bounds are invalid: lower bound {lb} exceeds upper bound {ub}")]
    InvalidBounds { lb: i32, ub: i32 },
    #[error("enumerated domain must contain at least one value")]
    EmptyEnumeratedDomain,
    #[error("graph variable requires at least one node")]
    EmptyGraph,
    #[error("node index {index} is out of range for a graph with {n} nodes")]
    NodeOutOfRange { index: usize, n: usize },
    #[error("constraint `{0}` is infeasible at post time")]
    InfeasibleAtPost(String),
}

/// A fatal, unrecoverable defect in the engine itself. Never caused by a
/// well-formed model; always a bug.
#[derive(Debug, thiserror::Error)]
pub enum InvariantViolation {
    #[error("reversible cell was written in world {written_world} but trail is at world {current_world}")]
    TrailedInUnknownWorld {
        written_world: usize,
        current_world: usize,
    },
    #[error("propagator `{propagator}` mutated a variable it did not subscribe to")]
    UnsubscribedMutation { propagator: String },
    #[error("graph variable kernel is not a subset of its envelope")]
    KernelEnvelopeDivergence,
}
