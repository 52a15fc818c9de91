//! Owned snapshots of a solved state, decoupled from the solver's reversible
//! storage so a solution survives the backtracking that follows it.

use crate::basic_types::SolutionReference;
use crate::engine::cp::graph::GraphId;
use crate::optimisation::OptimisationStrategy;
use crate::Solver;

/// One posted graph variable's fixed value: every node and arc the solution
/// placed in the kernel.
#[derive(Debug, Clone, Default)]
pub struct GraphAssignment {
    pub nodes: Vec<usize>,
    pub arcs: Vec<(usize, usize)>,
}

/// An owned copy of every variable's value at the point a solution was
/// found. Cheap to keep around across further search since it holds no
/// reference into the solver's trail.
#[derive(Debug, Clone, Default)]
pub struct Solution {
    int_values: Vec<i32>,
    graphs: Vec<GraphAssignment>,
}

impl Solution {
    pub fn int_value(&self, index: usize) -> i32 {
        self.int_values[index]
    }

    pub fn graph(&self, id: GraphId) -> &GraphAssignment {
        &self.graphs[id.index()]
    }

    /// A cheap self-reference, matching the kernel crate's convention of
    /// passing solutions around as a reference rather than by value.
    pub fn as_reference(&self) -> &Solution {
        self
    }
}

impl<'a> From<SolutionReference<'a>> for Solution {
    fn from(reference: SolutionReference<'a>) -> Self {
        let assignments = reference.assignments();
        let graph_store = reference.graph();

        let int_values = (0..assignments.num_variables())
            .map(|index| assignments.lower_bound(crate::variables::DomainId::new(index as u32)))
            .collect();

        let graphs = (0..graph_store.num_graphs())
            .map(|index| {
                let id = GraphId::new(index as u32);
                let nodes = graph_store.kernel_nodes(id).collect::<Vec<_>>();
                let arcs = nodes
                    .iter()
                    .flat_map(|&u| graph_store.kernel_successors(id, u).map(move |v| (u, v)))
                    .collect();
                GraphAssignment { nodes, arcs }
            })
            .collect();

        Solution { int_values, graphs }
    }
}

/// Passed to the user-supplied solution callback.
pub struct SolutionCallbackArguments<'a> {
    pub solver: &'a Solver,
    pub solution: &'a Solution,
    pub objective_value: Option<i64>,
}

impl<'a> SolutionCallbackArguments<'a> {
    pub fn new(solver: &'a Solver, solution: &'a Solution, objective_value: Option<i64>) -> Self {
        SolutionCallbackArguments {
            solver,
            solution,
            objective_value,
        }
    }
}

/// The outcome of [`crate::optimisation::OptimisationProcedure::minimise`].
#[derive(Debug, Clone)]
pub enum OptimisationResult {
    Optimal { solution: Solution, objective_value: i64 },
    Satisfiable { solution: Solution, objective_value: i64 },
    Unsatisfiable,
    Unknown,
}

/// The outcome of [`crate::Solver::find_solution`].
#[derive(Debug, Clone)]
pub enum SatisfactionResult {
    Satisfiable(Solution),
    Unsatisfiable,
    Unknown,
}

/// Records which [`OptimisationStrategy`] produced an [`OptimisationResult`],
/// surfaced in `--help`/logs by the CLI binary.
pub fn strategy_label(strategy: OptimisationStrategy) -> &'static str {
    match strategy {
        OptimisationStrategy::UpperBounding => "upper-bounding",
        OptimisationStrategy::LowerBounding => "lower-bounding",
        OptimisationStrategy::CoreGuided => "core-guided",
        OptimisationStrategy::LBBD => "lbbd",
    }
}
