//! Branching strategies: a [`Brancher`] picks the next variable/value split,
//! the search loop applies it and (on failure) its negation.

use crate::engine::cp::graph::GraphId;
use crate::engine::constraint_satisfaction_solver::ConstraintSatisfactionSolver;
use crate::results::Solution;
use crate::variables::DomainId;

/// One branch point. Graph variables only ever branch on a single
/// candidate arc: nodes reachable from an arc are covered transitively by
/// propagation, so branching on arcs alone is complete for the constraints
/// this crate posts.
#[derive(Debug, Clone, Copy)]
pub enum Decision {
    FixInt { var: DomainId, value: i32 },
    ExcludeInt { var: DomainId, value: i32 },
    IncludeArc { graph: GraphId, from: usize, to: usize },
    ExcludeArc { graph: GraphId, from: usize, to: usize },
}

impl Decision {
    /// The decision the search loop applies after this one fails, on its
    /// way back up the search tree.
    pub fn negate(self) -> Decision {
        match self {
            Decision::FixInt { var, value } => Decision::ExcludeInt { var, value },
            Decision::ExcludeInt { var, value } => Decision::FixInt { var, value },
            Decision::IncludeArc { graph, from, to } => Decision::ExcludeArc { graph, from, to },
            Decision::ExcludeArc { graph, from, to } => Decision::IncludeArc { graph, from, to },
        }
    }
}

pub trait Brancher {
    /// Returns `None` once every variable is fixed (a solution).
    fn next_decision(&mut self, solver: &ConstraintSatisfactionSolver) -> Option<Decision>;

    /// Called once per solution found; the default no-op matches branchers
    /// with no solution-dependent state (e.g. static variable orderings).
    fn on_solution(&mut self, _solution: &Solution) {}
}

/// Smallest-arc-first over every posted graph variable, falling back to
/// smallest-domain-first over integer variables once every graph variable
/// is fixed. A reasonable default without being the only possible
/// [`Brancher`]; model authors can supply their own.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFailBrancher;

impl Brancher for FirstFailBrancher {
    fn next_decision(&mut self, solver: &ConstraintSatisfactionSolver) -> Option<Decision> {
        let graph = solver.graph();
        for graph_index in 0..graph.num_graphs() {
            let id = GraphId::new(graph_index as u32);
            let n = graph.num_nodes(id);
            for from in 0..n {
                for to in graph.envelope_successors(id, from).collect::<Vec<_>>() {
                    if !graph.arc_in_kernel(id, from, to) {
                        return Some(Decision::IncludeArc { graph: id, from, to });
                    }
                }
            }
        }

        let assignments = solver.assignments();
        (0..assignments.num_variables())
            .map(|index| DomainId::new(index as u32))
            .find(|&var| !assignments.is_fixed(var))
            .map(|var| Decision::FixInt {
                var,
                value: assignments.lower_bound(var),
            })
    }
}
