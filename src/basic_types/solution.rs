use crate::engine::cp::assignments_integer::AssignmentsInteger;
use crate::engine::cp::graph::assignments_graph::AssignmentsGraph;

/// A borrowed view onto a fully-assigned solver state, handed to
/// [`crate::branching::Brancher::on_solution`] and the solution callback
/// without cloning the underlying domains.
#[derive(Clone, Copy)]
pub struct SolutionReference<'a> {
    assignments: &'a AssignmentsInteger,
    graph: &'a AssignmentsGraph,
}

impl<'a> SolutionReference<'a> {
    pub fn new(assignments: &'a AssignmentsInteger, graph: &'a AssignmentsGraph) -> Self {
        SolutionReference { assignments, graph }
    }

    pub fn assignments(&self) -> &'a AssignmentsInteger {
        self.assignments
    }

    pub fn graph(&self) -> &'a AssignmentsGraph {
        self.graph
    }
}
