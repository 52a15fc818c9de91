//! A thin harness for propagator unit tests: the handful of calls a test in
//! `propagators/` actually needs, instead of driving
//! [`ConstraintSatisfactionSolver`] directly at every call site.

use crate::basic_types::PropagationStatusCP;
use crate::engine::constraint_satisfaction_solver::ConstraintSatisfactionSolver;
use crate::engine::cp::propagation::Propagator;
use crate::variables::{DomainId, GraphVariable, IntegerVariable};

#[derive(Default)]
pub(crate) struct TestSolver {
    solver: ConstraintSatisfactionSolver,
}

impl TestSolver {
    pub(crate) fn new_variable(&mut self, lb: i32, ub: i32) -> DomainId {
        self.solver.new_bounded_variable(lb, ub).expect("valid bounds")
    }

    pub(crate) fn new_graph_variable(&mut self, directed: bool, num_nodes: usize) -> GraphVariable {
        self.solver.new_graph_variable(directed, num_nodes).expect("valid graph")
    }

    pub(crate) fn new_propagator(&mut self, propagator: impl Propagator + 'static) -> PropagationStatusCP {
        self.solver.post_propagator(propagator)?;
        self.solver.propagate_to_fixpoint()
    }

    pub(crate) fn assert_bounds(&self, var: impl IntegerVariable, lb: i32, ub: i32) {
        assert_eq!(var.lower_bound(self.solver.assignments()), lb, "lower bound mismatch");
        assert_eq!(var.upper_bound(self.solver.assignments()), ub, "upper bound mismatch");
    }

    pub(crate) fn solver(&mut self) -> &mut ConstraintSatisfactionSolver {
        &mut self.solver
    }
}
