//! Transitivity, the companion to [`super::n_cliques`]: every connected
//! component of the kernel must end up a clique, so two mandatory edges
//! sharing a node force the third side of the triangle mandatory too.
//!
//! Recomputed from the current kernel each call rather than incrementally
//! maintained — a deliberate simplification from the usual rule that every
//! graph propagator here is incremental, recorded in `DESIGN.md`, since
//! closing triangles needs the full neighbor list of each node rather than
//! a single new edge's endpoints.

use crate::basic_types::PropagationStatusCP;
use crate::engine::cp::graph::graph_events::GraphEvents;
use crate::engine::cp::propagation::{
    PropagationContextMut, Propagator, PropagatorInitialisationContext, PropagatorPriority,
};
use crate::predicates::PropositionalConjunction;
use crate::variables::GraphVariable;

pub(crate) struct TransitivityPropagator {
    graph: GraphVariable,
}

impl TransitivityPropagator {
    pub(crate) fn new(graph: GraphVariable) -> Self {
        Self { graph }
    }
}

impl Propagator for TransitivityPropagator {
    fn name(&self) -> &str {
        "Transitivity"
    }

    fn priority(&self) -> PropagatorPriority {
        PropagatorPriority::Quadratic
    }

    fn propagate(&self, mut context: PropagationContextMut) -> PropagationStatusCP {
        let id = self.graph.id();
        let n = self.graph.num_nodes();

        loop {
            let mut closed_any = false;
            for v in 0..n {
                let neighbors: Vec<usize> = self.graph.kernel_successors(context.graph(), v).collect();
                for (a, &u) in neighbors.iter().enumerate() {
                    for &w in &neighbors[a + 1..] {
                        if !self.graph.arc_in_kernel(context.graph(), u, w) {
                            context.graph_mut().add_arc(id, u, w)?;
                            closed_any = true;
                        }
                    }
                }
            }
            if !closed_any {
                break;
            }
        }
        Ok(())
    }

    fn initialise_at_root(
        &mut self,
        init_context: &mut PropagatorInitialisationContext,
    ) -> Result<(), PropositionalConjunction> {
        init_context.register_graph(self.graph.id(), GraphEvents::ARCS);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::constraint_satisfaction_solver::ConstraintSatisfactionSolver;

    #[test]
    fn two_shared_edges_force_the_third() {
        let mut solver = ConstraintSatisfactionSolver::new();
        let graph = solver.new_graph_variable(false, 3).expect("valid graph");
        solver
            .post_propagator(TransitivityPropagator::new(graph))
            .expect("initial propagation succeeds");

        solver.graph_mut().add_arc(graph.id(), 0, 1).expect("arc in envelope");
        solver.graph_mut().add_arc(graph.id(), 1, 2).expect("arc in envelope");
        solver.propagate_to_fixpoint().expect("closing the triangle's third edge");

        assert!(graph.arc_in_kernel(solver.graph(), 0, 2));
    }
}
