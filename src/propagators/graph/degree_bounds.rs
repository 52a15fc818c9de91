//! Degree bounds: every node's kernel-degree must land in
//! `[dmin(i), dmax(i)]`.
//!
//! Filtering: once a node's mandatory-neighbor count reaches `dmax`, every
//! remaining possible-but-not-mandatory incident arc is removed from the
//! envelope; once its possible-neighbor count falls to `dmin`, every
//! remaining possible arc is promoted to the kernel. Either count crossing
//! its bound is a contradiction.

use crate::basic_types::PropagationStatusCP;
use crate::conjunction;
use crate::engine::cp::graph::graph_events::GraphEvents;
use crate::engine::cp::propagation::{
    PropagationContextMut, Propagator, PropagatorInitialisationContext, PropagatorPriority,
};
use crate::predicates::PropositionalConjunction;
use crate::variables::GraphVariable;

pub(crate) struct DegreeBoundsPropagator {
    graph: GraphVariable,
    dmin: Box<[usize]>,
    dmax: Box<[usize]>,
}

impl DegreeBoundsPropagator {
    pub(crate) fn new(graph: GraphVariable, dmin: Box<[usize]>, dmax: Box<[usize]>) -> Self {
        assert_eq!(dmin.len(), graph.num_nodes());
        assert_eq!(dmax.len(), graph.num_nodes());
        Self { graph, dmin, dmax }
    }
}

impl Propagator for DegreeBoundsPropagator {
    fn name(&self) -> &str {
        "DegreeBounds"
    }

    fn priority(&self) -> PropagatorPriority {
        PropagatorPriority::Unary
    }

    fn propagate(&self, mut context: PropagationContextMut) -> PropagationStatusCP {
        let id = self.graph.id();
        for node in 0..self.graph.num_nodes() {
            if !self.graph.node_in_envelope(context.graph(), node) {
                continue;
            }
            let kernel_degree = self.graph.kernel_successors(context.graph(), node).count();
            let envelope_degree = self.graph.envelope_successors(context.graph(), node).count();

            if kernel_degree > self.dmax[node] || envelope_degree < self.dmin[node] {
                return Err(conjunction!().into());
            }

            if kernel_degree == self.dmax[node] && envelope_degree > kernel_degree {
                let free: Vec<usize> = self
                    .graph
                    .envelope_successors(context.graph(), node)
                    .filter(|&to| !self.graph.arc_in_kernel(context.graph(), node, to))
                    .collect();
                for to in free {
                    context.graph_mut().remove_arc(id, node, to)?;
                }
            } else if envelope_degree == self.dmin[node] && envelope_degree > kernel_degree {
                let free: Vec<usize> = self
                    .graph
                    .envelope_successors(context.graph(), node)
                    .filter(|&to| !self.graph.arc_in_kernel(context.graph(), node, to))
                    .collect();
                for to in free {
                    context.graph_mut().add_arc(id, node, to)?;
                }
            }
        }
        Ok(())
    }

    fn initialise_at_root(
        &mut self,
        init_context: &mut PropagatorInitialisationContext,
    ) -> Result<(), PropositionalConjunction> {
        init_context.register_graph(self.graph.id(), GraphEvents::ANY);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::constraint_satisfaction_solver::ConstraintSatisfactionSolver;

    #[test]
    fn saturated_kernel_prunes_envelope() {
        let mut solver = ConstraintSatisfactionSolver::new();
        let graph = solver.new_graph_variable(false, 4).expect("valid graph");

        solver
            .post_propagator(DegreeBoundsPropagator::new(
                graph,
                Box::new([1, 1, 1, 1]),
                Box::new([2, 2, 2, 2]),
            ))
            .expect("initial propagation succeeds");

        solver.graph_mut().add_arc(graph.id(), 0, 1).expect("arc in envelope");
        solver.graph_mut().add_arc(graph.id(), 0, 2).expect("arc in envelope");
        solver.propagate_to_fixpoint().expect("degree-saturated node prunes its remaining envelope arc");

        assert!(!graph.arc_in_envelope(solver.graph(), 0, 3));
    }
}
