//! Path no-cycle, directed: a directed Hamiltonian path from `origin` to
//! `destination`, modeled the same way a plain Hamiltonian cycle is, with
//! `destination -> origin` standing in as the one legal "closing" arc.
//!
//! Mirrors [`super::no_subtour::NoSubtourPropagator`]'s chain-splicing
//! structure but tracks chain starts and ends separately, since arc
//! direction breaks the symmetry the undirected version relies on:
//! `chain_start[e]` is the start of the chain whose open end is `e` (no
//! outgoing arc yet); `chain_end[s]` is the end of the chain whose open
//! start is `s` (no incoming arc yet).

use std::rc::Rc;

use crate::basic_types::PropagationStatusCP;
use crate::conjunction;
use crate::engine::cp::graph::assignments_graph::GraphChangeDetail;
use crate::engine::cp::graph::graph_events::{GraphDomainEvent, GraphEvents};
use crate::engine::cp::propagation::{
    PropagationContextMut, Propagator, PropagatorInitialisationContext, PropagatorPriority,
};
use crate::engine::cp::propagation::propagation_context::ReadDomains;
use crate::engine::cp::reversible::{Reversible, Trail};
use crate::predicates::PropositionalConjunction;
use crate::variables::GraphVariable;

pub(crate) struct PathNoCyclePropagator {
    graph: GraphVariable,
    origin: usize,
    destination: usize,
    chain_start: Box<[Reversible<i32>]>,
    chain_end: Box<[Reversible<i32>]>,
    enforced_arcs: Reversible<usize>,
    cursor: Reversible<usize>,
}

impl PathNoCyclePropagator {
    pub(crate) fn new(trail: &Rc<Trail>, graph: GraphVariable, origin: usize, destination: usize) -> Self {
        let chain_start = (0..graph.num_nodes())
            .map(|node| Reversible::new(trail, node as i32))
            .collect();
        let chain_end = (0..graph.num_nodes())
            .map(|node| Reversible::new(trail, node as i32))
            .collect();
        PathNoCyclePropagator {
            graph,
            origin,
            destination,
            chain_start,
            chain_end,
            enforced_arcs: Reversible::new(trail, 0),
            cursor: Reversible::new(trail, 0),
        }
    }
}

impl Propagator for PathNoCyclePropagator {
    fn name(&self) -> &str {
        "PathNoCycle"
    }

    fn priority(&self) -> PropagatorPriority {
        PropagatorPriority::Unary
    }

    fn propagate(&self, mut context: PropagationContextMut) -> PropagationStatusCP {
        let id = self.graph.id();
        let n = self.graph.num_nodes();
        let since = self.cursor.get();
        let log = context.graph().event_log_since(since);
        self.cursor.set(context.graph().event_log_len());

        for change in log {
            if change.id != id || change.event != GraphDomainEvent::AddArc {
                continue;
            }
            let GraphChangeDetail::Arc(u, v) = change.detail else {
                continue;
            };

            let start_of_u_chain = self.chain_start[u].get() as usize;
            let end_of_v_chain = self.chain_end[v].get() as usize;
            let count_before = self.enforced_arcs.get();

            if start_of_u_chain == v {
                let completes_path = count_before + 1 == n && u == self.destination && v == self.origin;
                if !completes_path {
                    return Err(conjunction!().into());
                }
                self.enforced_arcs.set(count_before + 1);
                continue;
            }

            self.chain_end[start_of_u_chain].set(end_of_v_chain as i32);
            self.chain_start[end_of_v_chain].set(start_of_u_chain as i32);
            self.enforced_arcs.set(count_before + 1);

            let covers_every_node = count_before + 1 == n - 1;
            if !covers_every_node
                && context.graph().arc_in_envelope(id, end_of_v_chain, start_of_u_chain)
                && !context.graph().arc_in_kernel(id, end_of_v_chain, start_of_u_chain)
            {
                context.graph_mut().remove_arc(id, end_of_v_chain, start_of_u_chain)?;
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
    fn premature_close_back_to_origin_fails() {
        let mut solver = ConstraintSatisfactionSolver::new();
        let graph = solver.new_graph_variable(true, 4).expect("valid graph");
        solver
            .post_propagator(PathNoCyclePropagator::new(solver.trail(), graph, 0, 3))
            .expect("initial propagation succeeds");

        solver.graph_mut().add_arc(graph.id(), 0, 1).expect("arc in envelope");
        solver.propagate_to_fixpoint().expect("first arc never closes a cycle");
        solver.graph_mut().add_arc(graph.id(), 1, 2).expect("arc in envelope");
        solver.propagate_to_fixpoint().expect("chain not yet spanning every node");

        assert!(!graph.arc_in_envelope(solver.graph(), 2, 0));
    }

    #[test]
    fn full_path_may_close_destination_to_origin() {
        let mut solver = ConstraintSatisfactionSolver::new();
        let graph = solver.new_graph_variable(true, 3).expect("valid graph");
        solver
            .post_propagator(PathNoCyclePropagator::new(solver.trail(), graph, 0, 2))
            .expect("initial propagation succeeds");

        solver.graph_mut().add_arc(graph.id(), 0, 1).expect("arc in envelope");
        solver.propagate_to_fixpoint().expect("first arc never closes a cycle");
        solver.graph_mut().add_arc(graph.id(), 1, 2).expect("arc in envelope");
        solver.propagate_to_fixpoint().expect("path now spans every node");

        solver.graph_mut().add_arc(graph.id(), 2, 0).expect("closing destination to origin completes the path");
        solver.propagate_to_fixpoint().expect("closing arc is the documented exception");
    }
}
