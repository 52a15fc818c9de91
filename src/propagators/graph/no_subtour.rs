//! No-subtour / undirected Hamiltonian cycle: forbids any arc that would
//! close a cycle shorter than the full node set, tracked incrementally via
//! reversible chain-splicing rather than a DFS-from-scratch each call.
//!
//! For each mandatory chain of nodes, `other_end[u]` names the opposite
//! endpoint of the chain `u` currently terminates (a node not yet at
//! kernel-degree 2 is an endpoint of a possibly trivial one-node chain,
//! `other_end[u] == u`). Enforcing arc `(u, v)`: look up `U =
//! other_end[u]`, `V = other_end[v]`; if `U == v` the two endpoints already
//! belong to the same chain, so this arc closes a cycle — legal only once
//! every node is on it. Otherwise splice the two chains (`other_end[U] =
//! V`, `other_end[V] = U`) and forbid `(U, V)` in the envelope unless it
//! would complete the Hamiltonian cycle.

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

pub(crate) struct NoSubtourPropagator {
    graph: GraphVariable,
    other_end: Box<[Reversible<i32>]>,
    enforced_edges: Reversible<usize>,
    /// How many entries of `AssignmentsGraph`'s replay log this propagator
    /// has already folded into `other_end`/`enforced_edges`. Itself
    /// reversible so a backtrack that shrinks the log also rewinds how far
    /// we believe we've read it.
    cursor: Reversible<usize>,
}

impl NoSubtourPropagator {
    pub(crate) fn new(trail: &Rc<Trail>, graph: GraphVariable) -> Self {
        let other_end = (0..graph.num_nodes())
            .map(|node| Reversible::new(trail, node as i32))
            .collect();
        NoSubtourPropagator {
            graph,
            other_end,
            enforced_edges: Reversible::new(trail, 0),
            cursor: Reversible::new(trail, 0),
        }
    }
}

impl Propagator for NoSubtourPropagator {
    fn name(&self) -> &str {
        "NoSubtour"
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
            // Undirected arcs are mirrored on both endpoints; process each
            // unordered pair once.
            if u >= v {
                continue;
            }

            let big_u = self.other_end[u].get() as usize;
            let big_v = self.other_end[v].get() as usize;
            let count_before = self.enforced_edges.get();

            if big_u == v {
                if count_before + 1 != n {
                    return Err(conjunction!().into());
                }
                self.enforced_edges.set(count_before + 1);
                continue;
            }

            self.other_end[big_u].set(big_v as i32);
            self.other_end[big_v].set(big_u as i32);
            self.enforced_edges.set(count_before + 1);

            let covers_every_node = count_before + 1 == n - 1;
            if !covers_every_node
                && big_u != big_v
                && context.graph().arc_in_envelope(id, big_u, big_v)
                && !context.graph().arc_in_kernel(id, big_u, big_v)
            {
                context.graph_mut().remove_arc(id, big_u, big_v)?;
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
    fn closing_a_premature_subcycle_fails() {
        let mut solver = ConstraintSatisfactionSolver::new();
        let graph = solver.new_graph_variable(false, 4).expect("valid graph");
        solver
            .post_propagator(NoSubtourPropagator::new(solver.trail(), graph))
            .expect("initial propagation succeeds");

        solver.graph_mut().add_arc(graph.id(), 0, 1).expect("arc in envelope");
        solver.propagate_to_fixpoint().expect("first edge never closes a cycle");

        solver.graph_mut().add_arc(graph.id(), 1, 0).expect("arc in envelope");
        // Re-adding the same (mirrored) arc is a no-op, not a second edge.
        assert!(solver.propagate_to_fixpoint().is_ok());

        solver.graph_mut().add_arc(graph.id(), 0, 2).expect("arc in envelope");
        solver.propagate_to_fixpoint().expect("chain of two edges still open");

        // Closing 1-2 now would produce a 3-cycle missing node 3.
        assert!(!graph.arc_in_envelope(solver.graph(), 1, 2));
    }

    #[test]
    fn final_edge_completes_the_cycle() {
        let mut solver = ConstraintSatisfactionSolver::new();
        let graph = solver.new_graph_variable(false, 3).expect("valid graph");
        solver
            .post_propagator(NoSubtourPropagator::new(solver.trail(), graph))
            .expect("initial propagation succeeds");

        solver.graph_mut().add_arc(graph.id(), 0, 1).expect("arc in envelope");
        solver.propagate_to_fixpoint().expect("first edge is never premature");
        solver.graph_mut().add_arc(graph.id(), 1, 2).expect("arc in envelope");
        solver.propagate_to_fixpoint().expect("second edge spans every node as one chain");

        solver.graph_mut().add_arc(graph.id(), 2, 0).expect("arc in envelope");
        solver.propagate_to_fixpoint().expect("closing edge completes the Hamiltonian cycle");
    }
}
