//! K anti-arborescences: a directed forest where every node reaches exactly
//! one root via a chain of parent arcs, and a self-loop `(i, i)` marks `i`
//! as its own root.
//!
//! Two invariants are kept in lockstep:
//! - every node has out-degree exactly 1 once the self-loop is counted as a
//!   candidate out-arc (reusing [`super::degree_bounds`]'s saturate/promote
//!   logic on a per-node out-neighborhood that includes the loop);
//! - the root count is bounded the same way [`super::n_cliques`] bounds its
//!   component count: nodes whose self-loop is already mandatory are
//!   already-forced roots (a lower bound on the final root variable `k`),
//!   nodes whose self-loop is still possible are potential roots (an upper
//!   bound on `k`).
//!
//! A full dominator-style incremental GAC pass is not attempted here; this
//! recomputes the degree and root counts from scratch each call, the same
//! trade-off documented in [`super::transitivity`] and [`super::n_cliques`].

use crate::basic_types::PropagationStatusCP;
use crate::conjunction;
use crate::engine::cp::domain_events::DomainEvents;
use crate::engine::cp::graph::graph_events::GraphEvents;
use crate::engine::cp::propagation::propagation_context::ReadDomains;
use crate::engine::cp::propagation::{
    PropagationContextMut, Propagator, PropagatorInitialisationContext, PropagatorPriority,
};
use crate::predicates::PropositionalConjunction;
use crate::variables::{GraphVariable, IntegerVariable};

pub(crate) struct NTreesPropagator<Var> {
    graph: GraphVariable,
    k: Var,
}

impl<Var> NTreesPropagator<Var> {
    pub(crate) fn new(graph: GraphVariable, k: Var) -> Self {
        Self { graph, k }
    }
}

impl<Var: IntegerVariable + 'static> Propagator for NTreesPropagator<Var> {
    fn name(&self) -> &str {
        "NTrees"
    }

    fn priority(&self) -> PropagatorPriority {
        PropagatorPriority::Binary
    }

    fn propagate(&self, mut context: PropagationContextMut) -> PropagationStatusCP {
        let id = self.graph.id();
        let n = self.graph.num_nodes();

        let mut enforced_roots = 0usize;
        let mut possible_roots = 0usize;
        for node in 0..n {
            if !self.graph.node_in_envelope(context.graph(), node) {
                continue;
            }
            if self.graph.arc_in_kernel(context.graph(), node, node) {
                enforced_roots += 1;
            }
            if self.graph.arc_in_envelope(context.graph(), node, node) {
                possible_roots += 1;
            }

            // Every node has exactly one parent, self-loop included as a
            // candidate; once one candidate is mandatory every other is
            // excluded, and once only one candidate remains it is mandatory.
            let out_kernel = self.graph.kernel_successors(context.graph(), node).count();
            let out_envelope = self.graph.envelope_successors(context.graph(), node).count();
            if out_kernel > 1 {
                return Err(conjunction!().into());
            }
            if out_kernel == 1 && out_envelope > 1 {
                let free: Vec<usize> = self
                    .graph
                    .envelope_successors(context.graph(), node)
                    .filter(|&to| !self.graph.arc_in_kernel(context.graph(), node, to))
                    .collect();
                for to in free {
                    context.graph_mut().remove_arc(id, node, to)?;
                }
            } else if out_kernel == 0 && out_envelope == 1 {
                let only: Vec<usize> = self.graph.envelope_successors(context.graph(), node).collect();
                context.graph_mut().add_arc(id, node, only[0])?;
            } else if out_envelope == 0 {
                return Err(conjunction!().into());
            }
        }

        if enforced_roots > possible_roots {
            return Err(conjunction!().into());
        }

        context.set_lower_bound(&self.k, enforced_roots as i32, conjunction!())?;
        context.set_upper_bound(&self.k, possible_roots as i32, conjunction!())?;

        let k_lb = context.lower_bound(&self.k);
        let k_ub = context.upper_bound(&self.k);
        if enforced_roots as i32 == k_ub && possible_roots > enforced_roots {
            // No more roots may appear; every still-possible, not-yet-mandatory
            // self-loop is excluded.
            let extra: Vec<usize> = (0..n)
                .filter(|&node| {
                    self.graph.node_in_envelope(context.graph(), node)
                        && self.graph.arc_in_envelope(context.graph(), node, node)
                        && !self.graph.arc_in_kernel(context.graph(), node, node)
                })
                .collect();
            for node in extra {
                context.graph_mut().remove_arc(id, node, node)?;
            }
        } else if possible_roots as i32 == k_lb && possible_roots > enforced_roots {
            // Every remaining candidate root must become one.
            let extra: Vec<usize> = (0..n)
                .filter(|&node| {
                    self.graph.node_in_envelope(context.graph(), node)
                        && self.graph.arc_in_envelope(context.graph(), node, node)
                        && !self.graph.arc_in_kernel(context.graph(), node, node)
                })
                .collect();
            for node in extra {
                context.graph_mut().add_arc(id, node, node)?;
            }
        }
        Ok(())
    }

    fn initialise_at_root(
        &mut self,
        init_context: &mut PropagatorInitialisationContext,
    ) -> Result<(), PropositionalConjunction> {
        init_context.register_graph(self.graph.id(), GraphEvents::ANY);
        init_context.register(self.k.clone(), DomainEvents::ANY_INT);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::constraint_satisfaction_solver::ConstraintSatisfactionSolver;

    #[test]
    fn single_possible_root_is_forced() {
        let mut solver = ConstraintSatisfactionSolver::new();
        let graph = solver.new_graph_variable(true, 3).expect("valid graph");
        let k = solver.new_bounded_variable(1, 1).expect("valid domain");

        solver.graph_mut().remove_arc(graph.id(), 1, 1).expect("arc in envelope");
        solver.graph_mut().remove_arc(graph.id(), 2, 2).expect("arc in envelope");

        solver
            .post_propagator(NTreesPropagator::new(graph, k))
            .expect("single remaining root candidate is forced mandatory");

        assert!(graph.arc_in_kernel(solver.graph(), 0, 0));
    }

    #[test]
    fn lone_out_arc_becomes_mandatory() {
        let mut solver = ConstraintSatisfactionSolver::new();
        let graph = solver.new_graph_variable(true, 3).expect("valid graph");
        let k = solver.new_bounded_variable(1, 2).expect("valid domain");

        solver.graph_mut().remove_arc(graph.id(), 1, 1).expect("arc in envelope");
        solver.graph_mut().remove_arc(graph.id(), 1, 0).expect("arc in envelope");

        solver
            .post_propagator(NTreesPropagator::new(graph, k))
            .expect("node 1's only remaining out-arc is forced mandatory");

        assert!(graph.arc_in_kernel(solver.graph(), 1, 2));
    }
}
