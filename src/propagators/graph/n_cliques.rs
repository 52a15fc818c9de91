//! K connected components / K cliques: ties a graph variable's eventual
//! partition into disjoint cliques to an integer variable `k` counting
//! them.
//!
//! Kernel edges only ever merge fragments together, never split them, so
//! the number of components the *kernel alone* forms is the most
//! fragmented the final partition can still be — an upper bound on `k`.
//! Envelope edges only ever shrink, so nodes already unreachable from each
//! other in the envelope can never end up in the same clique — the number
//! of components the *envelope* forms is the least fragmented the final
//! partition can be, a lower bound on `k`. (See `DESIGN.md` for why this
//! reading was chosen over the literal "forced"/"possible" wording.)
//!
//! Recomputed with a fresh union-find each call rather than incrementally
//! maintained, the same simplification documented in
//! [`super::transitivity`].

use crate::basic_types::PropagationStatusCP;
use crate::conjunction;
use crate::engine::cp::graph::graph_events::GraphEvents;
use crate::engine::cp::propagation::propagation_context::ReadDomains;
use crate::engine::cp::propagation::{
    PropagationContextMut, Propagator, PropagatorInitialisationContext, PropagatorPriority,
};
use crate::engine::cp::domain_events::DomainEvents;
use crate::predicates::PropositionalConjunction;
use crate::variables::{GraphVariable, IntegerVariable};

/// Plain union-find, rebuilt from scratch each call; not trailed since
/// nothing here survives past a single `propagate` invocation.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }

    fn component_count(&mut self, n: usize) -> usize {
        (0..n).map(|i| self.find(i)).collect::<std::collections::HashSet<_>>().len()
    }
}

pub(crate) struct NCliquesPropagator<Var> {
    graph: GraphVariable,
    k: Var,
}

impl<Var> NCliquesPropagator<Var> {
    pub(crate) fn new(graph: GraphVariable, k: Var) -> Self {
        Self { graph, k }
    }
}

impl<Var: IntegerVariable + 'static> Propagator for NCliquesPropagator<Var> {
    fn name(&self) -> &str {
        "NCliques"
    }

    fn priority(&self) -> PropagatorPriority {
        PropagatorPriority::Quadratic
    }

    fn propagate(&self, mut context: PropagationContextMut) -> PropagationStatusCP {
        let n = self.graph.num_nodes();

        let mut kernel_uf = UnionFind::new(n);
        let mut envelope_uf = UnionFind::new(n);
        for u in 0..n {
            for v in self.graph.kernel_successors(context.graph(), u) {
                kernel_uf.union(u, v);
            }
            for v in self.graph.envelope_successors(context.graph(), u) {
                envelope_uf.union(u, v);
            }
        }
        let kernel_components = kernel_uf.component_count(n);
        let envelope_components = envelope_uf.component_count(n);

        if envelope_components > kernel_components {
            // The envelope can never be more fragmented than the kernel.
            return Err(conjunction!().into());
        }

        context.set_upper_bound(&self.k, kernel_components as i32, conjunction!())?;
        context.set_lower_bound(&self.k, envelope_components as i32, conjunction!())?;
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
    fn merging_kernel_fragments_tightens_k_upper_bound() {
        let mut solver = ConstraintSatisfactionSolver::new();
        let graph = solver.new_graph_variable(false, 4).expect("valid graph");
        let k = solver.new_bounded_variable(1, 4).expect("valid domain");

        solver
            .post_propagator(NCliquesPropagator::new(graph, k))
            .expect("initial propagation succeeds");

        solver.graph_mut().add_arc(graph.id(), 0, 1).expect("arc in envelope");
        solver.graph_mut().add_arc(graph.id(), 2, 3).expect("arc in envelope");
        solver.propagate_to_fixpoint().expect("two kernel fragments cap k at 2");

        assert_eq!(k.upper_bound(solver.assignments()), 2);
    }
}
