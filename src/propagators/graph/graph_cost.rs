//! Graph cost: ties a graph variable's edge weights to a `cost` integer
//! variable, tightening `cost`'s lower bound to
//! the sum of mandatory edges plus, for every node short of its required
//! degree, the cheapest possible edges that could still fill the gap.
//!
//! This is the same bound a 1-tree relaxation falls back to when it has
//! nothing better to offer (see [`super::held_karp`]) — simple enough to
//! recompute from scratch every call, so unlike the other graph
//! propagators in this module it keeps no incremental state at all.

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

pub(crate) struct GraphCostPropagator<Var> {
    graph: GraphVariable,
    /// Symmetric (for undirected graphs) weight matrix, `weights[u][v]`.
    weights: Box<[Box<[i32]>]>,
    /// Required kernel out-degree per node (2 for a Hamiltonian cycle, 1
    /// for a path interior node, and so on).
    required_degree: Box<[usize]>,
    cost: Var,
}

impl<Var> GraphCostPropagator<Var> {
    pub(crate) fn new(
        graph: GraphVariable,
        weights: Box<[Box<[i32]>]>,
        required_degree: Box<[usize]>,
        cost: Var,
    ) -> Self {
        assert_eq!(weights.len(), graph.num_nodes());
        assert_eq!(required_degree.len(), graph.num_nodes());
        Self {
            graph,
            weights,
            required_degree,
            cost,
        }
    }
}

impl<Var: IntegerVariable + 'static> Propagator for GraphCostPropagator<Var> {
    fn name(&self) -> &str {
        "GraphCost"
    }

    fn priority(&self) -> PropagatorPriority {
        PropagatorPriority::Linear
    }

    fn propagate(&self, mut context: PropagationContextMut) -> PropagationStatusCP {
        let n = self.graph.num_nodes();
        let directed = context.graph().is_directed(self.graph.id());
        let mut kernel_sum: i64 = 0;
        for u in 0..n {
            for v in self.graph.kernel_successors(context.graph(), u) {
                if v > u || directed {
                    kernel_sum += i64::from(self.weights[u][v]);
                }
            }
        }

        let mut remaining_lb: i64 = 0;
        for node in 0..n {
            if !self.graph.node_in_envelope(context.graph(), node) {
                continue;
            }
            let have = self.graph.kernel_successors(context.graph(), node).count();
            let need = self.required_degree[node].saturating_sub(have);
            if need == 0 {
                continue;
            }
            let mut candidates: Vec<i32> = self
                .graph
                .envelope_successors(context.graph(), node)
                .filter(|&to| !self.graph.arc_in_kernel(context.graph(), node, to))
                .map(|to| self.weights[node][to])
                .collect();
            if candidates.len() < need {
                return Err(conjunction!().into());
            }
            candidates.sort_unstable();
            remaining_lb += candidates.into_iter().take(need).map(i64::from).sum::<i64>();
        }

        let lower_bound = kernel_sum + remaining_lb;
        if lower_bound > i64::from(context.upper_bound(&self.cost)) {
            return Err(conjunction!().into());
        }
        context.set_lower_bound(&self.cost, lower_bound as i32, conjunction!())?;
        Ok(())
    }

    fn initialise_at_root(
        &mut self,
        init_context: &mut PropagatorInitialisationContext,
    ) -> Result<(), PropositionalConjunction> {
        init_context.register_graph(self.graph.id(), GraphEvents::ANY);
        init_context.register(self.cost.clone(), DomainEvents::ANY_INT);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::constraint_satisfaction_solver::ConstraintSatisfactionSolver;

    #[test]
    fn mandatory_edges_raise_the_cost_lower_bound() {
        let mut solver = ConstraintSatisfactionSolver::new();
        let graph = solver.new_graph_variable(false, 3).expect("valid graph");
        let cost = solver.new_bounded_variable(0, 100).expect("valid domain");

        let weights: Box<[Box<[i32]>]> = Box::new([
            Box::new([0, 5, 9]) as Box<[i32]>,
            Box::new([5, 0, 3]) as Box<[i32]>,
            Box::new([9, 3, 0]) as Box<[i32]>,
        ]);
        let required_degree: Box<[usize]> = Box::new([2, 2, 2]);

        solver
            .post_propagator(GraphCostPropagator::new(graph, weights, required_degree, cost))
            .expect("initial propagation succeeds");

        solver.graph_mut().add_arc(graph.id(), 0, 1).expect("arc in envelope");
        solver.propagate_to_fixpoint().expect("mandatory edge contributes to the lower bound");

        assert!(cost.lower_bound(solver.assignments()) >= 5);
    }
}
