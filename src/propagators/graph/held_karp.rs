//! Held-Karp one-tree relaxation: a Lagrangian lower bound on a
//! Hamiltonian cycle's cost, tightened by subgradient updates to per-node
//! multipliers.
//!
//! A minimum one-tree is a spanning tree over nodes `1..n` plus the two
//! cheapest edges at node 0; built by Kruskal's algorithm over the
//! envelope with kernel edges forced in first (so an already-mandatory
//! edge is never later excluded by the MST's own greedy choices). Node 0
//! is handled separately since the two-cheapest-edges step doesn't fit
//! Kruskal's union-find structure.
//!
//! `pi`, the Lagrangian multipliers, carries over between calls as a plain
//! `RefCell` rather than trailed state: it's a warm-start heuristic for
//! [`HeldKarpWarmStart::Fast`], not a source of truth, so losing it on
//! backtrack (reverting to zero) only costs a few extra subgradient
//! iterations, never correctness. The spec's Open Question about unifying
//! `Fast`/`General` behind one `OneTreeSolver` trait is resolved by this
//! single implementation switching on `warm_start` rather than two trait
//! impls (see `DESIGN.md`).
//!
//! Separately, `activation` (spec §6.1/§6.4's `hk_mode`) gates *whether*
//! this propagator does anything at all: [`HeldKarpMode::AfterFirstSolution`]
//! makes every call a no-op until `solved_before` flips true, which
//! [`crate::Solver`] does the moment any search entry point reports a
//! solution. `HeldKarpMode::Off` is handled one level up, in
//! [`crate::Solver::tsp`], which simply never constructs this propagator.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::basic_types::PropagationStatusCP;
use crate::conjunction;
use crate::engine::cp::domain_events::DomainEvents;
use crate::engine::cp::graph::graph_events::GraphEvents;
use crate::engine::cp::propagation::propagation_context::ReadDomains;
use crate::engine::cp::propagation::{
    PropagationContextMut, Propagator, PropagatorInitialisationContext, PropagatorPriority,
};
use crate::engine::solver_config::{HeldKarpMode, HeldKarpWarmStart, RoundingMode};
use crate::predicates::PropositionalConjunction;
use crate::variables::{GraphVariable, IntegerVariable};

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
}

pub(crate) struct HeldKarpPropagator<Var> {
    graph: GraphVariable,
    weights: Box<[Box<[i32]>]>,
    cost: Var,
    activation: HeldKarpMode,
    solved_before: Rc<Cell<bool>>,
    warm_start: HeldKarpWarmStart,
    rounding: RoundingMode,
    pi: RefCell<Vec<f64>>,
}

impl<Var> HeldKarpPropagator<Var> {
    /// `activation` must not be [`HeldKarpMode::Off`] — a caller wanting
    /// that mode simply never constructs this propagator (see
    /// [`crate::Solver::tsp`]). `solved_before` is shared with the
    /// [`crate::Solver`] that posted this propagator, flipped to `true`
    /// the moment any search entry point reports its first solution.
    pub(crate) fn new(
        graph: GraphVariable,
        weights: Box<[Box<[i32]>]>,
        cost: Var,
        activation: HeldKarpMode,
        solved_before: Rc<Cell<bool>>,
        warm_start: HeldKarpWarmStart,
        rounding: RoundingMode,
    ) -> Self {
        assert_eq!(weights.len(), graph.num_nodes());
        assert_ne!(activation, HeldKarpMode::Off, "Off is handled by not posting this propagator at all");
        let n = graph.num_nodes();
        Self {
            graph,
            weights,
            cost,
            activation,
            solved_before,
            warm_start,
            rounding,
            pi: RefCell::new(vec![0.0; n]),
        }
    }

    fn is_active(&self) -> bool {
        match self.activation {
            HeldKarpMode::Off => false,
            HeldKarpMode::FromRoot => true,
            HeldKarpMode::AfterFirstSolution => self.solved_before.get(),
        }
    }

    /// Builds the minimum one-tree under `pi`-adjusted weights, returning
    /// its cost, each node's degree in it, and the edges actually chosen
    /// (the `n - 1` spanning-tree edges over `1..n`, plus the two edges
    /// at node 0 — the second of which is the one-tree's one "extra" edge
    /// closing a cycle through node 0). `None` if the envelope is
    /// currently too sparse to span every node (left to other propagators
    /// to detect as a contradiction).
    fn minimum_one_tree(&self, context: &PropagationContextMut, pi: &[f64]) -> Option<OneTree> {
        let n = self.graph.num_nodes();
        let adjusted = |u: usize, v: usize| f64::from(self.weights[u][v]) + pi[u] + pi[v];

        let mut uf = UnionFind::new(n);
        let mut degree = vec![0usize; n];
        let mut tree_cost = 0.0;
        let mut tree_edges = Vec::with_capacity(n);

        let mut mandatory = Vec::new();
        let mut optional = Vec::new();
        for u in 1..n {
            for v in self.graph.envelope_successors(context.graph(), u) {
                if v <= u || v == 0 {
                    continue;
                }
                if self.graph.arc_in_kernel(context.graph(), u, v) {
                    mandatory.push((u, v));
                } else {
                    optional.push((u, v, adjusted(u, v)));
                }
            }
        }
        optional.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap());

        for (u, v) in mandatory {
            if uf.find(u) == uf.find(v) {
                return None;
            }
            uf.union(u, v);
            tree_cost += adjusted(u, v);
            degree[u] += 1;
            degree[v] += 1;
            tree_edges.push((u, v));
        }
        for (u, v, w) in optional {
            if uf.find(u) != uf.find(v) {
                uf.union(u, v);
                tree_cost += w;
                degree[u] += 1;
                degree[v] += 1;
                tree_edges.push((u, v));
            }
        }
        if n > 1 {
            let root = uf.find(1);
            if (1..n).any(|node| uf.find(node) != root) {
                return None;
            }
        }

        let node0_kernel: Vec<usize> = self.graph.kernel_successors(context.graph(), 0).collect();
        if node0_kernel.len() > 2 {
            return None;
        }
        let need = 2 - node0_kernel.len();
        let mut node0_candidates: Vec<(usize, f64)> = self
            .graph
            .envelope_successors(context.graph(), 0)
            .filter(|v| !node0_kernel.contains(v))
            .map(|v| (v, adjusted(0, v)))
            .collect();
        if node0_candidates.len() < need {
            return None;
        }
        node0_candidates.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

        let mut node0_edges: Vec<(usize, f64)> = node0_kernel.iter().map(|&v| (v, adjusted(0, v))).collect();
        node0_edges.extend(node0_candidates.into_iter().take(need));
        for &(v, w) in &node0_edges {
            tree_cost += w;
            degree[0] += 1;
            degree[v] += 1;
        }
        // The cheaper of node 0's two edges joins the real spanning tree
        // used for path-max queries; the pricier one is the 1-tree's
        // single extra (cycle-closing) edge.
        node0_edges.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        let extra_edge = node0_edges.get(1).map(|&(v, _)| (0, v));
        if let Some(&(v, _)) = node0_edges.first() {
            tree_edges.push((0, v));
        }

        Some(OneTree {
            cost: tree_cost,
            degree,
            tree_edges,
            extra_edge,
        })
    }

    /// Per spec §4.8: for every envelope edge not already in the one-tree,
    /// compute the cost of a one-tree forced to include it (swap in for
    /// the heaviest edge on the tree path it would otherwise close a
    /// cycle with); if even the best case exceeds `cost`'s current upper
    /// bound, the edge can never appear in an optimal tour and is removed.
    /// Symmetrically, for every tree edge, compute the cost of a one-tree
    /// forced to exclude it (replaced by the cheapest envelope edge
    /// crossing the cut its removal creates); if no affordable
    /// replacement exists, the edge is mandatory in every optimal tour and
    /// is promoted to the kernel.
    fn eliminate_by_reduced_cost(
        &self,
        context: &mut PropagationContextMut,
        pi: &[f64],
        tree: &OneTree,
        best_bound: f64,
        upper_bound: i64,
    ) -> PropagationStatusCP {
        let n = self.graph.num_nodes();
        if n < 3 {
            return Ok(());
        }
        let adjusted = |u: usize, v: usize| f64::from(self.weights[u][v]) + pi[u] + pi[v];
        let id = self.graph.id();

        let shape = TreeShape::build(n, &tree.tree_edges, |a, b| adjusted(a, b));
        let mut in_tree = vec![vec![false; n]; n];
        for &(u, v) in &tree.tree_edges {
            in_tree[u][v] = true;
            in_tree[v][u] = true;
        }
        if let Some((u, v)) = tree.extra_edge {
            in_tree[u][v] = true;
            in_tree[v][u] = true;
        }

        let mut to_remove = Vec::new();
        for u in 0..n {
            for v in context.graph().envelope_successors(id, u).collect::<Vec<_>>() {
                if v <= u || in_tree[u][v] || self.graph.arc_in_kernel(context.graph(), u, v) {
                    continue;
                }
                let path_max = if u == 0 || v == 0 {
                    // Node 0's edges aren't on the spanning tree's simple
                    // paths; comparing against its current one-tree edges
                    // directly is the natural fallback.
                    tree.tree_edges
                        .iter()
                        .chain(tree.extra_edge.iter())
                        .filter(|&&(a, b)| a == 0 || b == 0)
                        .map(|&(a, b)| adjusted(a, b))
                        .fold(f64::NEG_INFINITY, f64::max)
                } else {
                    shape.path_max(u, v)
                };
                let forced = best_bound + (adjusted(u, v) - path_max);
                let rounded = match self.rounding {
                    RoundingMode::Ceil => forced.ceil() as i64,
                    RoundingMode::Floor => forced.floor() as i64,
                    RoundingMode::Round => forced.round() as i64,
                };
                if rounded > upper_bound {
                    to_remove.push((u, v));
                }
            }
        }
        for (u, v) in to_remove {
            if self.graph.arc_in_envelope(context.graph(), u, v) {
                context.graph_mut().remove_arc(id, u, v)?;
            }
        }

        let mut to_enforce = Vec::new();
        for &(u, v) in &tree.tree_edges {
            if self.graph.arc_in_kernel(context.graph(), u, v) {
                continue;
            }
            let child = if shape.depth[u] > shape.depth[v] { u } else { v };
            let mut best_replacement = f64::INFINITY;
            for a in 0..n {
                for b in context.graph().envelope_successors(id, a).collect::<Vec<_>>() {
                    if b <= a || (a == u && b == v) {
                        continue;
                    }
                    let separated = shape.in_subtree_below(a, child) != shape.in_subtree_below(b, child);
                    if separated {
                        best_replacement = best_replacement.min(adjusted(a, b));
                    }
                }
            }
            if best_replacement == f64::INFINITY {
                continue;
            }
            let forced = best_bound - adjusted(u, v) + best_replacement;
            let rounded = match self.rounding {
                RoundingMode::Ceil => forced.ceil() as i64,
                RoundingMode::Floor => forced.floor() as i64,
                RoundingMode::Round => forced.round() as i64,
            };
            if rounded > upper_bound {
                to_enforce.push((u, v));
            }
        }
        for (u, v) in to_enforce {
            context.graph_mut().add_arc(id, u, v)?;
        }
        Ok(())
    }
}

struct OneTree {
    cost: f64,
    degree: Vec<usize>,
    /// The `n - 1` edges of a genuine spanning tree over every node
    /// (node 0's cheaper edge included).
    tree_edges: Vec<(usize, usize)>,
    /// The one-tree's extra edge beyond a spanning tree (node 0's pricier
    /// edge), closing the cycle through node 0. `None` when `n <= 2`.
    extra_edge: Option<(usize, usize)>,
}

/// Parent pointers over [`OneTree::tree_edges`], rooted arbitrarily at node
/// 0, used to answer "heaviest edge on the tree path between `u` and `v`"
/// queries for reduced-cost edge elimination.
struct TreeShape {
    parent: Vec<usize>,
    parent_weight: Vec<f64>,
    depth: Vec<usize>,
}

impl TreeShape {
    fn build(n: usize, tree_edges: &[(usize, usize)], weight_of: impl Fn(usize, usize) -> f64) -> Self {
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
        for &(u, v) in tree_edges {
            adjacency[u].push(v);
            adjacency[v].push(u);
        }
        let mut parent = vec![usize::MAX; n];
        let mut parent_weight = vec![0.0; n];
        let mut depth = vec![0usize; n];
        let mut visited = vec![false; n];
        let mut stack = vec![0usize];
        visited[0] = true;
        while let Some(u) = stack.pop() {
            for &v in &adjacency[u] {
                if !visited[v] {
                    visited[v] = true;
                    parent[v] = u;
                    parent_weight[v] = weight_of(u, v);
                    depth[v] = depth[u] + 1;
                    stack.push(v);
                }
            }
        }
        TreeShape {
            parent,
            parent_weight,
            depth,
        }
    }

    /// Heaviest edge weight on the unique tree path between `u` and `v`.
    fn path_max(&self, mut u: usize, mut v: usize) -> f64 {
        let mut max_weight = f64::NEG_INFINITY;
        while self.depth[u] > self.depth[v] {
            max_weight = max_weight.max(self.parent_weight[u]);
            u = self.parent[u];
        }
        while self.depth[v] > self.depth[u] {
            max_weight = max_weight.max(self.parent_weight[v]);
            v = self.parent[v];
        }
        while u != v {
            max_weight = max_weight.max(self.parent_weight[u]).max(self.parent_weight[v]);
            u = self.parent[u];
            v = self.parent[v];
        }
        max_weight
    }

    /// Whether `node` lies in the subtree rooted at `child` once the tree
    /// is cut at the edge `(parent_of_child, child)` — i.e. whether
    /// removing that edge would separate `node` from the root on
    /// `child`'s side.
    fn in_subtree_below(&self, node: usize, child: usize) -> bool {
        let mut cursor = node;
        loop {
            if cursor == child {
                return true;
            }
            if self.depth[cursor] <= self.depth[child] {
                return false;
            }
            cursor = self.parent[cursor];
        }
    }
}

impl<Var: IntegerVariable + 'static> Propagator for HeldKarpPropagator<Var> {
    fn name(&self) -> &str {
        "HeldKarp"
    }

    fn priority(&self) -> PropagatorPriority {
        PropagatorPriority::VerySlow
    }

    fn propagate(&self, mut context: PropagationContextMut) -> PropagationStatusCP {
        if !self.is_active() {
            return Ok(());
        }
        let n = self.graph.num_nodes();
        let mut pi = self.pi.borrow().clone();
        if pi.len() != n || self.warm_start == HeldKarpWarmStart::General {
            pi = vec![0.0; n];
        }

        let mut best_bound = f64::NEG_INFINITY;
        let mut last_tree = None;
        let mut step = 1.0_f64;
        for _ in 0..30 {
            let Some(tree) = self.minimum_one_tree(&context, &pi) else {
                break;
            };
            let pi_sum: f64 = pi.iter().sum();
            let bound = tree.cost - 2.0 * pi_sum;
            if bound > best_bound {
                best_bound = bound;
            }
            let violation: f64 = (0..n).map(|v| (tree.degree[v] as f64 - 2.0).powi(2)).sum();
            let converged = violation < 1e-9;
            for (v, pi_v) in pi.iter_mut().enumerate() {
                *pi_v += step * (tree.degree[v] as f64 - 2.0);
            }
            step *= 0.95;
            last_tree = Some(tree);
            if converged {
                break;
            }
        }
        *self.pi.borrow_mut() = pi.clone();

        let Some(tree) = last_tree else {
            return Ok(());
        };

        let rounded = match self.rounding {
            RoundingMode::Ceil => best_bound.ceil() as i64,
            RoundingMode::Floor => best_bound.floor() as i64,
            RoundingMode::Round => best_bound.round() as i64,
        };
        let upper_bound = i64::from(context.upper_bound(&self.cost));
        if rounded > upper_bound {
            return Err(conjunction!().into());
        }
        context.set_lower_bound(&self.cost, rounded as i32, conjunction!())?;

        self.eliminate_by_reduced_cost(&mut context, &pi, &tree, best_bound, upper_bound)?;
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
    fn square_graph_one_tree_bound_matches_known_optimum() {
        let mut solver = ConstraintSatisfactionSolver::new();
        let graph = solver.new_graph_variable(false, 4).expect("valid graph");
        let cost = solver.new_bounded_variable(0, 1000).expect("valid domain");

        // Unit square with diagonals; optimal cycle cost is 4.
        let weights: Box<[Box<[i32]>]> = Box::new([
            Box::new([0, 1, 2, 1]) as Box<[i32]>,
            Box::new([1, 0, 1, 2]) as Box<[i32]>,
            Box::new([2, 1, 0, 1]) as Box<[i32]>,
            Box::new([1, 2, 1, 0]) as Box<[i32]>,
        ]);

        solver
            .post_propagator(HeldKarpPropagator::new(
                graph,
                weights,
                cost,
                HeldKarpMode::FromRoot,
                Rc::new(Cell::new(false)),
                HeldKarpWarmStart::General,
                RoundingMode::Ceil,
            ))
            .expect("initial propagation succeeds");

        assert!(cost.lower_bound(solver.assignments()) <= 4);
    }

    #[test]
    fn reduced_cost_elimination_prunes_diagonals_at_a_tight_upper_bound() {
        let mut solver = ConstraintSatisfactionSolver::new();
        let graph = solver.new_graph_variable(false, 4).expect("valid graph");
        // Cycle 0-1-2-3-0 costs 1 per edge (optimum 4); either diagonal
        // costs 3, too expensive to appear in any tour within that bound.
        let cost = solver.new_bounded_variable(0, 4).expect("valid domain");

        let weights: Box<[Box<[i32]>]> = Box::new([
            Box::new([0, 1, 3, 1]) as Box<[i32]>,
            Box::new([1, 0, 1, 3]) as Box<[i32]>,
            Box::new([3, 1, 0, 1]) as Box<[i32]>,
            Box::new([1, 3, 1, 0]) as Box<[i32]>,
        ]);

        solver
            .post_propagator(HeldKarpPropagator::new(
                graph,
                weights,
                cost,
                HeldKarpMode::FromRoot,
                Rc::new(Cell::new(false)),
                HeldKarpWarmStart::General,
                RoundingMode::Ceil,
            ))
            .expect("initial propagation succeeds");

        assert!(!graph.arc_in_envelope(solver.graph(), 0, 2));
        assert!(!graph.arc_in_envelope(solver.graph(), 1, 3));
        assert!(graph.arc_in_envelope(solver.graph(), 0, 1));
        assert!(graph.arc_in_envelope(solver.graph(), 1, 2));
    }

    #[test]
    fn after_first_solution_mode_stays_passive_until_the_flag_flips() {
        let mut solver = ConstraintSatisfactionSolver::new();
        let graph = solver.new_graph_variable(false, 4).expect("valid graph");
        let cost = solver.new_bounded_variable(0, 4).expect("valid domain");

        let weights: Box<[Box<[i32]>]> = Box::new([
            Box::new([0, 1, 3, 1]) as Box<[i32]>,
            Box::new([1, 0, 1, 3]) as Box<[i32]>,
            Box::new([3, 1, 0, 1]) as Box<[i32]>,
            Box::new([1, 3, 1, 0]) as Box<[i32]>,
        ]);

        let solved_before = Rc::new(Cell::new(false));
        solver
            .post_propagator(HeldKarpPropagator::new(
                graph,
                weights,
                cost,
                HeldKarpMode::AfterFirstSolution,
                Rc::clone(&solved_before),
                HeldKarpWarmStart::General,
                RoundingMode::Ceil,
            ))
            .expect("initial propagation succeeds (as a no-op)");

        // Still passive: the expensive diagonals are untouched.
        assert!(graph.arc_in_envelope(solver.graph(), 0, 2));
        assert!(graph.arc_in_envelope(solver.graph(), 1, 3));

        solved_before.set(true);
        solver.propagate_to_fixpoint().expect("propagation succeeds once active");

        assert!(!graph.arc_in_envelope(solver.graph(), 0, 2));
        assert!(!graph.arc_in_envelope(solver.graph(), 1, 3));
    }
}
