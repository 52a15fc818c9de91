//! A finite-domain constraint solver specialised for graph variables:
//! trailed reversible state, event-driven propagation to a fixed point, and
//! backtracking search over circuits, paths, and the tree/clique partitions
//! built from them.
//!
//! [`Solver`] is the crate's only public entry point: it owns a
//! [`engine::constraint_satisfaction_solver::ConstraintSatisfactionSolver`]
//! plus the ambient configuration and solution callback, and exposes
//! variable and constraint factories that hide every propagator type from
//! the caller.

pub mod basic_types;
pub mod branching;
pub mod engine;
pub mod optimisation;
pub mod predicates;
pub(crate) mod propagators;
pub mod results;
pub mod termination;
pub mod variables;

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use log::info;

use crate::basic_types::{ModelError, PropagationStatusCP};
use crate::branching::{Brancher, FirstFailBrancher};
use crate::engine::constraint::Constraint;
use crate::engine::constraint_satisfaction_solver::ConstraintSatisfactionSolver;
use crate::engine::cp::assignments_integer::AssignmentsInteger;
use crate::engine::cp::graph::assignments_graph::AssignmentsGraph;
use crate::engine::cp::reversible::{Trail, World};
use crate::engine::search::SearchLoop;
use crate::engine::solver_config::{HeldKarpMode, SolverConfig};
use crate::optimisation::upper_bounding_search::UpperBoundingSearch;
use crate::optimisation::OptimisationProcedure;
use crate::propagators::all_different::AllDifferentPropagator;
use crate::propagators::graph::degree_bounds::DegreeBoundsPropagator;
use crate::propagators::graph::graph_cost::GraphCostPropagator;
use crate::propagators::graph::held_karp::HeldKarpPropagator;
use crate::propagators::graph::n_cliques::NCliquesPropagator;
use crate::propagators::graph::n_trees::NTreesPropagator;
use crate::propagators::graph::no_subtour::NoSubtourPropagator;
use crate::propagators::graph::path_no_cycle::PathNoCyclePropagator;
use crate::propagators::graph::transitivity::TransitivityPropagator;
use crate::results::{OptimisationResult, SatisfactionResult, Solution, SolutionCallbackArguments};
use crate::termination::{TerminationCondition, TimeBudget};
use crate::variables::{DomainId, GraphVariable, IntegerVariable};

/// The model-facing handle for this crate. Owns the propagation engine, the
/// constraints posted against it, and the configuration that governs
/// search.
pub struct Solver {
    pub(crate) satisfaction_solver: ConstraintSatisfactionSolver,
    constraints: Vec<Constraint>,
    config: SolverConfig,
    pub(crate) solution_callback: Box<dyn Fn(SolutionCallbackArguments)>,
    interrupted: Arc<AtomicBool>,
    /// Flipped by [`Self::mark_solution_found`] the moment any search entry
    /// point reports its first solution; shared with any
    /// `HeldKarpMode::AfterFirstSolution` propagator posted by [`Self::tsp`]
    /// so its deferred activation can observe it without the propagator
    /// holding a `&Solver` back-reference.
    first_solution_found: Rc<Cell<bool>>,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl Solver {
    /// Builds an idle solver with no variables, no constraints, and a
    /// no-op solution callback. `SIGINT` is wired to a cooperative flag the
    /// moment the solver exists, so a caller that never configures a time
    /// limit can still Ctrl-C out of [`Self::find_optimal`].
    pub fn new(config: SolverConfig) -> Self {
        let interrupted = Arc::new(AtomicBool::new(false));
        if let Err(error) = signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&interrupted)) {
            log::warn!("failed to register SIGINT handler: {error}");
        }

        Solver {
            satisfaction_solver: ConstraintSatisfactionSolver::new(),
            constraints: Vec::new(),
            config,
            solution_callback: Box::new(|_| {}),
            interrupted,
            first_solution_found: Rc::new(Cell::new(false)),
        }
    }

    /// Records that a solution has been found, activating any posted
    /// `HeldKarpMode::AfterFirstSolution` propagator from now on.
    pub(crate) fn mark_solution_found(&self) {
        self.first_solution_found.set(true);
    }

    /// Replaces the solution callback, returning `self` so it can be
    /// chained onto [`Self::new`].
    #[must_use]
    pub fn with_solution_callback(mut self, callback: impl Fn(SolutionCallbackArguments) + 'static) -> Self {
        self.solution_callback = Box::new(callback);
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn trail(&self) -> Rc<Trail> {
        Rc::clone(self.satisfaction_solver.trail())
    }

    // -- Variable factories --------------------------------------------------

    pub fn int_var(&mut self, lower_bound: i32, upper_bound: i32) -> Result<DomainId, ModelError> {
        self.satisfaction_solver.new_bounded_variable(lower_bound, upper_bound)
    }

    pub fn int_var_enum(&mut self, values: &[i32]) -> Result<DomainId, ModelError> {
        self.satisfaction_solver.new_enumerated_variable(values)
    }

    /// A 0/1 integer domain: a boolean variable modeled as an integer
    /// domain restricted to `{0, 1}`.
    pub fn bool_var(&mut self) -> DomainId {
        self.satisfaction_solver
            .new_bounded_variable(0, 1)
            .expect("0 <= 1 is always a valid bound")
    }

    pub fn graph_var(&mut self, num_nodes: usize, directed: bool) -> Result<GraphVariable, ModelError> {
        if num_nodes == 0 {
            return Err(ModelError::EmptyGraph);
        }
        self.satisfaction_solver.new_graph_variable(directed, num_nodes)
    }

    // -- Direct domain manipulation -------------------------------------------
    //
    // Below the constraint factories, since they bypass a propagator's own
    // filtering: a caller that wants to pre-seed mandatory graph state
    // before search, or drive a custom search loop rather than one of the
    // `find_*` entry points, needs to reach the trail directly.

    pub fn fix_arc(&mut self, graph: GraphVariable, from: usize, to: usize) -> PropagationStatusCP {
        self.satisfaction_solver.graph_mut().add_arc(graph.id(), from, to)
    }

    pub fn exclude_arc(&mut self, graph: GraphVariable, from: usize, to: usize) -> PropagationStatusCP {
        self.satisfaction_solver.graph_mut().remove_arc(graph.id(), from, to)
    }

    /// Tightens `variable`'s lower bound directly, with no accompanying
    /// explanation — the same no-op reason graph propagators use.
    pub fn update_lower_bound(&mut self, variable: &impl IntegerVariable, value: i32) -> PropagationStatusCP {
        variable.set_lower_bound(self.satisfaction_solver.assignments_mut(), value, &crate::conjunction!())
    }

    /// Tightens `variable`'s upper bound directly, with no accompanying
    /// explanation.
    pub fn update_upper_bound(&mut self, variable: &impl IntegerVariable, value: i32) -> PropagationStatusCP {
        variable.set_upper_bound(self.satisfaction_solver.assignments_mut(), value, &crate::conjunction!())
    }

    /// Re-runs every posted propagator to a fixed point without taking a
    /// search decision.
    pub fn propagate(&mut self) -> PropagationStatusCP {
        self.satisfaction_solver.propagate_to_fixpoint()
    }

    pub fn graph_state(&self) -> &AssignmentsGraph {
        self.satisfaction_solver.graph()
    }

    pub fn assignments_state(&self) -> &AssignmentsInteger {
        self.satisfaction_solver.assignments()
    }

    pub fn push_world(&mut self) -> World {
        self.satisfaction_solver.push_world()
    }

    pub fn pop_world(&mut self) {
        self.satisfaction_solver.pop_world()
    }

    // -- Constraint factories -------------------------------------------------

    /// Constrains `graph` to a single Hamiltonian cycle: every node has
    /// degree exactly two, and the chosen edges form one cycle rather than
    /// several disjoint ones.
    pub fn hamiltonian_cycle(&mut self, graph: GraphVariable) -> Result<(), ModelError> {
        let n = graph.num_nodes();
        self.exclude_self_loops(graph, "hamiltonian_cycle")?;
        let dmin = vec![2_usize; n].into_boxed_slice();
        let dmax = vec![2_usize; n].into_boxed_slice();
        let trail = self.trail();
        let mut ids = Vec::new();
        ids.push(self.post(DegreeBoundsPropagator::new(graph, dmin, dmax))?);
        ids.push(self.post(NoSubtourPropagator::new(&trail, graph))?);
        self.constraints.push(Constraint::new("hamiltonian_cycle", ids));
        Ok(())
    }

    /// A simple cycle/path never revisits a node, so a self-loop can never
    /// be part of one; `graph_var`'s envelope starts with every self-loop
    /// possible (nTrees relies on exactly that), so `hamiltonian_cycle`/
    /// `hamiltonian_path` rule them out explicitly rather than leave degree
    /// bounds to reason about arcs that could never be chosen.
    fn exclude_self_loops(&mut self, graph: GraphVariable, constraint_name: &str) -> Result<(), ModelError> {
        for node in 0..graph.num_nodes() {
            self.exclude_arc(graph, node, node)
                .map_err(|_| ModelError::InfeasibleAtPost(constraint_name.to_owned()))?;
        }
        Ok(())
    }

    /// Constrains `graph` to a single Hamiltonian path running from
    /// `origin` to `destination`: every node has out-degree one except
    /// `destination`, and the chosen arcs never close a cycle until the
    /// final arc would close the path back to `origin`.
    pub fn hamiltonian_path(
        &mut self,
        graph: GraphVariable,
        origin: usize,
        destination: usize,
    ) -> Result<(), ModelError> {
        let n = graph.num_nodes();
        if origin >= n {
            return Err(ModelError::NodeOutOfRange { index: origin, n });
        }
        if destination >= n {
            return Err(ModelError::NodeOutOfRange { index: destination, n });
        }
        self.exclude_self_loops(graph, "hamiltonian_path")?;

        let mut dmax = vec![1_usize; n];
        dmax[destination] = 0;
        let dmin = dmax.clone();
        let trail = self.trail();
        let mut ids = Vec::new();
        ids.push(self.post(DegreeBoundsPropagator::new(graph, dmin.into_boxed_slice(), dmax.into_boxed_slice()))?);
        ids.push(self.post(PathNoCyclePropagator::new(&trail, graph, origin, destination))?);
        self.constraints.push(Constraint::new("hamiltonian_path", ids));
        Ok(())
    }

    /// The travelling salesman problem on a complete undirected graph:
    /// a Hamiltonian cycle whose edge weights sum to `cost`, with a
    /// Held-Karp one-tree relaxation tightening `cost`'s lower bound.
    pub fn tsp(
        &mut self,
        graph: GraphVariable,
        cost: impl IntegerVariable + 'static,
        weights: Vec<Vec<i32>>,
    ) -> Result<(), ModelError> {
        self.hamiltonian_cycle(graph)?;
        let weights = to_boxed_matrix(weights);
        let n = graph.num_nodes();
        let mut ids = Vec::new();
        ids.push(self.post(GraphCostPropagator::new(
            graph,
            weights.clone(),
            vec![2_usize; n].into_boxed_slice(),
            cost.clone(),
        ))?);
        if self.config.hk_mode != HeldKarpMode::Off {
            ids.push(self.post(HeldKarpPropagator::new(
                graph,
                weights,
                cost,
                self.config.hk_mode,
                Rc::clone(&self.first_solution_found),
                self.config.hk_warm_start,
                self.config.rounding_mode,
            ))?);
        }
        self.constraints.push(Constraint::new("tsp", ids));
        Ok(())
    }

    /// The asymmetric travelling salesman path problem: a Hamiltonian path
    /// from `origin` to `destination` whose arc weights sum to `cost`.
    pub fn atsp(
        &mut self,
        graph: GraphVariable,
        cost: impl IntegerVariable + 'static,
        weights: Vec<Vec<i32>>,
        origin: usize,
        destination: usize,
    ) -> Result<(), ModelError> {
        self.hamiltonian_path(graph, origin, destination)?;
        let n = graph.num_nodes();
        let mut required_degree = vec![1_usize; n];
        required_degree[destination] = 0;
        let weights = to_boxed_matrix(weights);
        let id = self.post(GraphCostPropagator::new(graph, weights, required_degree.into_boxed_slice(), cost))?;
        self.constraints.push(Constraint::new("atsp", vec![id]));
        Ok(())
    }

    /// Ties `graph`'s eventual partition into disjoint cliques to the
    /// integer variable `k`.
    pub fn n_cliques(&mut self, graph: GraphVariable, k: impl IntegerVariable + 'static) -> Result<(), ModelError> {
        let mut ids = Vec::new();
        ids.push(self.post(TransitivityPropagator::new(graph))?);
        ids.push(self.post(NCliquesPropagator::new(graph, k))?);
        self.constraints.push(Constraint::new("n_cliques", ids));
        Ok(())
    }

    /// Ties `graph`'s eventual partition into disjoint anti-arborescences
    /// (one out-arc per non-root node) to the integer variable `k`.
    pub fn n_trees(&mut self, graph: GraphVariable, k: impl IntegerVariable + 'static) -> Result<(), ModelError> {
        let id = self.post(NTreesPropagator::new(graph, k))?;
        self.constraints.push(Constraint::new("n_trees", vec![id]));
        Ok(())
    }

    /// Posts the redundant all-different flow propagator over `variables`,
    /// gated on [`SolverConfig::alldiff_ac`].
    pub fn all_different(&mut self, variables: Vec<impl IntegerVariable + 'static>) -> Result<(), ModelError> {
        if !self.config.alldiff_ac {
            return Ok(());
        }
        let id = self.post(AllDifferentPropagator::new(variables.into_boxed_slice()))?;
        self.constraints.push(Constraint::new("all_different", vec![id]));
        Ok(())
    }

    fn post(
        &mut self,
        propagator: impl crate::engine::cp::propagation::Propagator + 'static,
    ) -> Result<crate::engine::cp::propagation::PropagatorId, ModelError> {
        let id = self.satisfaction_solver.next_propagator_id();
        let name = propagator.name().to_owned();
        self.satisfaction_solver
            .post_propagator(propagator)
            .map_err(|_| ModelError::InfeasibleAtPost(name))?;
        Ok(id)
    }

    // -- Search entry points ---------------------------------------------------

    fn termination_from_config(&self) -> TimeBudget {
        TimeBudget::new(self.config.time_limit, self.config.fail_limit, Arc::clone(&self.interrupted))
    }

    /// Finds one feasible solution, or proves there is none.
    pub fn find_solution(&mut self, brancher: &mut impl Brancher) -> SatisfactionResult {
        let mut termination = self.termination_from_config();
        self.find_solution_with(brancher, &mut termination)
    }

    pub fn find_solution_with(
        &mut self,
        brancher: &mut impl Brancher,
        termination: &mut impl TerminationCondition,
    ) -> SatisfactionResult {
        let found = SearchLoop::new(&mut self.satisfaction_solver).search(brancher, termination);
        if found {
            self.mark_solution_found();
            let solution: Solution = self.satisfaction_solver.get_solution_reference().into();
            brancher.on_solution(solution.as_reference());
            (self.solution_callback)(SolutionCallbackArguments::new(self, &solution, None));
            SatisfactionResult::Satisfiable(solution)
        } else if termination.should_stop() {
            SatisfactionResult::Unknown
        } else {
            SatisfactionResult::Unsatisfiable
        }
    }

    /// Enumerates every feasible solution, calling `on_solution` for each
    /// one: enumeration mode fails the current branch to seek the next
    /// rather than stopping at the first. Stops early once
    /// [`SolverConfig::solution_limit`] is reached or `termination` reports
    /// stop; returns the number of solutions found.
    pub fn find_all_solutions(
        &mut self,
        brancher: &mut impl Brancher,
        mut on_solution: impl FnMut(&Solution),
    ) -> usize {
        let mut termination = self.termination_from_config();
        let mut search = SearchLoop::new(&mut self.satisfaction_solver);
        let mut found = search.search(brancher, &mut termination);
        let mut count = 0usize;

        while found {
            self.first_solution_found.set(true);
            let solution: Solution = search.solver().get_solution_reference().into();
            brancher.on_solution(solution.as_reference());
            on_solution(&solution);
            count += 1;

            if let Some(limit) = self.config.solution_limit {
                if count as u64 >= limit {
                    break;
                }
            }
            found = search.reject_current_and_search(brancher, &mut termination);
        }

        count
    }

    /// Searches for the best value of `objective_variable` according to
    /// [`SolverConfig::optimisation_strategy`]. `is_maximising` selects
    /// between minimising and maximising it.
    pub fn find_optimal(
        &mut self,
        brancher: &mut impl Brancher,
        objective_variable: impl IntegerVariable + 'static,
        is_maximising: bool,
    ) -> OptimisationResult {
        let mut termination = self.termination_from_config();
        let mut procedure = UpperBoundingSearch;
        if is_maximising {
            procedure.maximise(brancher, &mut termination, objective_variable, true, self)
        } else {
            procedure.minimise(brancher, &mut termination, objective_variable, false, self)
        }
    }

    /// Runs [`Self::find_optimal`] with a default [`FirstFailBrancher`],
    /// convenient for callers with no branching preference of their own.
    pub fn find_optimal_default(
        &mut self,
        objective_variable: impl IntegerVariable + 'static,
        is_maximising: bool,
    ) -> OptimisationResult {
        let mut brancher = FirstFailBrancher;
        self.find_optimal(&mut brancher, objective_variable, is_maximising)
    }

    /// Logs the constraints posted and the objective value of a solution
    /// just found, at `info` level.
    pub fn log_statistics_with_objective(&self, objective_value: i64) {
        info!(
            "solution found: objective = {objective_value}, constraints posted = {}",
            self.constraints.len()
        );
    }
}

fn to_boxed_matrix(weights: Vec<Vec<i32>>) -> Box<[Box<[i32]>]> {
    weights.into_iter().map(Vec::into_boxed_slice).collect()
}
