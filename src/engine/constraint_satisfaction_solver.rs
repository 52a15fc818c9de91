//! The propagation engine: owns the trail, the integer and graph domain
//! stores, every posted propagator, and the subscription tables that
//! translate a domain event into the set of propagators woken by it.

use std::collections::HashMap;
use std::rc::Rc;

use crate::basic_types::{Inconsistency, ModelError, PropagationStatusCP};
use crate::engine::cp::assignments_integer::AssignmentsInteger;
use crate::engine::cp::domain_events::DomainEventSet;
use crate::engine::cp::graph::assignments_graph::AssignmentsGraph;
use crate::engine::cp::graph::graph_events::GraphEventSet;
use crate::engine::cp::graph::GraphId;
use crate::engine::cp::propagation::propagation_context::{PropagationContext, PropagationContextMut};
use crate::engine::cp::propagation::{Propagator, PropagatorId, PropagatorInitialisationContext, PropagatorPriority};
use crate::engine::cp::propagator_queue::PropagatorQueue;
use crate::engine::cp::reversible::{Trail, World};
use crate::variables::{DomainId, GraphVariable, IntegerVariable};

struct PostedPropagator {
    propagator: Box<dyn Propagator>,
    priority: PropagatorPriority,
}

/// Owns every piece of reversible state and drives propagation to a fixed
/// point. The search loop (`engine::search`) is the only other thing that
/// calls [`Self::push_world`]/[`Self::pop_world`].
pub struct ConstraintSatisfactionSolver {
    trail: Rc<Trail>,
    assignments: AssignmentsInteger,
    graph: AssignmentsGraph,
    propagators: Vec<PostedPropagator>,
    int_subscriptions: HashMap<DomainId, Vec<(PropagatorId, DomainEventSet)>>,
    graph_subscriptions: HashMap<GraphId, Vec<(PropagatorId, GraphEventSet)>>,
    queue: PropagatorQueue,
}

impl Default for ConstraintSatisfactionSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintSatisfactionSolver {
    pub fn new() -> Self {
        let trail = Rc::new(Trail::new());
        ConstraintSatisfactionSolver {
            assignments: AssignmentsInteger::new(&trail),
            graph: AssignmentsGraph::new(&trail),
            trail,
            propagators: Vec::new(),
            int_subscriptions: HashMap::new(),
            graph_subscriptions: HashMap::new(),
            queue: PropagatorQueue::new(),
        }
    }

    pub fn trail(&self) -> &Rc<Trail> {
        &self.trail
    }

    pub fn assignments(&self) -> &AssignmentsInteger {
        &self.assignments
    }

    pub fn assignments_mut(&mut self) -> &mut AssignmentsInteger {
        &mut self.assignments
    }

    pub fn graph(&self) -> &AssignmentsGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut AssignmentsGraph {
        &mut self.graph
    }

    pub fn new_bounded_variable(&mut self, lb: i32, ub: i32) -> Result<DomainId, ModelError> {
        if lb > ub {
            return Err(ModelError::InvalidBounds { lb, ub });
        }
        Ok(self.assignments.grow_bounded(lb, ub))
    }

    pub fn new_enumerated_variable(&mut self, values: &[i32]) -> Result<DomainId, ModelError> {
        if values.is_empty() {
            return Err(ModelError::EmptyEnumeratedDomain);
        }
        Ok(self.assignments.grow_enumerated(values))
    }

    pub fn new_graph_variable(&mut self, directed: bool, num_nodes: usize) -> Result<GraphVariable, ModelError> {
        let id = self.graph.grow(directed, num_nodes)?;
        Ok(GraphVariable::new(id, num_nodes))
    }

    /// The id [`Self::post_propagator`] will hand the next propagator
    /// posted, so a caller can group several propagators into one
    /// [`crate::engine::constraint::Constraint`] without threading the id
    /// back out of `post_propagator` itself.
    pub fn next_propagator_id(&self) -> PropagatorId {
        PropagatorId(self.propagators.len() as u32)
    }

    /// Posts a propagator: registers its subscriptions via
    /// [`Propagator::initialise_at_root`], then runs it once immediately so
    /// the caller's subsequent [`Self::propagate_to_fixpoint`] call starts
    /// from a consistent queue.
    pub fn post_propagator(&mut self, propagator: impl Propagator + 'static) -> PropagationStatusCP {
        let id = PropagatorId(self.propagators.len() as u32);
        let mut boxed: Box<dyn Propagator> = Box::new(propagator);
        let priority = boxed.priority();

        let mut int_registrations = Vec::new();
        let mut graph_registrations = Vec::new();
        {
            let mut init_context = PropagatorInitialisationContext {
                propagator_id: id,
                registrations: &mut int_registrations,
                graph_registrations: &mut graph_registrations,
            };
            boxed
                .initialise_at_root(&mut init_context)
                .map_err(Inconsistency::new)?;
        }

        for (propagator_id, mask, var) in int_registrations {
            self.int_subscriptions.entry(var).or_default().push((propagator_id, mask));
        }
        for (propagator_id, mask, graph_id) in graph_registrations {
            self.graph_subscriptions
                .entry(graph_id)
                .or_default()
                .push((propagator_id, mask));
        }

        self.propagators.push(PostedPropagator { propagator: boxed, priority });
        self.queue.schedule(id, priority);
        Ok(())
    }

    /// Runs every scheduled propagator, lowest priority tier first,
    /// rescheduling whichever propagators subscribed to whatever domain
    /// changed, until nothing is left to do or a contradiction is found.
    pub fn propagate_to_fixpoint(&mut self) -> PropagationStatusCP {
        while let Some(id) = self.queue.pop() {
            let result = {
                let context = PropagationContextMut::new(&mut self.assignments, &mut self.graph, id);
                self.propagators[id.0 as usize].propagator.propagate(context)
            };
            if let Err(err) = result {
                self.queue.clear();
                return Err(err);
            }
            self.dispatch_events();
        }
        Ok(())
    }

    fn dispatch_events(&mut self) {
        for change in self.assignments.drain_events() {
            if let Some(subscribers) = self.int_subscriptions.get(&change.id) {
                for &(propagator_id, mask) in subscribers {
                    if mask.contains(change.event) {
                        let priority = self.propagators[propagator_id.0 as usize].priority;
                        self.queue.schedule(propagator_id, priority);
                    }
                }
            }
        }
        for change in self.graph.drain_events() {
            if let Some(subscribers) = self.graph_subscriptions.get(&change.id) {
                for &(propagator_id, mask) in subscribers {
                    if mask.contains(change.event) {
                        let priority = self.propagators[propagator_id.0 as usize].priority;
                        self.queue.schedule(propagator_id, priority);
                    }
                }
            }
        }
    }

    pub fn push_world(&mut self) -> World {
        self.trail.push_world()
    }

    pub fn pop_world(&mut self) {
        self.trail.pop_world();
        self.queue.clear();
    }

    pub fn current_world(&self) -> World {
        self.trail.current_world()
    }

    /// Schedules every posted propagator again; used after backtracking to
    /// a world where a decision flips a variable the queue had already
    /// drained past.
    pub fn reschedule_all(&mut self) {
        for (index, posted) in self.propagators.iter().enumerate() {
            self.queue.schedule(PropagatorId(index as u32), posted.priority);
        }
    }

    pub fn get_assigned_integer_value(&self, var: &impl IntegerVariable) -> Option<i32> {
        if var.is_fixed(&self.assignments) {
            Some(var.lower_bound(&self.assignments))
        } else {
            None
        }
    }

    pub fn get_solution_reference(&self) -> crate::basic_types::SolutionReference<'_> {
        crate::basic_types::SolutionReference::new(&self.assignments, &self.graph)
    }

    pub fn context(&self) -> PropagationContext<'_> {
        PropagationContext::new(&self.assignments, &self.graph)
    }
}
