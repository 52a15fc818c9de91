//! The two views onto solver state a propagator can hold: read-only
//! ([`PropagationContext`], used by `is_entailed`) and read-write
//! ([`PropagationContextMut`], used by `propagate`). Both also read graph
//! state since a propagator may mix integer and graph variables.

use crate::basic_types::PropagationStatusCP;
use crate::engine::cp::assignments_integer::AssignmentsInteger;
use crate::engine::cp::graph::assignments_graph::AssignmentsGraph;
use crate::engine::cp::propagation::PropagatorId;
use crate::predicates::PropositionalConjunction;
use crate::variables::IntegerVariable;

/// Read-only access to integer and graph domains, shared by both context
/// flavors below.
pub trait ReadDomains {
    fn lower_bound(&self, var: &impl IntegerVariable) -> i32;
    fn upper_bound(&self, var: &impl IntegerVariable) -> i32;
    fn contains(&self, var: &impl IntegerVariable, value: i32) -> bool;
    fn is_fixed(&self, var: &impl IntegerVariable) -> bool {
        self.lower_bound(var) == self.upper_bound(var)
    }
    fn assignments(&self) -> &AssignmentsInteger;
    fn graph(&self) -> &AssignmentsGraph;
}

/// Snapshot used by [`super::Propagator::is_entailed`] and other read-only
/// queries; cannot mutate domains.
pub struct PropagationContext<'a> {
    assignments: &'a AssignmentsInteger,
    graph: &'a AssignmentsGraph,
}

impl<'a> PropagationContext<'a> {
    pub fn new(assignments: &'a AssignmentsInteger, graph: &'a AssignmentsGraph) -> Self {
        PropagationContext { assignments, graph }
    }
}

impl<'a> ReadDomains for PropagationContext<'a> {
    fn lower_bound(&self, var: &impl IntegerVariable) -> i32 {
        var.lower_bound(self.assignments)
    }

    fn upper_bound(&self, var: &impl IntegerVariable) -> i32 {
        var.upper_bound(self.assignments)
    }

    fn contains(&self, var: &impl IntegerVariable, value: i32) -> bool {
        var.contains(self.assignments, value)
    }

    fn assignments(&self) -> &AssignmentsInteger {
        self.assignments
    }

    fn graph(&self) -> &AssignmentsGraph {
        self.graph
    }
}

/// The handle passed to [`super::Propagator::propagate`]. Every mutator
/// takes an owned [`PropositionalConjunction`] (matching the
/// `conjunction!()` call-site idiom) naming this propagator as the
/// producer.
pub struct PropagationContextMut<'a> {
    assignments: &'a mut AssignmentsInteger,
    graph: &'a mut AssignmentsGraph,
    propagator_id: PropagatorId,
}

impl<'a> PropagationContextMut<'a> {
    pub fn new(
        assignments: &'a mut AssignmentsInteger,
        graph: &'a mut AssignmentsGraph,
        propagator_id: PropagatorId,
    ) -> Self {
        PropagationContextMut {
            assignments,
            graph,
            propagator_id,
        }
    }

    pub fn propagator_id(&self) -> PropagatorId {
        self.propagator_id
    }

    pub fn as_readonly(&self) -> PropagationContext<'_> {
        PropagationContext {
            assignments: self.assignments,
            graph: self.graph,
        }
    }

    pub fn set_lower_bound(
        &mut self,
        var: &impl IntegerVariable,
        value: i32,
        reason: PropositionalConjunction,
    ) -> PropagationStatusCP {
        var.set_lower_bound(self.assignments, value, &reason)
    }

    pub fn set_upper_bound(
        &mut self,
        var: &impl IntegerVariable,
        value: i32,
        reason: PropositionalConjunction,
    ) -> PropagationStatusCP {
        var.set_upper_bound(self.assignments, value, &reason)
    }

    pub fn remove(
        &mut self,
        var: &impl IntegerVariable,
        value: i32,
        reason: PropositionalConjunction,
    ) -> PropagationStatusCP {
        var.remove(self.assignments, value, &reason)
    }

    pub fn instantiate_to(
        &mut self,
        var: &impl IntegerVariable,
        value: i32,
        reason: PropositionalConjunction,
    ) -> PropagationStatusCP {
        var.instantiate_to(self.assignments, value, &reason)
    }

    pub fn graph_mut(&mut self) -> &mut AssignmentsGraph {
        self.graph
    }
}

impl<'a> ReadDomains for PropagationContextMut<'a> {
    fn lower_bound(&self, var: &impl IntegerVariable) -> i32 {
        var.lower_bound(self.assignments)
    }

    fn upper_bound(&self, var: &impl IntegerVariable) -> i32 {
        var.upper_bound(self.assignments)
    }

    fn contains(&self, var: &impl IntegerVariable, value: i32) -> bool {
        var.contains(self.assignments, value)
    }

    fn assignments(&self) -> &AssignmentsInteger {
        self.assignments
    }

    fn graph(&self) -> &AssignmentsGraph {
        self.graph
    }
}
