use crate::basic_types::PropagationStatusCP;
use crate::engine::cp::assignments_integer::AssignmentsInteger;
use crate::predicates::PropositionalConjunction;
use crate::variables::{AffineView, DomainId};

/// The contract every integer-valued variable (root or view) implements —
/// a view follows the same contract as a standalone integer variable.
///
/// A propagator is generic over `Var: IntegerVariable` and never needs to
/// know whether it is holding a root [`DomainId`], an [`AffineView`], or a
/// [`super::SumView`] — reads and writes are forwarded transparently to
/// whatever backs the view.
pub trait IntegerVariable: Clone + std::fmt::Debug {
    fn lower_bound(&self, assignments: &AssignmentsInteger) -> i32;
    fn upper_bound(&self, assignments: &AssignmentsInteger) -> i32;
    fn contains(&self, assignments: &AssignmentsInteger, value: i32) -> bool;
    fn next_value(&self, assignments: &AssignmentsInteger, value: i32) -> Option<i32>;
    fn previous_value(&self, assignments: &AssignmentsInteger, value: i32) -> Option<i32>;

    fn is_fixed(&self, assignments: &AssignmentsInteger) -> bool {
        self.lower_bound(assignments) == self.upper_bound(assignments)
    }

    fn set_lower_bound(
        &self,
        assignments: &mut AssignmentsInteger,
        value: i32,
        reason: &PropositionalConjunction,
    ) -> PropagationStatusCP;

    fn set_upper_bound(
        &self,
        assignments: &mut AssignmentsInteger,
        value: i32,
        reason: &PropositionalConjunction,
    ) -> PropagationStatusCP;

    fn remove(
        &self,
        assignments: &mut AssignmentsInteger,
        value: i32,
        reason: &PropositionalConjunction,
    ) -> PropagationStatusCP;

    fn instantiate_to(
        &self,
        assignments: &mut AssignmentsInteger,
        value: i32,
        reason: &PropositionalConjunction,
    ) -> PropagationStatusCP {
        self.set_lower_bound(assignments, value, reason)?;
        self.set_upper_bound(assignments, value, reason)
    }

    /// The root domains this view ultimately reads and writes through,
    /// used to build the subscription table.
    fn root_domain_ids(&self) -> Vec<DomainId>;

    /// `self * scale`.
    fn scaled(&self, scale: i32) -> AffineView<Self>
    where
        Self: Sized,
    {
        AffineView::new(self.clone(), scale, 0)
    }

    /// `self + offset`.
    fn offset(&self, offset: i32) -> AffineView<Self>
    where
        Self: Sized,
    {
        AffineView::new(self.clone(), 1, offset)
    }
}

impl IntegerVariable for DomainId {
    fn lower_bound(&self, assignments: &AssignmentsInteger) -> i32 {
        assignments.lower_bound(*self)
    }

    fn upper_bound(&self, assignments: &AssignmentsInteger) -> i32 {
        assignments.upper_bound(*self)
    }

    fn contains(&self, assignments: &AssignmentsInteger, value: i32) -> bool {
        assignments.contains(*self, value)
    }

    fn next_value(&self, assignments: &AssignmentsInteger, value: i32) -> Option<i32> {
        assignments.next_value(*self, value)
    }

    fn previous_value(&self, assignments: &AssignmentsInteger, value: i32) -> Option<i32> {
        assignments.previous_value(*self, value)
    }

    fn set_lower_bound(
        &self,
        assignments: &mut AssignmentsInteger,
        value: i32,
        reason: &PropositionalConjunction,
    ) -> PropagationStatusCP {
        assignments.tighten_lower_bound(*self, value, reason)
    }

    fn set_upper_bound(
        &self,
        assignments: &mut AssignmentsInteger,
        value: i32,
        reason: &PropositionalConjunction,
    ) -> PropagationStatusCP {
        assignments.tighten_upper_bound(*self, value, reason)
    }

    fn remove(
        &self,
        assignments: &mut AssignmentsInteger,
        value: i32,
        reason: &PropositionalConjunction,
    ) -> PropagationStatusCP {
        assignments.remove_value(*self, value, reason)
    }

    fn instantiate_to(
        &self,
        assignments: &mut AssignmentsInteger,
        value: i32,
        reason: &PropositionalConjunction,
    ) -> PropagationStatusCP {
        assignments.instantiate_to(*self, value, reason)
    }

    fn root_domain_ids(&self) -> Vec<DomainId> {
        vec![*self]
    }
}
