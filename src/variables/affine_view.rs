use crate::basic_types::PropagationStatusCP;
use crate::engine::cp::assignments_integer::AssignmentsInteger;
use crate::predicates::PropositionalConjunction;
use crate::variables::{DomainId, IntegerVariable};

/// `scale * inner + offset`, a non-owning projection over another
/// [`IntegerVariable`] — not a subclass but a projection object that
/// forwards every mutation to its base. `AffineView` itself owns no
/// trailed state at all — every read and write is translated into an
/// equivalent operation on `inner`.
#[derive(Clone)]
pub struct AffineView<Inner> {
    inner: Inner,
    scale: i32,
    offset: i32,
}

impl<Inner> AffineView<Inner> {
    pub fn new(inner: Inner, scale: i32, offset: i32) -> Self {
        assert_ne!(scale, 0, "an affine view with scale 0 is not invertible");
        AffineView { inner, scale, offset }
    }

    fn to_view(&self, inner_value: i32) -> i32 {
        self.scale * inner_value + self.offset
    }
}

fn floor_div(a: i32, b: i32) -> i32 {
    let q = a / b;
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

fn ceil_div(a: i32, b: i32) -> i32 {
    let q = a / b;
    let r = a % b;
    if r != 0 && (r < 0) == (b < 0) {
        q + 1
    } else {
        q
    }
}

impl<Inner: std::fmt::Debug> std::fmt::Debug for AffineView<Inner> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} * {:?} + {}", self.scale, self.inner, self.offset)
    }
}

impl<Inner: IntegerVariable> IntegerVariable for AffineView<Inner> {
    fn lower_bound(&self, assignments: &AssignmentsInteger) -> i32 {
        if self.scale > 0 {
            self.to_view(self.inner.lower_bound(assignments))
        } else {
            self.to_view(self.inner.upper_bound(assignments))
        }
    }

    fn upper_bound(&self, assignments: &AssignmentsInteger) -> i32 {
        if self.scale > 0 {
            self.to_view(self.inner.upper_bound(assignments))
        } else {
            self.to_view(self.inner.lower_bound(assignments))
        }
    }

    fn contains(&self, assignments: &AssignmentsInteger, value: i32) -> bool {
        let shifted = value - self.offset;
        shifted % self.scale == 0 && self.inner.contains(assignments, shifted / self.scale)
    }

    fn next_value(&self, assignments: &AssignmentsInteger, value: i32) -> Option<i32> {
        // Views are not iterated in any hot loop of this engine (they exist
        // for bound-transformation at the model boundary, e.g. a negated
        // objective); a direct scan keeps this correct without needing a
        // reversible cursor of its own.
        let ub = self.upper_bound(assignments);
        let mut candidate = value + 1;
        while candidate <= ub {
            if self.contains(assignments, candidate) {
                return Some(candidate);
            }
            candidate += 1;
        }
        None
    }

    fn previous_value(&self, assignments: &AssignmentsInteger, value: i32) -> Option<i32> {
        let lb = self.lower_bound(assignments);
        let mut candidate = value - 1;
        while candidate >= lb {
            if self.contains(assignments, candidate) {
                return Some(candidate);
            }
            candidate -= 1;
        }
        None
    }

    fn set_lower_bound(
        &self,
        assignments: &mut AssignmentsInteger,
        value: i32,
        reason: &PropositionalConjunction,
    ) -> PropagationStatusCP {
        let shifted = value - self.offset;
        if self.scale > 0 {
            self.inner.set_lower_bound(assignments, ceil_div(shifted, self.scale), reason)
        } else {
            self.inner.set_upper_bound(assignments, floor_div(shifted, self.scale), reason)
        }
    }

    fn set_upper_bound(
        &self,
        assignments: &mut AssignmentsInteger,
        value: i32,
        reason: &PropositionalConjunction,
    ) -> PropagationStatusCP {
        let shifted = value - self.offset;
        if self.scale > 0 {
            self.inner.set_upper_bound(assignments, floor_div(shifted, self.scale), reason)
        } else {
            self.inner.set_lower_bound(assignments, ceil_div(shifted, self.scale), reason)
        }
    }

    fn remove(
        &self,
        assignments: &mut AssignmentsInteger,
        value: i32,
        reason: &PropositionalConjunction,
    ) -> PropagationStatusCP {
        let shifted = value - self.offset;
        if shifted % self.scale != 0 {
            return Ok(());
        }
        self.inner.remove(assignments, shifted / self.scale, reason)
    }

    fn root_domain_ids(&self) -> Vec<DomainId> {
        self.inner.root_domain_ids()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::conjunction;
    use crate::engine::cp::reversible::Trail;

    #[test]
    fn negated_view_tracks_bounds() {
        let trail = Rc::new(Trail::new());
        let mut assignments = AssignmentsInteger::new(&trail);
        let x = assignments.grow_bounded(2, 7);
        let neg = x.scaled(-1);

        assert_eq!(neg.lower_bound(&assignments), -7);
        assert_eq!(neg.upper_bound(&assignments), -2);

        neg.set_upper_bound(&mut assignments, -5, &conjunction!()).unwrap();
        assert_eq!(x.lower_bound(&assignments), 5);
    }
}
