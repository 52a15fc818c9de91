//! The integer domain store.
//!
//! Every root integer variable's domain lives here, either in *bounded*
//! form (a reversible `[lb, ub]` interval, the common case) or *enumerated*
//! form (a [`ReversibleSparseSet`] that can carry holes). [`AffineView`] and
//! [`SumView`] never allocate a slot here; they are projections that forward
//! every mutation to the variables they are built from.
//!
//! [`AffineView`]: crate::variables::AffineView
//! [`SumView`]: crate::variables::SumView

use std::cell::RefCell;
use std::rc::Rc;

use crate::basic_types::{ConflictReason, Inconsistency, PropagationStatusCP};
use crate::conjunction;
use crate::engine::cp::domain_events::{classify_change, IntDomainEvent};
use crate::engine::cp::reversible::{Reversible, ReversibleSparseSet, Trail};
use crate::predicates::PropositionalConjunction;
use crate::variables::DomainId;

enum DomainRepresentation {
    Bounded {
        lb: Reversible<i32>,
        ub: Reversible<i32>,
    },
    Enumerated {
        set: ReversibleSparseSet,
    },
}

/// A change recorded by a successful mutation, queued for the engine to
/// translate into propagator scheduling.
#[derive(Debug, Clone, Copy)]
pub struct DomainChange {
    pub id: DomainId,
    pub event: IntDomainEvent,
}

pub struct AssignmentsInteger {
    trail: Rc<Trail>,
    domains: Vec<DomainRepresentation>,
    pending_events: RefCell<Vec<DomainChange>>,
}

impl AssignmentsInteger {
    pub fn new(trail: &Rc<Trail>) -> Self {
        AssignmentsInteger {
            trail: Rc::clone(trail),
            domains: Vec::new(),
            pending_events: RefCell::new(Vec::new()),
        }
    }

    pub fn num_variables(&self) -> usize {
        self.domains.len()
    }

    pub fn grow_bounded(&mut self, lb: i32, ub: i32) -> DomainId {
        let id = DomainId::new(self.domains.len() as u32);
        self.domains.push(DomainRepresentation::Bounded {
            lb: Reversible::new(&self.trail, lb),
            ub: Reversible::new(&self.trail, ub),
        });
        id
    }

    /// `values` need not be sorted or deduplicated.
    pub fn grow_enumerated(&mut self, values: &[i32]) -> DomainId {
        let min = *values.iter().min().expect("enumerated domain must be non-empty");
        let max = *values.iter().max().expect("enumerated domain must be non-empty");
        let set = ReversibleSparseSet::new_full(&self.trail, min, max);
        for v in min..=max {
            if !values.contains(&v) {
                let _ = set.remove(v);
            }
        }
        let id = DomainId::new(self.domains.len() as u32);
        self.domains.push(DomainRepresentation::Enumerated { set });
        id
    }

    pub fn has_enumerated_domain(&self, id: DomainId) -> bool {
        matches!(self.domains[id.id as usize], DomainRepresentation::Enumerated { .. })
    }

    pub fn lower_bound(&self, id: DomainId) -> i32 {
        match &self.domains[id.id as usize] {
            DomainRepresentation::Bounded { lb, .. } => lb.get(),
            DomainRepresentation::Enumerated { set } => set.min_value().expect("domain must be non-empty"),
        }
    }

    pub fn upper_bound(&self, id: DomainId) -> i32 {
        match &self.domains[id.id as usize] {
            DomainRepresentation::Bounded { ub, .. } => ub.get(),
            DomainRepresentation::Enumerated { set } => set.max_value().expect("domain must be non-empty"),
        }
    }

    pub fn contains(&self, id: DomainId, value: i32) -> bool {
        match &self.domains[id.id as usize] {
            DomainRepresentation::Bounded { lb, ub } => value >= lb.get() && value <= ub.get(),
            DomainRepresentation::Enumerated { set } => set.contains(value),
        }
    }

    pub fn size(&self, id: DomainId) -> u64 {
        match &self.domains[id.id as usize] {
            DomainRepresentation::Bounded { lb, ub } => (ub.get() - lb.get() + 1).max(0) as u64,
            DomainRepresentation::Enumerated { set } => set.size() as u64,
        }
    }

    pub fn is_fixed(&self, id: DomainId) -> bool {
        self.size(id) == 1
    }

    pub fn next_value(&self, id: DomainId, value: i32) -> Option<i32> {
        match &self.domains[id.id as usize] {
            DomainRepresentation::Bounded { lb, ub } => {
                let candidate = value + 1;
                (candidate >= lb.get() && candidate <= ub.get()).then_some(candidate)
            }
            DomainRepresentation::Enumerated { set } => set.next_value(value),
        }
    }

    pub fn previous_value(&self, id: DomainId, value: i32) -> Option<i32> {
        match &self.domains[id.id as usize] {
            DomainRepresentation::Bounded { lb, ub } => {
                let candidate = value - 1;
                (candidate >= lb.get() && candidate <= ub.get()).then_some(candidate)
            }
            DomainRepresentation::Enumerated { set } => set.previous_value(value),
        }
    }

    /// Drains the events produced since the last drain.
    pub fn drain_events(&self) -> Vec<DomainChange> {
        self.pending_events.borrow_mut().drain(..).collect()
    }

    fn record(&self, id: DomainId, event: IntDomainEvent) {
        self.pending_events.borrow_mut().push(DomainChange { id, event });
    }

    pub fn tighten_lower_bound(&self, id: DomainId, new_lb: i32, _reason: &PropositionalConjunction) -> PropagationStatusCP {
        let old_lb = self.lower_bound(id);
        if new_lb <= old_lb {
            return Ok(());
        }
        let ub = self.upper_bound(id);
        if new_lb > ub {
            return Err(Inconsistency::new(conjunction!()));
        }
        match &self.domains[id.id as usize] {
            DomainRepresentation::Bounded { lb, .. } => lb.set(new_lb),
            DomainRepresentation::Enumerated { set } => {
                let mut v = set.min_value().expect("non-empty");
                while v < new_lb {
                    let _ = set.remove(v);
                    v = match set.min_value() {
                        Some(next) => next,
                        None => return Err(Inconsistency::new(conjunction!())),
                    };
                }
            }
        }
        let became_fixed = self.is_fixed(id);
        self.record(id, classify_change(true, new_lb == ub, false, became_fixed));
        Ok(())
    }

    pub fn tighten_upper_bound(&self, id: DomainId, new_ub: i32, _reason: &PropositionalConjunction) -> PropagationStatusCP {
        let old_ub = self.upper_bound(id);
        if new_ub >= old_ub {
            return Ok(());
        }
        let lb = self.lower_bound(id);
        if new_ub < lb {
            return Err(Inconsistency::new(conjunction!()));
        }
        match &self.domains[id.id as usize] {
            DomainRepresentation::Bounded { ub, .. } => ub.set(new_ub),
            DomainRepresentation::Enumerated { set } => {
                let mut v = set.max_value().expect("non-empty");
                while v > new_ub {
                    let _ = set.remove(v);
                    v = match set.max_value() {
                        Some(next) => next,
                        None => return Err(Inconsistency::new(conjunction!())),
                    };
                }
            }
        }
        let became_fixed = self.is_fixed(id);
        self.record(id, classify_change(new_ub == lb, true, false, became_fixed));
        Ok(())
    }

    pub fn remove_value(&self, id: DomainId, value: i32, _reason: &PropositionalConjunction) -> PropagationStatusCP {
        if !self.contains(id, value) {
            return Ok(());
        }
        let lb = self.lower_bound(id);
        let ub = self.upper_bound(id);

        match &self.domains[id.id as usize] {
            DomainRepresentation::Bounded { lb: lbc, ub: ubc } => {
                // For bounded domains, removal is only legal at a bound.
                if value == lb {
                    if lb == ub {
                        return Err(Inconsistency::new(conjunction!()));
                    }
                    lbc.set(lb + 1);
                    let became_fixed = self.is_fixed(id);
                    self.record(id, classify_change(true, false, false, became_fixed));
                } else if value == ub {
                    if lb == ub {
                        return Err(Inconsistency::new(conjunction!()));
                    }
                    ubc.set(ub - 1);
                    let became_fixed = self.is_fixed(id);
                    self.record(id, classify_change(false, true, false, became_fixed));
                } else {
                    debug_assert!(
                        false,
                        "remove_value on a bounded domain is only legal at a bound"
                    );
                }
            }
            DomainRepresentation::Enumerated { set } => {
                if set.size() == 1 {
                    return Err(Inconsistency::new(conjunction!()));
                }
                let _ = set.remove(value);
                let new_lb = set.min_value().expect("non-empty");
                let new_ub = set.max_value().expect("non-empty");
                let became_fixed = self.is_fixed(id);
                self.record(
                    id,
                    classify_change(new_lb != lb, new_ub != ub, new_lb == lb && new_ub == ub, became_fixed),
                );
            }
        }
        Ok(())
    }

    pub fn remove_interval(&self, id: DomainId, low: i32, high: i32, reason: &PropositionalConjunction) -> PropagationStatusCP {
        if high < low {
            return Ok(());
        }
        let lb = self.lower_bound(id);
        let ub = self.upper_bound(id);
        if high < lb || low > ub {
            return Ok(());
        }

        if !self.has_enumerated_domain(id) {
            if low <= lb && high >= ub {
                return Err(Inconsistency::new(conjunction!()));
            }
            if low <= lb {
                return self.tighten_lower_bound(id, high + 1, reason);
            }
            if high >= ub {
                return self.tighten_upper_bound(id, low - 1, reason);
            }
            debug_assert!(
                false,
                "remove_interval on a bounded domain must touch a bound"
            );
            return Ok(());
        }

        for v in low.max(lb)..=high.min(ub) {
            self.remove_value(id, v, reason)?;
        }
        Ok(())
    }

    pub fn instantiate_to(&self, id: DomainId, value: i32, _reason: &PropositionalConjunction) -> PropagationStatusCP {
        if !self.contains(id, value) {
            return Err(Inconsistency::new(conjunction!()));
        }
        if self.is_fixed(id) {
            // Already instantiated to `value` (the only way `contains` and
            // `is_fixed` can both hold); no-op, no event.
            return Ok(());
        }
        match &self.domains[id.id as usize] {
            DomainRepresentation::Bounded { lb, ub } => {
                lb.set(value);
                ub.set(value);
            }
            DomainRepresentation::Enumerated { set } => {
                for v in set.iter().collect::<Vec<_>>() {
                    if v != value {
                        let _ = set.remove(v);
                    }
                }
            }
        }
        self.record(id, IntDomainEvent::Instantiate);
        Ok(())
    }
}

impl std::fmt::Debug for AssignmentsInteger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssignmentsInteger")
            .field("num_variables", &self.num_variables())
            .finish()
    }
}

/// Used by [`ConflictReason`] call sites that want a quick tag without
/// constructing a full explanation; kept as a thin documentation bridge
/// to the predicate-based explanations actually stored.
pub fn reason_tag_for(_event: IntDomainEvent) -> ConflictReason {
    ConflictReason::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> (Rc<Trail>, AssignmentsInteger) {
        let trail = Rc::new(Trail::new());
        let assignments = AssignmentsInteger::new(&trail);
        (trail, assignments)
    }

    #[test]
    fn bounded_round_trip_through_backtrack() {
        let (trail, mut assignments) = fresh();
        let x = assignments.grow_bounded(0, 5);

        trail.push_world();
        assignments.tighten_lower_bound(x, 3, &conjunction!()).unwrap();
        assert_eq!(assignments.lower_bound(x), 3);

        trail.pop_world();
        assert_eq!(assignments.lower_bound(x), 0);
    }

    #[test]
    fn crossing_bounds_is_a_contradiction() {
        let (_trail, mut assignments) = fresh();
        let x = assignments.grow_bounded(0, 5);
        assert!(assignments.tighten_lower_bound(x, 6, &conjunction!()).is_err());
    }

    #[test]
    fn enumerated_domain_removal() {
        let (trail, mut assignments) = fresh();
        let x = assignments.grow_enumerated(&[1, 3, 5, 7]);
        assert_eq!(assignments.size(x), 4);

        trail.push_world();
        assignments.remove_value(x, 3, &conjunction!()).unwrap();
        assert!(!assignments.contains(x, 3));
        assert_eq!(assignments.size(x), 3);

        trail.pop_world();
        assert!(assignments.contains(x, 3));
        assert_eq!(assignments.size(x), 4);
    }

    #[test]
    fn instantiate_emits_single_event() {
        let (_trail, mut assignments) = fresh();
        let x = assignments.grow_bounded(0, 5);
        assignments.instantiate_to(x, 2, &conjunction!()).unwrap();
        let events = assignments.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].event, IntDomainEvent::Instantiate));
    }
}
