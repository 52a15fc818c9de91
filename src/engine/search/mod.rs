//! The search loop: `READY -> DOWN_BRANCH -> UP_BRANCH -> STOP`.
//! A decision stack of applied [`Decision`]s lets `UP_BRANCH` undo exactly
//! one world per failed branch, matching the trail's own per-world undo
//! granularity.

use crate::branching::{Brancher, Decision};
use crate::engine::constraint_satisfaction_solver::ConstraintSatisfactionSolver;
use crate::predicates::PropositionalConjunction;
use crate::termination::TerminationCondition;

pub struct SearchLoop<'a> {
    solver: &'a mut ConstraintSatisfactionSolver,
    decisions: Vec<Decision>,
}

impl<'a> SearchLoop<'a> {
    pub fn new(solver: &'a mut ConstraintSatisfactionSolver) -> Self {
        SearchLoop { solver, decisions: Vec::new() }
    }

    /// Runs until a solution is found, the search space is exhausted, or
    /// `termination` reports stop. `Ok(true)` means a solution sits in the
    /// solver's current (uncommitted) world; the caller must read it out
    /// before the next call to `search` backtracks past it.
    pub fn search(
        &mut self,
        brancher: &mut impl Brancher,
        termination: &mut impl TerminationCondition,
    ) -> bool {
        loop {
            if termination.should_stop() {
                self.unwind_to_root();
                return false;
            }

            match self.solver.propagate_to_fixpoint() {
                Ok(()) => match brancher.next_decision(self.solver) {
                    Some(decision) => {
                        if !self.down_branch(decision) && !self.up_branch(termination) {
                            return false;
                        }
                    }
                    None => return true,
                },
                Err(_) => {
                    termination.record_fail();
                    if !self.up_branch(termination) {
                        return false;
                    }
                }
            }
        }
    }

    /// Pushes a world and applies `decision`. Returns `false` if applying it
    /// contradicted immediately (e.g. excluding a domain's last remaining
    /// value), in which case no propagator ever saw the contradiction and
    /// the caller must fall through to [`Self::up_branch`] itself.
    fn down_branch(&mut self, decision: Decision) -> bool {
        self.solver.push_world();
        self.decisions.push(decision);
        self.apply(decision)
    }

    /// Undoes the failed branch and tries its sibling. A branch whose
    /// sibling was already tried (it *is* the sibling) means this whole
    /// choice point is exhausted, so the search keeps climbing. Returns
    /// `false` once every choice point is exhausted.
    fn up_branch(&mut self, termination: &mut impl TerminationCondition) -> bool {
        loop {
            let Some(decision) = self.decisions.pop() else {
                return false;
            };
            self.solver.pop_world();

            let already_tried_both_sides = matches!(
                decision,
                Decision::ExcludeArc { .. } | Decision::ExcludeInt { .. }
            );
            if already_tried_both_sides {
                continue;
            }

            if self.down_branch(decision.negate()) {
                return true;
            }
            // The negated decision also contradicted immediately; keep
            // climbing rather than returning a world with a broken domain.
            termination.record_fail();
        }
    }

    fn unwind_to_root(&mut self) {
        while self.decisions.pop().is_some() {
            self.solver.pop_world();
        }
    }

    /// Pops back to world 0, discarding every decision. Restarting never
    /// replays decisions; the brancher simply starts over.
    pub fn restart(&mut self) {
        self.unwind_to_root();
    }

    pub fn solver(&self) -> &ConstraintSatisfactionSolver {
        self.solver
    }

    /// Commits `decision`, reporting `false` on an immediate contradiction.
    fn apply(&mut self, decision: Decision) -> bool {
        match decision {
            Decision::FixInt { var, value } => self
                .solver
                .assignments()
                .instantiate_to(var, value, &PropositionalConjunction::default())
                .is_ok(),
            Decision::ExcludeInt { var, value } => self
                .solver
                .assignments()
                .remove_value(var, value, &PropositionalConjunction::default())
                .is_ok(),
            Decision::IncludeArc { graph, from, to } => {
                self.solver.graph_mut().add_arc(graph, from, to).is_ok()
            }
            Decision::ExcludeArc { graph, from, to } => {
                self.solver.graph_mut().remove_arc(graph, from, to).is_ok()
            }
        }
    }

    pub fn decision_depth(&self) -> usize {
        self.decisions.len()
    }

    /// Called after a solution has been recorded, to look for the next one.
    /// Enumeration mode fails the current branch to seek the next: this
    /// backtracks past the leaf that produced the solution just found, then
    /// resumes the ordinary search loop.
    pub fn reject_current_and_search(
        &mut self,
        brancher: &mut impl Brancher,
        termination: &mut impl TerminationCondition,
    ) -> bool {
        if !self.up_branch(termination) {
            return false;
        }
        self.search(brancher, termination)
    }
}
