//! Linear SAT-UNSAT / upper-bounding search: find a solution, tighten an
//! objective cut to exclude anything no better, repeat until the cut
//! itself is unsatisfiable.
//!
//! Every improving solution restarts the search to the root before applying
//! the cut: `search` returns with the solution sitting in its own
//! temporary [`crate::engine::search::SearchLoop`]'s uncommitted leaf
//! world, and that loop is dropped without unwinding, so popping back to
//! world 0 is this module's own job, not something a freshly constructed
//! `SearchLoop` (whose empty decision stack makes its own `restart()` a
//! no-op) could do on our behalf.
//! [`crate::engine::solver_config::SolverConfig::restart_on_solution`]
//! being `false` would, in principle, instead resume from the leaf that
//! produced the solution — not implemented here because doing so needs the
//! same `SearchLoop` borrow alive across the call into
//! [`crate::Solver::log_statistics_with_objective`]/the solution callback,
//! both of which need `&Solver` while the loop holds
//! `&mut solver.satisfaction_solver`. Restarting is always correct, only
//! sometimes slower, so it is used unconditionally (see `DESIGN.md`).

use crate::branching::Brancher;
use crate::conjunction;
use crate::engine::search::SearchLoop;
use crate::optimisation::OptimisationProcedure;
use crate::results::{OptimisationResult, Solution};
use crate::termination::TerminationCondition;
use crate::variables::IntegerVariable;
use crate::Solver;

#[derive(Debug, Clone, Copy, Default)]
pub struct UpperBoundingSearch;

impl OptimisationProcedure for UpperBoundingSearch {
    fn minimise(
        &mut self,
        brancher: &mut impl Brancher,
        termination: &mut impl TerminationCondition,
        objective_variable: impl IntegerVariable,
        _is_maximising: bool,
        solver: &mut Solver,
    ) -> OptimisationResult {
        let mut best_solution: Option<Solution> = None;
        let mut best_objective_value: i64 = 0;

        loop {
            let found = SearchLoop::new(&mut solver.satisfaction_solver).search(brancher, termination);
            if !found {
                return match best_solution {
                    Some(solution) => OptimisationResult::Optimal {
                        solution,
                        objective_value: best_objective_value,
                    },
                    None if termination.should_stop() => OptimisationResult::Unknown,
                    None => OptimisationResult::Unsatisfiable,
                };
            }

            let mut solution = Solution::default();
            self.update_best_solution_and_process(
                1,
                &objective_variable,
                &mut best_objective_value,
                &mut solution,
                brancher,
                solver,
            );
            best_solution = Some(solution);

            // `search`'s own `SearchLoop` was dropped without unwinding (by
            // design: the solution sits in its uncommitted leaf world, see
            // the module doc), so the cut below must pop back to world 0
            // itself rather than hand that job to a fresh `SearchLoop` —
            // one constructed here would have an empty decision stack and
            // its `restart()` would pop nothing, leaving `cost` still
            // fixed to the solution just found and the cut vacuously
            // unsatisfiable every time.
            while solver.satisfaction_solver.current_world() > 0 {
                solver.satisfaction_solver.pop_world();
            }
            let cut = match (best_objective_value - 1).try_into() {
                Ok(cut) => cut,
                Err(_) => i32::MIN,
            };
            let reason = conjunction!();
            if objective_variable
                .set_upper_bound(solver.satisfaction_solver.assignments_mut(), cut, &reason)
                .is_err()
            {
                return OptimisationResult::Optimal {
                    solution: best_solution.expect("set just above"),
                    objective_value: best_objective_value,
                };
            }
        }
    }
}
