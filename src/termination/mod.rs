//! Search-stopping conditions: wall-clock deadlines, fail counters, and
//! solution-count limits.

use std::time::{Duration, Instant};

/// Polled by the search loop between decisions; once it reports `true` the
/// loop stops at the next safe point and reports the best solution found so
/// far rather than the true optimum.
pub trait TerminationCondition {
    fn should_stop(&mut self) -> bool;

    /// Called by the search loop each time a branch fails, on its way back
    /// up; conditions with no fail counter leave this a no-op.
    fn record_fail(&mut self) {}
}

/// Never stops; used by `find_solution` when no limits are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Indefinite;

impl TerminationCondition for Indefinite {
    fn should_stop(&mut self) -> bool {
        false
    }
}

/// Combines a wall-clock deadline, a fail counter, and a cooperative
/// interruption flag (`SIGINT` sets the flag this reads).
#[derive(Debug)]
pub struct TimeBudget {
    deadline: Option<Instant>,
    fail_limit: Option<u64>,
    fails_seen: u64,
    interrupted: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl TimeBudget {
    pub fn new(
        time_limit: Option<Duration>,
        fail_limit: Option<u64>,
        interrupted: std::sync::Arc<std::sync::atomic::AtomicBool>,
    ) -> Self {
        TimeBudget {
            deadline: time_limit.map(|d| Instant::now() + d),
            fail_limit,
            fails_seen: 0,
            interrupted,
        }
    }
}

impl TerminationCondition for TimeBudget {
    fn should_stop(&mut self) -> bool {
        if self.interrupted.load(std::sync::atomic::Ordering::Relaxed) {
            return true;
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return true;
            }
        }
        if let Some(limit) = self.fail_limit {
            if self.fails_seen >= limit {
                return true;
            }
        }
        false
    }

    fn record_fail(&mut self) {
        self.fails_seen += 1;
    }
}
