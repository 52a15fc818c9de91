//! The explanation recorder: every domain mutation may be recorded as a
//! tuple `(variable, event, value, cause)` through a sink. The default sink
//! discards; a learning sink keeps per-event reasons for later nogood
//! extraction. Soundness never depends on this: every propagator in
//! `propagators/` implements `why` only via
//! [`crate::engine::cp::propagation::Propagator`]'s empty-conjunction
//! default, since explanations are never required for soundness, only for
//! learning-based search, so today [`NoOpSink`] is the only sink actually
//! wired up; [`LearningSink`] exists as the seam a learning search would
//! plug into.

use crate::engine::cp::propagation::PropagatorId;
use crate::predicates::IntegerPredicate;

/// One recorded domain mutation: the fact asserted, and which propagator
/// (or the search loop, for a decision) caused it.
#[derive(Debug, Clone, Copy)]
pub struct ExplanationEntry {
    pub predicate: IntegerPredicate,
    pub cause: PropagatorId,
}

pub trait ExplanationSink {
    fn record(&mut self, entry: ExplanationEntry);
}

/// Throws every entry away; the default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl ExplanationSink for NoOpSink {
    fn record(&mut self, _entry: ExplanationEntry) {}
}

/// Keeps every entry in arrival order.
#[derive(Debug, Clone, Default)]
pub struct LearningSink {
    entries: Vec<ExplanationEntry>,
}

impl LearningSink {
    pub fn entries(&self) -> &[ExplanationEntry] {
        &self.entries
    }
}

impl ExplanationSink for LearningSink {
    fn record(&mut self, entry: ExplanationEntry) {
        self.entries.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::DomainId;

    #[test]
    fn learning_sink_keeps_entries_in_order() {
        let mut sink = LearningSink::default();
        let id = DomainId::new(0);
        sink.record(ExplanationEntry {
            predicate: IntegerPredicate::LowerBound { id, lower_bound: 3 },
            cause: PropagatorId(0),
        });
        sink.record(ExplanationEntry {
            predicate: IntegerPredicate::UpperBound { id, upper_bound: 5 },
            cause: PropagatorId(1),
        });

        assert_eq!(sink.entries().len(), 2);
        assert_eq!(sink.entries()[0].cause, PropagatorId(1 - 1));
    }
}
