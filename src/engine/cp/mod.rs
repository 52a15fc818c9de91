//! The constraint-programming core: trailed reversible state, the integer
//! and graph domain stores, the event vocabulary, and the propagator
//! contract.

pub mod assignments_integer;
pub mod domain_events;
pub mod graph;
pub mod propagation;
pub mod propagator_queue;
pub mod reversible;
