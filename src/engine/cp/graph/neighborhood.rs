//! Per-node adjacency, one instance for the envelope (shrinks) and one for
//! the kernel (grows) of a single graph variable. Exposes
//! `first_element`/`next_element`-style cursors rather than allocating
//! iterators on every query.
//!
//! The two monotonicity directions get different underlying structures, the
//! same split the rest of this crate makes between [`super::super::reversible::ReversibleSparseSet`]
//! (shrinking domains) and [`super::super::reversible::ReversibleBitSet`] (growing membership):
//! envelope neighbors live in a sparse set so removal is O(1) and
//! self-inverse on backtrack, kernel neighbors live in a bitset so growth is
//! a single word write.

use std::rc::Rc;

use crate::engine::cp::reversible::{ReversibleBitSet, ReversibleSparseSet, Trail};

/// One node's envelope (possible successors) and kernel (mandatory
/// successors) neighbor sets.
pub struct Neighborhood {
    envelope: ReversibleSparseSet,
    kernel: ReversibleBitSet,
}

impl Neighborhood {
    pub fn new(trail: &Rc<Trail>, num_nodes: usize) -> Self {
        Neighborhood {
            envelope: ReversibleSparseSet::new_full(trail, 0, num_nodes as i32 - 1),
            kernel: ReversibleBitSet::new(trail, num_nodes),
        }
    }

    pub fn envelope_contains(&self, node: usize) -> bool {
        self.envelope.contains(node as i32)
    }

    pub fn kernel_contains(&self, node: usize) -> bool {
        self.kernel.contains(node)
    }

    /// Removes `node` from the envelope. Returns `true` if it was present
    /// (and is now gone); a caller must reject removing a node that is
    /// already in the kernel before calling this, to preserve the kernel
    /// ⊆ envelope invariant.
    pub fn remove_from_envelope(&mut self, node: usize) -> bool {
        self.envelope.remove(node as i32)
    }

    /// Moves `node` into the kernel. The node must already be in the
    /// envelope (caller's responsibility, per the kernel ⊆ envelope
    /// invariant).
    pub fn add_to_kernel(&mut self, node: usize) -> bool {
        self.kernel.set(node)
    }

    pub fn envelope_size(&self) -> usize {
        self.envelope.size()
    }

    pub fn kernel_size(&self) -> usize {
        self.kernel.count_ones()
    }

    pub fn envelope_iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.envelope.iter().map(|v| v as usize)
    }

    pub fn kernel_iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.kernel.iter()
    }

    /// `first_element`/`next_element` cursor pair over the envelope:
    /// `next_envelope_after(None)` starts the walk.
    pub fn next_envelope_after(&self, after: Option<usize>) -> Option<usize> {
        match after {
            None => self.envelope.min_value().map(|v| v as usize),
            Some(node) => self.envelope.next_value(node as i32).map(|v| v as usize),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_stays_subset_of_envelope_across_backtrack() {
        let trail = Rc::new(Trail::new());
        let mut n = Neighborhood::new(&trail, 4);
        assert!(n.envelope_contains(2));
        assert!(!n.kernel_contains(2));

        trail.push_world();
        assert!(n.remove_from_envelope(0));
        assert!(n.add_to_kernel(2));
        assert_eq!(n.envelope_size(), 3);
        assert_eq!(n.kernel_size(), 1);

        trail.pop_world();
        assert_eq!(n.envelope_size(), 4);
        assert_eq!(n.kernel_size(), 0);
    }
}
