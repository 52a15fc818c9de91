//! The trail itself: a LIFO log of undo actions, partitioned into worlds.

use std::cell::{Cell, RefCell};

/// A trail nesting level, corresponding to one search-tree depth.
pub type World = usize;

/// Stack-based undo log.
///
/// Every reversible container ([`super::Reversible`], [`super::ReversibleSparseSet`],
/// [`super::ReversibleBitSet`]) pushes a small undo closure here the first
/// time it is touched in a new world. `pop_world` drains and runs those
/// closures in reverse order, which is exactly the trail's LIFO discipline:
/// entries are strictly LIFO within each world.
#[derive(Default)]
pub struct Trail {
    current_world: Cell<World>,
    entries: RefCell<Vec<Box<dyn FnMut()>>>,
    checkpoints: RefCell<Vec<usize>>,
}

impl Trail {
    pub fn new() -> Self {
        Trail {
            current_world: Cell::new(0),
            entries: RefCell::new(Vec::with_capacity(1024)),
            checkpoints: RefCell::new(Vec::with_capacity(64)),
        }
    }

    /// The current [`World`] id. Monotonically increasing.
    pub fn current_world(&self) -> World {
        self.current_world.get()
    }

    /// Number of currently-open worlds (search-tree depth from the root).
    pub fn depth(&self) -> usize {
        self.checkpoints.borrow().len()
    }

    /// Opens a new world, returning its id.
    pub fn push_world(&self) -> World {
        self.checkpoints.borrow_mut().push(self.entries.borrow().len());
        self.current_world.set(self.current_world.get() + 1);
        self.current_world.get()
    }

    /// Restores every reversible cell written since the most recent
    /// `push_world` and closes that world.
    pub fn pop_world(&self) {
        let checkpoint = self
            .checkpoints
            .borrow_mut()
            .pop()
            .expect("pop_world called without a matching push_world");
        loop {
            let next = {
                let mut entries = self.entries.borrow_mut();
                if entries.len() <= checkpoint {
                    break;
                }
                entries.pop()
            };
            if let Some(mut action) = next {
                action();
            }
        }
        self.current_world.set(self.current_world.get() - 1);
    }

    /// Pops worlds until `depth()` equals `target_depth`. Used by the search
    /// loop to unwind several decisions at once.
    pub fn pop_world_to(&self, target_depth: usize) {
        while self.depth() > target_depth {
            self.pop_world();
        }
    }

    /// Registers an undo action to run when the current world is popped.
    pub fn push_undo(&self, action: impl FnMut() + 'static) {
        self.entries.borrow_mut().push(Box::new(action));
    }

    /// Total number of pending undo entries across all open worlds. Exposed
    /// for diagnostics and memory-usage estimates.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Trail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trail")
            .field("current_world", &self.current_world())
            .field("depth", &self.depth())
            .field("pending_entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_restores_value() {
        use std::cell::Cell as StdCell;
        use std::rc::Rc;

        let trail = Trail::new();
        let value = Rc::new(StdCell::new(5));

        trail.push_world();
        let v = Rc::clone(&value);
        let old = value.get();
        v.set(10);
        trail.push_undo(move || v.set(old));
        assert_eq!(value.get(), 10);

        trail.pop_world();
        assert_eq!(value.get(), 5);
    }

    #[test]
    fn nested_worlds_unwind_independently() {
        use std::cell::Cell as StdCell;
        use std::rc::Rc;

        let trail = Trail::new();
        let value = Rc::new(StdCell::new(0));

        trail.push_world();
        {
            let v = Rc::clone(&value);
            let old = value.get();
            v.set(1);
            trail.push_undo(move || v.set(old));
        }

        trail.push_world();
        {
            let v = Rc::clone(&value);
            let old = value.get();
            v.set(2);
            trail.push_undo(move || v.set(old));
        }
        assert_eq!(value.get(), 2);

        trail.pop_world();
        assert_eq!(value.get(), 1);

        trail.pop_world();
        assert_eq!(value.get(), 0);
    }
}
