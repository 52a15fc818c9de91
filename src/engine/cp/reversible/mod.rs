//! The trailed substrate every reversible piece of state in the engine is
//! built on.
//!
//! A [`World`] is a nesting level of the trail, corresponding to one
//! tree-depth of search. [`Trail`] records undo actions lazily: a write
//! only pushes an undo entry the first time a cell is touched in the
//! current world, giving O(1) writes in an unchanged world and O(changes)
//! restore.

mod bitset;
mod sparse_set;
mod trail;

pub use bitset::ReversibleBitSet;
pub use sparse_set::ReversibleSparseSet;
pub use trail::{Trail, World};

use std::cell::Cell;
use std::rc::Rc;

/// A reversible scalar cell.
///
/// Writes in the same [`World`] as the last write are free; a write that
/// crosses into a new world first pushes the old value onto the trail. Only
/// `Copy` types are supported — anything larger belongs in one of the
/// specialised containers below, which trail deltas rather than whole
/// structures.
#[derive(Clone)]
pub struct Reversible<T: Copy + 'static> {
    value: Rc<Cell<T>>,
    last_write_world: Rc<Cell<World>>,
    trail: Rc<Trail>,
}

impl<T: Copy + 'static> Reversible<T> {
    pub fn new(trail: &Rc<Trail>, initial: T) -> Self {
        Reversible {
            value: Rc::new(Cell::new(initial)),
            last_write_world: Rc::new(Cell::new(trail.current_world())),
            trail: Rc::clone(trail),
        }
    }

    pub fn get(&self) -> T {
        self.value.get()
    }

    pub fn set(&self, new_value: T) {
        let current_world = self.trail.current_world();
        if self.last_write_world.get() < current_world {
            let old_value = self.value.get();
            let written_world = self.last_write_world.get();
            let value = Rc::clone(&self.value);
            let last_write_world = Rc::clone(&self.last_write_world);
            self.trail.push_undo(move || {
                value.set(old_value);
                last_write_world.set(written_world);
            });
            self.last_write_world.set(current_world);
        }
        self.value.set(new_value);
    }
}

impl<T: Copy + std::fmt::Debug + 'static> std::fmt::Debug for Reversible<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reversible").field("value", &self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversible_scalar_round_trips() {
        let trail = Rc::new(Trail::new());
        let cell = Reversible::new(&trail, 3);

        trail.push_world();
        cell.set(7);
        assert_eq!(cell.get(), 7);

        // A second write in the same world does not push another entry.
        cell.set(9);
        assert_eq!(cell.get(), 9);
        assert_eq!(trail.len(), 1);

        trail.pop_world();
        assert_eq!(cell.get(), 3);
    }
}
