// model = "claude-opus-4-5"
// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Position Reordering
//!
//! Moves an item together with its subtree to a new index of an
//! [`IndexedStore`], rewriting the `position` of every item that shifts.
//!
//! Structure:
//! - The item and its subtree form the *moving block*, the `L` items
//!   starting at the item's index.
//! - The items between the old and the new location form the *displaced
//!   block*. Moving toward the front it is `[destination, start)`; moving
//!   toward the back it is `[start + L, destination + 1)`.
//!
//! Operations:
//! - validate and partition into a [`ReorderPlan`] (no side effects)
//! - write the new positions and call the persistence hook for each item
//!   whose position changed
//! - move the smaller block and report exactly two events sized to it
//!
//! The engine holds the store mutably for the whole call, so nothing can
//! observe or mutate it between the position writes and the move.

use std::marker::PhantomData;
use std::ops::Range;
use std::rc::Rc;

use crate::error::Error;
use crate::error::Precondition;
use crate::error::Result;
use crate::event::ChangeEvent;
use crate::store::IndexedStore;

/// An item with a persisted position inside a tree-shaped list.
///
/// Items are shared, so positions are written through `&self`.
pub trait Positioned {
    fn position(&self) -> usize;
    fn set_position(&self, position: usize);

    /// Number of descendants, stored contiguously right after the item.
    fn subtree_size(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    TowardFront,
    TowardBack,
}

/// A validated reorder, before anything is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderPlan {
    pub start: usize,
    pub block_len: usize,
    pub destination: usize,
    pub direction: Direction,
}

impl ReorderPlan {
    /// Check that the block `[start, start + block_len)` fits in a
    /// collection of `len` items and that `destination` is an index
    /// outside it.
    pub fn new(len: usize, start: usize, block_len: usize, destination: usize) -> Result<ReorderPlan> {
        let end = start.saturating_add(block_len);
        if block_len == 0 || end > len {
            return Err(Error::OutOfRange { index: end, len });
        }
        if destination >= len {
            return Err(Error::OutOfRange { index: destination, len });
        }
        if destination >= start && destination < end {
            return Err(Error::InvalidDestination { destination, start, end });
        }

        let direction = if destination < start { Direction::TowardFront } else { Direction::TowardBack };
        return Ok(ReorderPlan { start, block_len, destination, direction });
    }

    /// Indices of the item and its subtree before the move.
    pub fn moving(&self) -> Range<usize> {
        return self.start..self.start + self.block_len;
    }

    /// Indices of the items the moving block passes over.
    pub fn displaced(&self) -> Range<usize> {
        return match self.direction {
            Direction::TowardFront => self.destination..self.start,
            Direction::TowardBack => self.start + self.block_len..self.destination + 1,
        };
    }

    /// Every index whose item changes position.
    pub fn affected(&self) -> Range<usize> {
        let (moving, displaced) = (self.moving(), self.displaced());
        return moving.start.min(displaced.start)..moving.end.max(displaced.end);
    }

    /// Index of the item after the move.
    pub fn final_start(&self) -> usize {
        return match self.direction {
            Direction::TowardFront => self.destination,
            Direction::TowardBack => self.destination + 1 - self.block_len,
        };
    }

    /// Where the item at `index` ends up.
    pub fn new_index(&self, index: usize) -> usize {
        let displaced = self.displaced();
        if self.moving().contains(&index) {
            return self.final_start() + (index - self.start);
        }
        if displaced.contains(&index) {
            return match self.direction {
                Direction::TowardFront => index + self.block_len,
                Direction::TowardBack => index - self.block_len,
            };
        }
        return index;
    }

    /// The structural move actually performed: `(from, count, to)`, with
    /// `to` counted in the collection without the moved entries.
    ///
    /// Only the smaller block moves. On a tie the moving block does.
    pub fn relocation(&self) -> (usize, usize, usize) {
        let displaced = self.displaced();
        let displaced_len = displaced.len();
        if self.block_len <= displaced_len {
            return (self.start, self.block_len, self.final_start());
        }
        return match self.direction {
            Direction::TowardFront => (displaced.start, displaced_len, self.destination + self.block_len),
            Direction::TowardBack => (displaced.start, displaced_len, self.start),
        };
    }

    /// The removal and insertion observers receive.
    pub fn events(&self) -> [ChangeEvent; 2] {
        let (from, count, to) = self.relocation();
        return [ChangeEvent::removed(from, count), ChangeEvent::inserted(to, count)];
    }

    /// The destination that moves the block back to where it started.
    pub fn inverse_destination(&self) -> usize {
        return match self.direction {
            Direction::TowardFront => self.start + self.block_len - 1,
            Direction::TowardBack => self.start,
        };
    }
}

/// Outcome of writing positions back.
#[derive(Debug)]
pub struct Persisted<E> {
    /// Items whose position changed, each handed to the hook once.
    pub rewritten: usize,
    /// Errors the hook returned, in item order.
    pub failures: Vec<E>,
}

impl<E> Persisted<E> {
    fn new() -> Persisted<E> {
        return Persisted { rewritten: 0, failures: Vec::new() };
    }

    pub fn is_clean(&self) -> bool {
        return self.failures.is_empty();
    }
}

#[derive(Debug)]
pub struct ReorderReport<E> {
    pub plan: ReorderPlan,
    pub persisted: Persisted<E>,
}

/// Reorders items of an [`IndexedStore`] and persists their positions
/// through `hook`.
///
/// The hook runs after the in-memory position is written. Its errors are
/// collected, never retried, and do not undo the reorder.
pub struct PositionReorderEngine<T, E, F> {
    hook: F,
    _marker: PhantomData<fn(&Rc<T>) -> E>,
}

impl<T, E, F> PositionReorderEngine<T, E, F>
where
    T: Positioned,
    F: FnMut(&Rc<T>) -> std::result::Result<(), E>,
{
    pub fn new(hook: F) -> PositionReorderEngine<T, E, F> {
        return PositionReorderEngine { hook, _marker: PhantomData };
    }

    /// Validate moving `item` and its subtree to `destination`.
    pub fn plan(&self, store: &IndexedStore<T>, item: &Rc<T>, destination: usize) -> Result<ReorderPlan> {
        let start = store.index_of(item).ok_or(Precondition::UnknownItem)?;
        let block_len = item.subtree_size().saturating_add(1);
        return ReorderPlan::new(store.len(), start, block_len, destination);
    }

    /// Move `item` and its subtree so that `item` lands at `destination`.
    ///
    /// Fails without touching anything when the plan is invalid. Otherwise
    /// every position in the affected range is rewritten to its final
    /// index, and observers of `store` see one removal and one insertion.
    pub fn move_item(
        &mut self,
        store: &mut IndexedStore<T>,
        item: &Rc<T>,
        destination: usize,
    ) -> Result<ReorderReport<E>> {
        let plan = self.plan(store, item, destination)?;

        let mut persisted = Persisted::new();
        for index in plan.affected() {
            let Some(entry) = store.get(index) else {
                continue;
            };
            let position = plan.new_index(index);
            self.write(entry, position, &mut persisted);
        }

        let (from, count, to) = plan.relocation();
        store.relocate(from, count, to);

        tracing::debug!(
            start = plan.start,
            block_len = plan.block_len,
            destination,
            moved = count,
            rewritten = persisted.rewritten,
            failures = persisted.failures.len(),
            "reordered"
        );
        return Ok(ReorderReport { plan, persisted });
    }

    /// Set every item's position to its index.
    pub fn renumber(&mut self, store: &IndexedStore<T>) -> Persisted<E> {
        let mut persisted = Persisted::new();
        for (index, item) in store.iter().enumerate() {
            self.write(item, index, &mut persisted);
        }
        tracing::debug!(len = store.len(), rewritten = persisted.rewritten, "renumbered");
        return persisted;
    }

    fn write(&mut self, item: &Rc<T>, position: usize, persisted: &mut Persisted<E>) {
        if item.position() == position {
            return;
        }
        item.set_position(position);
        persisted.rewritten += 1;
        if let Err(error) = (self.hook)(item) {
            tracing::debug!(position, "position hook failed");
            persisted.failures.push(error);
        }
    }
}
