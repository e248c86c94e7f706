// model = "claude-opus-4-5"
// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Indexed Store
//!
//! A mutable ordered collection of shared items that reports every change
//! to its observers. This is the source collection sorted views observe and
//! the backing collection reorders rewrite.
//!
//! Design:
//! - Items live in an `OrderedSequence`, so positional operations are O(log n)
//! - A side index maps item identity to its sequence handle for O(log n)
//!   `index_of` and removal by item
//! - A cursor cache makes sequential `get` calls O(1) amortized
//! - An item may appear at most once; identity is the `Rc` allocation

use std::cmp::Ordering;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;

use crate::error::Error;
use crate::error::Precondition;
use crate::error::Result;
use crate::event;
use crate::event::ChangeEvent;
use crate::event::Observable;
use crate::event::Observers;
use crate::event::Source;
use crate::sequence::CursorCache;
use crate::sequence::Handle;
use crate::sequence::OrderedSequence;

/// Identity of a shared item: the address of its allocation.
#[inline(always)]
pub(crate) fn identity<T>(item: &Rc<T>) -> usize {
    return Rc::as_ptr(item) as usize;
}

/// A mutable ordered collection with change notification.
pub struct IndexedStore<T> {
    sequence: OrderedSequence<Rc<T>>,
    /// Map from item identity to its handle in `sequence`.
    by_identity: FxHashMap<usize, Handle>,
    cursor: CursorCache,
    observers: Observers<T>,
}

impl<T> IndexedStore<T> {
    pub fn new() -> IndexedStore<T> {
        return IndexedStore {
            sequence: OrderedSequence::new(),
            by_identity: FxHashMap::default(),
            cursor: CursorCache::new(),
            observers: Observers::new(),
        };
    }

    /// Build a store holding `items` in order. Fails if an item repeats.
    pub fn with_items<I>(items: I) -> Result<IndexedStore<T>>
    where
        I: IntoIterator<Item = Rc<T>>,
    {
        let mut store = IndexedStore::new();
        for item in items {
            store.push(item)?;
        }
        return Ok(store);
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        return self.sequence.len();
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        return self.sequence.is_empty();
    }

    /// The item at `index`. Sequential reads are O(1) amortized.
    pub fn get(&self, index: usize) -> Option<&Rc<T>> {
        let handle = self.cursor.lookup(&self.sequence, index)?;
        return self.sequence.get(handle);
    }

    pub fn first(&self) -> Option<&Rc<T>> {
        return self.get(0);
    }

    pub fn last(&self) -> Option<&Rc<T>> {
        return self.get(self.len().checked_sub(1)?);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<T>> + '_ {
        return self.sequence.values();
    }

    pub fn to_vec(&self) -> Vec<Rc<T>> {
        return self.iter().cloned().collect();
    }

    pub fn contains(&self, item: &Rc<T>) -> bool {
        return self.by_identity.contains_key(&identity(item));
    }

    pub fn index_of(&self, item: &Rc<T>) -> Option<usize> {
        let handle = *self.by_identity.get(&identity(item))?;
        return self.sequence.index_of(handle);
    }

    /// Insert `item` at `position` (`position == len` appends).
    pub fn insert(&mut self, position: usize, item: Rc<T>) -> Result<()> {
        if position > self.len() {
            return Err(Error::OutOfRange { index: position, len: self.len() });
        }
        self.check_absent(&item)?;
        self.link(position, item);
        self.emit(ChangeEvent::inserted(position, 1));
        return Ok(());
    }

    pub fn push(&mut self, item: Rc<T>) -> Result<()> {
        return self.insert(self.len(), item);
    }

    /// Insert `item` into a store already sorted by `compare`, after every
    /// item it compares equal to. Returns the index it landed at.
    ///
    /// Debug builds verify the store is sorted first; release builds trust
    /// the caller and place the item somewhere unspecified if it is not.
    pub fn insert_sorted<F>(&mut self, item: Rc<T>, mut compare: F) -> Result<usize>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.check_absent(&item)?;
        if cfg!(debug_assertions) && !self.is_sorted_by(&mut compare) {
            return Err(Precondition::Unsorted.into());
        }

        let index = self
            .sequence
            .partition_point(|_, existing| compare(&**existing, &*item) != Ordering::Greater);
        self.link(index, item);
        self.emit(ChangeEvent::inserted(index, 1));
        return Ok(index);
    }

    /// Remove `item`, returning the index it was at.
    pub fn remove(&mut self, item: &Rc<T>) -> Result<usize> {
        let unknown = Error::PreconditionFailed(Precondition::UnknownItem);
        let Some(&handle) = self.by_identity.get(&identity(item)) else {
            return Err(unknown);
        };
        let Some(index) = self.sequence.index_of(handle) else {
            return Err(unknown);
        };
        self.unlink(handle, index);
        self.emit(ChangeEvent::removed(index, 1));
        return Ok(index);
    }

    /// Remove and return the item at `position`.
    pub fn remove_at(&mut self, position: usize) -> Result<Rc<T>> {
        let out_of_range = Error::OutOfRange { index: position, len: self.len() };
        let Some(handle) = self.cursor.lookup(&self.sequence, position) else {
            return Err(out_of_range);
        };
        let Some(item) = self.unlink(handle, position) else {
            return Err(out_of_range);
        };
        self.emit(ChangeEvent::removed(position, 1));
        return Ok(item);
    }

    /// Replace `removed` items starting at `position` with `added`, as one
    /// change. Returns the removed items.
    ///
    /// An added item may be one of the removed ones, but must not appear
    /// anywhere else in the store or twice in `added`.
    pub fn splice<I>(&mut self, position: usize, removed: usize, added: I) -> Result<Vec<Rc<T>>>
    where
        I: IntoIterator<Item = Rc<T>>,
    {
        let len = self.len();
        let end = match position.checked_add(removed) {
            Some(end) if end <= len => end,
            _ => return Err(Error::OutOfRange { index: position.saturating_add(removed), len }),
        };

        let added: Vec<Rc<T>> = added.into_iter().collect();
        let mut seen = FxHashSet::default();
        for item in &added {
            let key = identity(item);
            if !seen.insert(key) {
                return Err(Precondition::DuplicateItem.into());
            }
            if let Some(&handle) = self.by_identity.get(&key) {
                let replaced = self.sequence.index_of(handle).is_some_and(|i| i >= position && i < end);
                if !replaced {
                    return Err(Precondition::DuplicateItem.into());
                }
            }
        }

        let mut taken = Vec::with_capacity(removed);
        for _ in 0..removed {
            let Some(handle) = self.sequence.handle_at(position) else {
                break;
            };
            if let Some(item) = self.unlink(handle, position) {
                taken.push(item);
            }
        }
        let count = added.len();
        for (k, item) in added.into_iter().enumerate() {
            self.link(position + k, item);
        }

        tracing::trace!(position, removed, added = count, "splice");
        self.emit(ChangeEvent::new(position, removed, count));
        return Ok(taken);
    }

    /// Stable sort by `compare`. Reported as a full replacement, even
    /// though the same items remain.
    pub fn sort<F>(&mut self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let len = self.len();
        self.sequence.sort_by(|a, b| compare(&**a, &**b));
        self.cursor.invalidate();
        tracing::debug!(len, "sorted store");
        self.emit(ChangeEvent::replaced(len));
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        let len = self.len();
        self.sequence.clear();
        self.by_identity.clear();
        self.cursor.invalidate();
        self.emit(ChangeEvent::removed(0, len));
    }

    /// Move `count` items at `from` so they start at `to`, an index in the
    /// store with those items taken out. Observers see the removal, then
    /// the insertion.
    pub(crate) fn relocate(&mut self, from: usize, count: usize, to: usize) {
        let detached = self.sequence.detach_range(from, count);
        self.cursor.invalidate_from(from);
        self.emit(ChangeEvent::removed(from, count));

        self.sequence.attach_range(to, detached);
        self.cursor.invalidate_from(to);
        self.emit(ChangeEvent::inserted(to, count));
    }

    fn is_sorted_by<F>(&self, compare: &mut F) -> bool
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut previous: Option<&Rc<T>> = None;
        for item in self.sequence.values() {
            if let Some(previous) = previous {
                if compare(&**previous, &**item) == Ordering::Greater {
                    return false;
                }
            }
            previous = Some(item);
        }
        return true;
    }

    fn check_absent(&self, item: &Rc<T>) -> Result<()> {
        if self.contains(item) {
            return Err(Precondition::DuplicateItem.into());
        }
        return Ok(());
    }

    fn link(&mut self, position: usize, item: Rc<T>) {
        let key = identity(&item);
        let handle = self.sequence.insert(position, item);
        self.by_identity.insert(key, handle);
        self.cursor.invalidate_from(position);
    }

    fn unlink(&mut self, handle: Handle, index: usize) -> Option<Rc<T>> {
        let item = self.sequence.remove(handle)?;
        self.by_identity.remove(&identity(&item));
        self.cursor.invalidate_from(index);
        return Some(item);
    }

    fn emit(&mut self, event: ChangeEvent) {
        event::emit::<T, Self>(self, event);
    }
}

impl<T> Default for IndexedStore<T> {
    fn default() -> Self {
        return Self::new();
    }
}

impl<T> Source<T> for IndexedStore<T> {
    fn len(&self) -> usize {
        return self.sequence.len();
    }

    fn get(&self, index: usize) -> Option<&Rc<T>> {
        return IndexedStore::get(self, index);
    }
}

impl<T> Observable<T> for IndexedStore<T> {
    fn observers(&mut self) -> &mut Observers<T> {
        return &mut self.observers;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn store_of(values: &[u32]) -> IndexedStore<u32> {
        return IndexedStore::with_items(values.iter().map(|&v| Rc::new(v))).unwrap();
    }

    fn values(store: &IndexedStore<u32>) -> Vec<u32> {
        return store.iter().map(|item| **item).collect();
    }

    fn record(store: &mut IndexedStore<u32>) -> Rc<RefCell<Vec<ChangeEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let log = events.clone();
        store.subscribe(move |_, event| log.borrow_mut().push(event));
        return events;
    }

    #[test]
    fn insert_and_lookup() {
        let mut store = IndexedStore::new();
        let events = record(&mut store);
        let a = Rc::new(1u32);
        let b = Rc::new(2u32);

        store.insert(0, b.clone()).unwrap();
        store.insert(0, a.clone()).unwrap();

        assert_eq!(values(&store), vec![1, 2]);
        assert_eq!(store.index_of(&b), Some(1));
        assert_eq!(*events.borrow(), vec![ChangeEvent::inserted(0, 1), ChangeEvent::inserted(0, 1)]);
    }

    #[test]
    fn insert_rejects_bad_position_and_duplicates() {
        let mut store = store_of(&[1, 2]);
        let item = Rc::new(9);

        assert_eq!(store.insert(3, item.clone()), Err(Error::OutOfRange { index: 3, len: 2 }));
        store.insert(2, item.clone()).unwrap();
        assert_eq!(
            store.insert(0, item.clone()),
            Err(Error::PreconditionFailed(Precondition::DuplicateItem))
        );
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn equal_values_are_distinct_items() {
        let mut store = IndexedStore::new();
        let a = Rc::new(5u32);
        let b = Rc::new(5u32);
        store.push(a.clone()).unwrap();
        store.push(b.clone()).unwrap();

        assert_eq!(store.index_of(&b), Some(1));
        assert_eq!(store.remove(&a), Ok(0));
        assert_eq!(store.index_of(&b), Some(0));
    }

    #[test]
    fn insert_sorted_goes_after_equals() {
        let mut store = store_of(&[1, 3, 3, 5]);
        let events = record(&mut store);
        let item = Rc::new(3u32);

        let index = store.insert_sorted(item.clone(), |a, b| a.cmp(b)).unwrap();

        assert_eq!(index, 3);
        assert_eq!(store.index_of(&item), Some(3));
        assert_eq!(*events.borrow(), vec![ChangeEvent::inserted(3, 1)]);
    }

    #[test]
    fn insert_sorted_rejects_unsorted_store() {
        let mut store = store_of(&[3, 1]);
        let result = store.insert_sorted(Rc::new(2), |a, b| a.cmp(b));

        if cfg!(debug_assertions) {
            assert_eq!(result, Err(Error::PreconditionFailed(Precondition::Unsorted)));
            assert_eq!(store.len(), 2);
        }
    }

    #[test]
    fn remove_reports_position() {
        let mut store = store_of(&[1, 2, 3]);
        let events = record(&mut store);
        let middle = store.get(1).unwrap().clone();

        assert_eq!(store.remove(&middle), Ok(1));
        assert_eq!(store.remove(&middle), Err(Error::PreconditionFailed(Precondition::UnknownItem)));
        assert_eq!(*store.remove_at(1).unwrap(), 3);
        assert_eq!(store.remove_at(1), Err(Error::OutOfRange { index: 1, len: 1 }));

        assert_eq!(values(&store), vec![1]);
        assert_eq!(*events.borrow(), vec![ChangeEvent::removed(1, 1), ChangeEvent::removed(1, 1)]);
    }

    #[test]
    fn splice_is_one_event() {
        let mut store = store_of(&[1, 2, 3, 4, 5]);
        let events = record(&mut store);

        let taken = store.splice(1, 3, vec![Rc::new(7), Rc::new(8)]).unwrap();

        assert_eq!(taken.iter().map(|item| **item).collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(values(&store), vec![1, 7, 8, 5]);
        assert_eq!(*events.borrow(), vec![ChangeEvent::new(1, 3, 2)]);
    }

    #[test]
    fn splice_may_reinsert_removed_items() {
        let mut store = store_of(&[1, 2, 3]);
        let two = store.get(1).unwrap().clone();
        let three = store.get(2).unwrap().clone();

        store.splice(1, 2, vec![three.clone(), two.clone()]).unwrap();

        assert_eq!(values(&store), vec![1, 3, 2]);
        assert_eq!(store.index_of(&two), Some(2));
    }

    #[test]
    fn splice_validates_before_mutating() {
        let mut store = store_of(&[1, 2, 3]);
        let events = record(&mut store);
        let first = store.get(0).unwrap().clone();
        let fresh = Rc::new(4);

        assert_eq!(store.splice(2, 2, Vec::new()), Err(Error::OutOfRange { index: 4, len: 3 }));
        assert_eq!(
            store.splice(1, 1, vec![first]),
            Err(Error::PreconditionFailed(Precondition::DuplicateItem))
        );
        assert_eq!(
            store.splice(1, 1, vec![fresh.clone(), fresh]),
            Err(Error::PreconditionFailed(Precondition::DuplicateItem))
        );

        assert_eq!(values(&store), vec![1, 2, 3]);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn sort_replaces_everything() {
        let mut store = store_of(&[5, 3, 1, 4, 2]);
        let events = record(&mut store);

        store.sort(|a, b| a.cmp(b));

        assert_eq!(values(&store), vec![1, 2, 3, 4, 5]);
        assert_eq!(*events.borrow(), vec![ChangeEvent::new(0, 5, 5)]);

        let three = store.get(2).unwrap().clone();
        assert_eq!(store.index_of(&three), Some(2));
    }

    #[test]
    fn sorting_empty_store_is_silent() {
        let mut store: IndexedStore<u32> = IndexedStore::new();
        let events = record(&mut store);
        store.sort(|a, b| a.cmp(b));
        store.clear();
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn boundary_reads() {
        let store = store_of(&[1, 2, 3]);
        assert_eq!(store.get(3), None);
        assert_eq!(store.get(usize::MAX), None);
        assert_eq!(store.first().map(|item| **item), Some(1));
        assert_eq!(store.last().map(|item| **item), Some(3));
    }

    #[test]
    fn sequential_reads_after_mutation() {
        let mut store = store_of(&(0..200).collect::<Vec<_>>());
        for i in 0..200 {
            assert_eq!(store.get(i).map(|item| **item), Some(i as u32));
        }
        store.remove_at(100).unwrap();
        for i in 99..199 {
            let expected = if i < 100 { i } else { i + 1 };
            assert_eq!(store.get(i).map(|item| **item), Some(expected as u32));
        }
    }

    #[test]
    fn relocate_reports_remove_then_insert() {
        let mut store = store_of(&[0, 1, 2, 3, 4]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        store.subscribe(move |source, event| {
            let snapshot: Vec<u32> = (0..source.len()).map(|i| **source.get(i).unwrap()).collect();
            log.borrow_mut().push((event, snapshot));
        });

        store.relocate(3, 2, 0);

        assert_eq!(values(&store), vec![3, 4, 0, 1, 2]);
        assert_eq!(
            *seen.borrow(),
            vec![
                (ChangeEvent::removed(3, 2), vec![0, 1, 2]),
                (ChangeEvent::inserted(0, 2), vec![3, 4, 0, 1, 2]),
            ]
        );
    }
}
