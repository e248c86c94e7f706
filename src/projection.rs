// model = "claude-opus-4-5"
// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Sorted Projection
//!
//! A comparator-ordered view over a source collection, kept correct as the
//! source changes and re-reported to its own observers with as few events
//! as possible.
//!
//! The projection keeps two sequences in 1:1 correspondence:
//!
//! 1. **Child order** mirrors the source. Each entry holds the handle of its
//!    partner in the sort order; it translates source indices.
//!
//! 2. **Sort order** holds the items ordered by the comparator, ties broken
//!    by source order. Each entry holds the handle of its child-order
//!    partner.
//!
//! Handles are stable, so cross-links survive every insert, removal and
//! re-sort of the other sequence.
//!
//! Source events are translated run by run: consecutive removals or
//! insertions that land next to each other in sort order are merged into
//! one event. A run is reported before the mutation that breaks it is
//! applied, so observers always read a state matching the events they have
//! seen. When the view is close to source order, a whole source event maps
//! to a single event; fully anti-correlated orders degrade to one event per
//! item.

use std::cell::RefCell;
use std::rc::Rc;
use std::rc::Weak;

use rustc_hash::FxHashMap;

use crate::comparator::Comparator;
use crate::error::Precondition;
use crate::error::Result;
use crate::event;
use crate::event::ChangeEvent;
use crate::event::Observable;
use crate::event::ObserverId;
use crate::event::Observers;
use crate::event::Source;
use crate::sequence::CursorCache;
use crate::sequence::Handle;
use crate::sequence::OrderedSequence;
use crate::store::identity;

/// An entry of the sort order.
struct SortEntry<T> {
    item: Rc<T>,
    /// Partner in the child order.
    child: Handle,
}

/// Accumulates consecutive sort-order indices into runs.
#[derive(Debug, Default)]
struct Runs {
    /// `(start, len)` of the open run.
    open: Option<(usize, usize)>,
}

impl Runs {
    /// Note a removal at live index `index`. Returns the previous run if
    /// `index` does not continue it.
    fn removal(&mut self, index: usize) -> Option<ChangeEvent> {
        let (run, finished) = match self.open {
            Some((start, len)) if index == start => ((start, len + 1), None),
            Some((start, len)) if index + 1 == start => ((index, len + 1), None),
            Some((start, len)) => ((index, 1), Some(ChangeEvent::removed(start, len))),
            None => ((index, 1), None),
        };
        self.open = Some(run);
        return finished;
    }

    /// Note an insertion at live index `index`. Returns the previous run if
    /// `index` does not touch it.
    fn insertion(&mut self, index: usize) -> Option<ChangeEvent> {
        let (run, finished) = match self.open {
            Some((start, len)) if index >= start && index <= start + len => ((start, len + 1), None),
            Some((start, len)) => ((index, 1), Some(ChangeEvent::inserted(start, len))),
            None => ((index, 1), None),
        };
        self.open = Some(run);
        return finished;
    }

    fn finish_removal(&mut self) -> Option<ChangeEvent> {
        return self.open.take().map(|(start, len)| ChangeEvent::removed(start, len));
    }

    fn finish_insertion(&mut self) -> Option<ChangeEvent> {
        return self.open.take().map(|(start, len)| ChangeEvent::inserted(start, len));
    }
}

/// A comparator-ordered view over a source collection.
pub struct SortedProjection<T> {
    /// Source order; values are handles into `sort_order`.
    child_order: OrderedSequence<Handle>,
    sort_order: OrderedSequence<SortEntry<T>>,
    /// Map from item identity to its handle in `sort_order`.
    by_identity: FxHashMap<usize, Handle>,
    comparator: Comparator<T>,
    cursor: CursorCache,
    observers: Observers<T>,
    /// Our subscription on the source, when bound through `observe`.
    subscription: Option<ObserverId>,
}

impl<T> SortedProjection<T> {
    /// Build a projection of the current contents of `source`.
    ///
    /// The projection is not subscribed to anything; feed it the source's
    /// events through [`SortedProjection::apply`], or use
    /// [`SortedProjection::observe`] to have that done automatically.
    pub fn new(source: &dyn Source<T>, comparator: Comparator<T>) -> SortedProjection<T> {
        let mut projection = SortedProjection {
            child_order: OrderedSequence::new(),
            sort_order: OrderedSequence::new(),
            by_identity: FxHashMap::default(),
            comparator,
            cursor: CursorCache::new(),
            observers: Observers::new(),
            subscription: None,
        };
        projection.apply(source, ChangeEvent::inserted(0, source.len()));
        return projection;
    }

    /// Bind a new projection to `source` for the rest of its life.
    ///
    /// The source reports each change to the projection, which reports its
    /// own changes to its observers before the source mutation returns. The
    /// projection must not be borrowed while its source is being mutated.
    pub fn observe<S>(source: &Weak<RefCell<S>>, comparator: Comparator<T>) -> Result<Rc<RefCell<SortedProjection<T>>>>
    where
        S: Observable<T> + 'static,
        T: 'static,
    {
        let source = source.upgrade().ok_or(Precondition::MissingSource)?;
        let mut source = source.try_borrow_mut().map_err(|_| Precondition::SourceBusy)?;

        let projection = Rc::new(RefCell::new(SortedProjection::new(&*source, comparator)));
        let link = Rc::downgrade(&projection);
        let id = source.subscribe(move |source: &dyn Source<T>, event: ChangeEvent| {
            if let Some(projection) = link.upgrade() {
                projection.borrow_mut().apply(source, event);
            }
        });
        projection.borrow_mut().subscription = Some(id);
        return Ok(projection);
    }

    /// Stop receiving events from `source`. Returns false if the projection
    /// was not bound to it.
    pub fn detach<S>(&mut self, source: &mut S) -> bool
    where
        S: Observable<T>,
    {
        let Some(id) = self.subscription.take() else {
            return false;
        };
        return source.unsubscribe(id);
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        return self.sort_order.len();
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        return self.sort_order.is_empty();
    }

    /// The item at sort-order `index`. Sequential reads are O(1) amortized.
    pub fn get(&self, index: usize) -> Option<&Rc<T>> {
        let handle = self.cursor.lookup(&self.sort_order, index)?;
        return self.sort_order.get(handle).map(|entry| &entry.item);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<T>> + '_ {
        return self.sort_order.values().map(|entry| &entry.item);
    }

    pub fn to_vec(&self) -> Vec<Rc<T>> {
        return self.iter().cloned().collect();
    }

    /// Sort-order index of `item`.
    pub fn index_of(&self, item: &Rc<T>) -> Option<usize> {
        let handle = *self.by_identity.get(&identity(item))?;
        return self.sort_order.index_of(handle);
    }

    /// Source index of the item at sort-order `index`.
    pub fn source_index(&self, index: usize) -> Option<usize> {
        let handle = self.cursor.lookup(&self.sort_order, index)?;
        let entry = self.sort_order.get(handle)?;
        return self.child_order.index_of(entry.child);
    }

    /// Sort-order index of the item at source index `index`.
    pub fn sort_index(&self, index: usize) -> Option<usize> {
        let child = self.child_order.handle_at(index)?;
        return self.sort_order.index_of(*self.child_order.get(child)?);
    }

    pub fn comparator(&self) -> &Comparator<T> {
        return &self.comparator;
    }

    /// Swap the comparator and re-sort.
    pub fn set_comparator(&mut self, comparator: Comparator<T>) {
        self.comparator = comparator;
        self.resort();
    }

    /// Re-sort everything, for when the comparator's answers changed.
    ///
    /// Reported as one full replacement.
    pub fn resort(&mut self) {
        self.cursor.invalidate();
        let len = self.sort_order.len();
        if len == 0 {
            return;
        }

        let mut order: Vec<(usize, Handle)> =
            self.child_order.values().enumerate().map(|(i, &sort)| (i, sort)).collect();
        let comparator = &self.comparator;
        let sort_order = &self.sort_order;
        order.sort_by(|a, b| {
            let (Some(x), Some(y)) = (sort_order.get(a.1), sort_order.get(b.1)) else {
                return a.0.cmp(&b.0);
            };
            return comparator.compare(&x.item, &y.item).then(a.0.cmp(&b.0));
        });
        self.sort_order.rearrange(order.into_iter().map(|(_, handle)| handle));

        tracing::debug!(len, "resorted projection");
        self.emit(ChangeEvent::replaced(len));
    }

    /// Translate one source event. `source` must already be in the state
    /// the event describes.
    pub fn apply(&mut self, source: &dyn Source<T>, event: ChangeEvent) {
        debug_assert_eq!(event.apply_to_len(self.sort_order.len()), Some(source.len()));
        if event.removed > 0 {
            self.apply_removal(event.start, event.removed);
        }
        if event.added > 0 {
            self.apply_insertion(source, event.start, event.added);
        }
        debug_assert_eq!(self.child_order.len(), self.sort_order.len());
        debug_assert_eq!(self.sort_order.len(), source.len());
    }

    fn apply_removal(&mut self, position: usize, removed: usize) {
        if removed == self.child_order.len() {
            self.child_order.clear();
            self.sort_order.clear();
            self.by_identity.clear();
            self.cursor.invalidate();
            tracing::trace!(removed, "projection emptied");
            self.emit(ChangeEvent::removed(0, removed));
            return;
        }

        let mut runs = Runs::default();
        for _ in 0..removed {
            let Some(child) = self.child_order.handle_at(position) else {
                break;
            };
            let sort = self.child_order.get(child).copied().unwrap_or(Handle::NONE);
            let Some(index) = self.sort_order.index_of(sort) else {
                self.child_order.remove(child);
                continue;
            };

            if let Some(finished) = runs.removal(index) {
                self.emit(finished);
            }
            self.child_order.remove(child);
            if let Some(entry) = self.sort_order.remove(sort) {
                self.by_identity.remove(&identity(&entry.item));
            }
            self.cursor.invalidate_from(index);
        }
        if let Some(finished) = runs.finish_removal() {
            self.emit(finished);
        }
    }

    fn apply_insertion(&mut self, source: &dyn Source<T>, position: usize, added: usize) {
        let mut runs = Runs::default();
        for offset in 0..added {
            let source_index = position + offset;
            let Some(item) = source.get(source_index).cloned() else {
                break;
            };

            let child = self.child_order.insert(source_index, Handle::NONE);
            let index = self.sort_position(&item, source_index);
            if let Some(finished) = runs.insertion(index) {
                self.emit(finished);
            }

            let key = identity(&item);
            let sort = self.sort_order.insert(index, SortEntry { item, child });
            if let Some(partner) = self.child_order.get_mut(child) {
                *partner = sort;
            }
            self.by_identity.insert(key, sort);
            self.cursor.invalidate_from(index);
        }
        if let Some(finished) = runs.finish_insertion() {
            self.emit(finished);
        }
    }

    /// Where `item`, sitting at `source_index` in the child order, belongs
    /// in the sort order: after every entry smaller than it, and after equal
    /// entries that come earlier in the source.
    fn sort_position(&self, item: &Rc<T>, source_index: usize) -> usize {
        if self.comparator.is_unsorted() {
            return source_index;
        }
        let child_order = &self.child_order;
        return self.sort_order.partition_point(|_, entry| {
            match self.comparator.compare(&entry.item, item) {
                std::cmp::Ordering::Less => true,
                std::cmp::Ordering::Greater => false,
                std::cmp::Ordering::Equal => child_order.index_of(entry.child).is_some_and(|i| i < source_index),
            }
        });
    }

    fn emit(&mut self, event: ChangeEvent) {
        event::emit::<T, Self>(self, event);
    }
}

impl<T> Source<T> for SortedProjection<T> {
    fn len(&self) -> usize {
        return self.sort_order.len();
    }

    fn get(&self, index: usize) -> Option<&Rc<T>> {
        return SortedProjection::get(self, index);
    }
}

impl<T> Observable<T> for SortedProjection<T> {
    fn observers(&mut self) -> &mut Observers<T> {
        return &mut self.observers;
    }
}
