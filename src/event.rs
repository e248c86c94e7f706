// model = "claude-opus-4-5"
// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Change events and the observer contract.
//!
//! A collection describes every mutation as one or more [`ChangeEvent`]s,
//! delivered synchronously, in the order the mutations happen. Observers
//! receive the emitting collection as a read-only [`Source`]; they never
//! see its storage and cannot mutate it while handling the event.

use std::rc::Rc;

use smallvec::SmallVec;

/// A contiguous window of a collection that changed: `removed` items
/// starting at `start` were replaced by `added` items.
///
/// After the event, `new_len == old_len - removed + added`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeEvent {
    pub start: usize,
    pub removed: usize,
    pub added: usize,
}

impl ChangeEvent {
    pub const fn new(start: usize, removed: usize, added: usize) -> ChangeEvent {
        return ChangeEvent { start, removed, added };
    }

    pub const fn inserted(start: usize, count: usize) -> ChangeEvent {
        return ChangeEvent::new(start, 0, count);
    }

    pub const fn removed(start: usize, count: usize) -> ChangeEvent {
        return ChangeEvent::new(start, count, 0);
    }

    /// Every item of a collection of `len` items replaced in place.
    pub const fn replaced(len: usize) -> ChangeEvent {
        return ChangeEvent::new(0, len, len);
    }

    pub const fn is_empty(&self) -> bool {
        return self.removed == 0 && self.added == 0;
    }

    /// Length after applying this event to a collection of `old_len` items,
    /// or `None` if the removed window does not fit.
    pub fn apply_to_len(&self, old_len: usize) -> Option<usize> {
        let end = self.start.checked_add(self.removed)?;
        if end > old_len {
            return None;
        }
        return Some(old_len - self.removed + self.added);
    }
}

/// Read access to an ordered collection of shared items.
pub trait Source<T> {
    fn len(&self) -> usize;

    /// The item at `index`, or `None` past either end.
    fn get(&self, index: usize) -> Option<&Rc<T>>;

    fn is_empty(&self) -> bool {
        return self.len() == 0;
    }
}

pub type ObserverFn<T> = Box<dyn FnMut(&dyn Source<T>, ChangeEvent)>;

/// Identifies one subscription on one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

/// The observers registered on a collection.
///
/// Most collections carry one or two observers, so they are kept inline.
pub struct Observers<T> {
    entries: SmallVec<[(ObserverId, ObserverFn<T>); 2]>,
    next_id: u64,
}

impl<T> Observers<T> {
    pub fn new() -> Observers<T> {
        return Observers { entries: SmallVec::new(), next_id: 0 };
    }

    pub fn len(&self) -> usize {
        return self.entries.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }

    pub fn subscribe<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&dyn Source<T>, ChangeEvent) + 'static,
    {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(observer)));
        return id;
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        return self.entries.len() != before;
    }

    fn notify(&mut self, source: &dyn Source<T>, event: ChangeEvent) {
        for (_, observer) in self.entries.iter_mut() {
            observer(source, event);
        }
    }
}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        return Self::new();
    }
}

/// A collection that reports its changes to observers.
pub trait Observable<T>: Source<T> {
    fn observers(&mut self) -> &mut Observers<T>;

    fn subscribe<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&dyn Source<T>, ChangeEvent) + 'static,
        Self: Sized,
    {
        return self.observers().subscribe(observer);
    }

    fn unsubscribe(&mut self, id: ObserverId) -> bool {
        return self.observers().unsubscribe(id);
    }
}

/// Deliver `event` to every observer of `owner`. Empty events are dropped.
///
/// The observer list is taken out of `owner` for the duration of the call
/// so each observer can read `owner` as its source.
pub(crate) fn emit<T, S>(owner: &mut S, event: ChangeEvent)
where
    S: Observable<T>,
{
    if event.is_empty() || owner.observers().is_empty() {
        return;
    }
    let mut observers = std::mem::take(owner.observers());
    observers.notify(&*owner, event);
    *owner.observers() = observers;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Fixed(Vec<Rc<u32>>, Observers<u32>);

    impl Source<u32> for Fixed {
        fn len(&self) -> usize {
            return self.0.len();
        }

        fn get(&self, index: usize) -> Option<&Rc<u32>> {
            return self.0.get(index);
        }
    }

    impl Observable<u32> for Fixed {
        fn observers(&mut self) -> &mut Observers<u32> {
            return &mut self.1;
        }
    }

    #[test]
    fn event_length_arithmetic() {
        assert_eq!(ChangeEvent::new(2, 1, 3).apply_to_len(5), Some(7));
        assert_eq!(ChangeEvent::removed(4, 2).apply_to_len(5), None);
        assert_eq!(ChangeEvent::replaced(5).apply_to_len(5), Some(5));
        assert!(ChangeEvent::inserted(3, 0).is_empty());
    }

    #[test]
    fn observers_see_the_source() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut fixed = Fixed(vec![Rc::new(10), Rc::new(20)], Observers::new());

        let log = seen.clone();
        fixed.subscribe(move |source, event| {
            let first = source.get(event.start).map(|item| **item);
            log.borrow_mut().push((event, first, source.len()));
        });

        emit::<u32, Fixed>(&mut fixed, ChangeEvent::inserted(1, 1));
        emit::<u32, Fixed>(&mut fixed, ChangeEvent::inserted(0, 0));

        assert_eq!(*seen.borrow(), vec![(ChangeEvent::inserted(1, 1), Some(20), 2)]);
        assert_eq!(fixed.observers().len(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut fixed = Fixed(vec![Rc::new(1)], Observers::new());

        let counter = count.clone();
        let id = fixed.subscribe(move |_, _| *counter.borrow_mut() += 1);
        emit::<u32, Fixed>(&mut fixed, ChangeEvent::removed(0, 1));
        assert!(fixed.unsubscribe(id));
        assert!(!fixed.unsubscribe(id));
        emit::<u32, Fixed>(&mut fixed, ChangeEvent::removed(0, 1));

        assert_eq!(*count.borrow(), 1);
    }
}
