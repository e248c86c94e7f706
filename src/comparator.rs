// model = "claude-opus-4-5"
// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Shared comparators for sorted views.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// A total preorder over items, cheap to clone.
///
/// The default comparator is *unsorted*: every pair compares equal, so a
/// view using it keeps the order of its source.
pub struct Comparator<T> {
    compare: Option<Rc<dyn Fn(&T, &T) -> Ordering>>,
}

impl<T> Comparator<T> {
    pub fn unsorted() -> Comparator<T> {
        return Comparator { compare: None };
    }

    #[inline(always)]
    pub fn is_unsorted(&self) -> bool {
        return self.compare.is_none();
    }

    #[inline]
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        return match &self.compare {
            Some(compare) => compare(a, b),
            None => Ordering::Equal,
        };
    }
}

impl<T: 'static> Comparator<T> {
    pub fn new<F>(compare: F) -> Comparator<T>
    where
        F: Fn(&T, &T) -> Ordering + 'static,
    {
        return Comparator { compare: Some(Rc::new(compare)) };
    }

    pub fn by_key<K, F>(key: F) -> Comparator<T>
    where
        K: Ord,
        F: Fn(&T) -> K + 'static,
    {
        return Comparator::new(move |a, b| key(a).cmp(&key(b)));
    }

    /// The same order, back to front. Unsorted stays unsorted.
    pub fn reversed(&self) -> Comparator<T> {
        let Some(inner) = self.compare.clone() else {
            return Comparator::unsorted();
        };
        return Comparator::new(move |a, b| inner(b, a));
    }
}

impl<T: Ord + 'static> Comparator<T> {
    pub fn ascending() -> Comparator<T> {
        return Comparator::new(|a: &T, b: &T| a.cmp(b));
    }

    pub fn descending() -> Comparator<T> {
        return Comparator::new(|a: &T, b: &T| b.cmp(a));
    }
}

impl<T> Clone for Comparator<T> {
    fn clone(&self) -> Self {
        return Comparator { compare: self.compare.clone() };
    }
}

impl<T> Default for Comparator<T> {
    fn default() -> Self {
        return Comparator::unsorted();
    }
}

impl<T> fmt::Debug for Comparator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_unsorted() { "unsorted" } else { "custom" };
        return f.debug_tuple("Comparator").field(&kind).finish();
    }
}
