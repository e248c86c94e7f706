// model = "claude-opus-4-5"
// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Cursor caching for amortizing sequential lookups.
//!
//! Views are mostly read front to back (or back to front) by whoever renders
//! them. By caching the last lookup result, a read of `i + 1` or `i - 1`
//! steps from the cached handle instead of descending the tree again.
//!
//! # Usage Patterns
//!
//! ## Sequential Forward
//! Reads at positions P, P+1, P+2, ...
//! Cache hit: step to the next handle, O(1) inside a leaf
//!
//! ## Sequential Backward
//! Reads at positions P, P-1, P-2, ...
//! Cache hit: step to the previous handle
//!
//! ## Random Access
//! Cache miss: full O(log n) lookup, which refreshes the cache

use std::cell::Cell;

use super::btree::Handle;
use super::btree::OrderedSequence;

/// A single-slot cache of the last `(index, handle)` lookup.
///
/// Mutating the sequence at or before the cached index clears the cache;
/// mutations after it leave the cached pair correct.
#[derive(Debug, Default)]
pub struct CursorCache {
    slot: Cell<Option<(usize, Handle)>>,
}

impl CursorCache {
    pub fn new() -> CursorCache {
        return CursorCache { slot: Cell::new(None) };
    }

    /// Resolve `index` to a handle, consulting and refreshing the cache.
    pub fn lookup<V>(&self, sequence: &OrderedSequence<V>, index: usize) -> Option<Handle> {
        if index >= sequence.len() {
            return None;
        }

        let hit = match self.slot.get() {
            Some((cached, handle)) if cached == index => Some(handle),
            Some((cached, handle)) if cached + 1 == index => sequence.next(handle),
            Some((cached, handle)) if index + 1 == cached => sequence.prev(handle),
            _ => None,
        };
        let handle = match hit {
            Some(handle) if sequence.contains(handle) => handle,
            _ => sequence.handle_at(index)?,
        };

        self.slot.set(Some((index, handle)));
        return Some(handle);
    }

    /// Invalidate after a mutation at `index`.
    #[inline]
    pub fn invalidate_from(&self, index: usize) {
        if let Some((cached, _)) = self.slot.get() {
            if index <= cached {
                self.slot.set(None);
            }
        }
    }

    #[inline]
    pub fn invalidate(&self) {
        self.slot.set(None);
    }
}
