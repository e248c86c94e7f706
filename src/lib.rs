// model = "claude-opus-4-5"
// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Ordered Views - observable ordered collections with sorted projections.
//!
//! An [`IndexedStore`] holds shared items in order and reports every change
//! as a [`ChangeEvent`]. A [`SortedProjection`] keeps a comparator-ordered
//! view of any source in sync and re-reports changes in its own order. A
//! [`PositionReorderEngine`] moves an item and its subtree within a store
//! while keeping persisted positions dense.
//!
//! # Quick Start
//!
//! ```
//! use std::rc::Rc;
//! use ordered_views::{Comparator, IndexedStore, SortedProjection};
//!
//! let mut store = IndexedStore::new();
//! for value in [5, 3, 1, 4, 2] {
//!     store.push(Rc::new(value)).unwrap();
//! }
//!
//! let view = SortedProjection::new(&store, Comparator::descending());
//! let sorted: Vec<i32> = view.iter().map(|item| **item).collect();
//! assert_eq!(sorted, vec![5, 4, 3, 2, 1]);
//!
//! store.sort(|a, b| a.cmp(b));
//! assert_eq!(**store.get(0).unwrap(), 1);
//! ```

pub mod comparator;
pub mod error;
pub mod event;
pub mod projection;
pub mod reorder;
pub mod sequence;
pub mod store;

pub use comparator::Comparator;
pub use error::Error;
pub use error::Precondition;
pub use error::Result;
pub use event::ChangeEvent;
pub use event::Observable;
pub use event::ObserverId;
pub use event::Source;
pub use projection::SortedProjection;
pub use reorder::Direction;
pub use reorder::Persisted;
pub use reorder::PositionReorderEngine;
pub use reorder::Positioned;
pub use reorder::ReorderPlan;
pub use reorder::ReorderReport;
pub use store::IndexedStore;
