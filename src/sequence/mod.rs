// model = "claude-opus-4-5"
// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Balanced sequence primitives shared by every collection in the crate.
//!
//! - `OrderedSequence`: B-tree with stable, generational handles
//! - `CursorCache`: single-slot memo of the last index lookup

mod btree;
mod cursor;

pub use btree::Handle;
pub use btree::Iter;
pub use btree::OrderedSequence;
pub use cursor::CursorCache;
