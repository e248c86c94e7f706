// model = "claude-opus-4-5"
// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Errors reported by collection operations. Every error is detected
//! before the collection is touched.

use thiserror::Error;

/// Error returned when an operation is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The caller broke a contract the operation relies on.
    #[error("precondition failed: {0}")]
    PreconditionFailed(Precondition),
    /// An index fell outside the collection.
    #[error("index {index} out of range for length {len}")]
    OutOfRange { index: usize, len: usize },
    /// A reorder destination overlaps the block being moved.
    #[error("destination {destination} lies inside the moving block {start}..{end}")]
    InvalidDestination { destination: usize, start: usize, end: usize },
}

/// The contract behind a [`Error::PreconditionFailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("source collection no longer exists")]
    MissingSource,
    #[error("source collection is already borrowed")]
    SourceBusy,
    #[error("collection is not sorted by the comparator")]
    Unsorted,
    #[error("item is already in the collection")]
    DuplicateItem,
    #[error("item is not in the collection")]
    UnknownItem,
}

impl From<Precondition> for Error {
    fn from(value: Precondition) -> Self {
        return Error::PreconditionFailed(value);
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
