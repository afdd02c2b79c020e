//! Utilities for implementers of storage-generic sequences.

mod chunk;
mod error;

#[cfg(feature = "alloc")]
pub mod alloc;

pub use chunk::{BitChunk, IndexInChunk, IndexOfChunk};
pub use error::{MismatchedCursorsError, OutOfRangeError, PushError, StorageError};

pub(crate) use error::resolve_range;
