//! Reference-counted pointers.
//!
//! `SharedPtr` shares ownership of a value among handles, the value being destroyed when the last handle is. Unlike
//! the sequences, the reference count is atomic, so that handles to the same value may be cloned and dropped from
//! multiple threads.

mod shared;

pub use shared::SharedPtr;
