//! Storage-generic sequences.
//!
//! #   Organization
//!
//! This crate is composed of multiple top modules:
//!
//! -   The `storage` module contains the `Storage` capability, and its implementations: raw slots in which elements
//!     are constructed and destructed, without any notion of which slots are live.
//! -   The `collections` module contains the sequences built atop a `Storage`: the generic `Array`, and the packed
//!     `BitArray`.
//! -   The `pointers` module contains a reference-counted shared pointer.
//! -   The `utils` module contains a selection of low-level types upon which the implementations are built.
//!
//!
//! #   Storage vs Sequence
//!
//! A storage knows its capacity, and nothing else. It never reads, nor drops, the content of its slots: the sequence
//! which owns it tracks which slots are live, and is responsible for destructing them before the storage releases its
//! memory.
//!
//! This split is what allows the same `Array` to be backed by heap memory, by an inline buffer, or by memory handed out
//! by a custom allocator.
//!
//! ```
//! #   use storage_array::{collections::Array, storage::InlineStorage};
//! let mut heap: Array<u32> = Array::new();
//! let mut inline: Array<u32, InlineStorage<u32, 4>> = Array::new();
//!
//! for i in 0..4 {
//!     heap.push(i);
//!     inline.push(i);
//! }
//!
//! assert_eq!(heap, inline);
//! assert!(inline.try_push(4).is_err());
//! ```
//!
//!
//! #   Why not `Vec`?
//!
//! `Vec` bakes in its storage strategy: heap memory, from an allocator. Small-vector and fixed-capacity alternatives
//! then each re-implement the whole sequence on top of their own memory strategy, with their own subtle bugs.
//!
//! Pulling the strategy out behind a narrow trait means the sequence logic, growth and unwinding in particular, is
//! written and audited once.

#![cfg_attr(not(test), no_std)]
//  Features (language)
//  Features (library)
#![cfg_attr(feature = "allocator_api", feature(allocator_api))]
//  Lints
#![deny(missing_docs)]
//  This author prefers to keep its test modules close to what they are testing.
#![allow(clippy::items_after_test_module)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[macro_use]
mod macros;

pub mod collections;
pub mod storage;
pub mod utils;

#[cfg(feature = "alloc")]
pub mod pointers;

#[cfg(test)]
mod testing;
