//! Storage-generic sequences.

//  Design considerations
//
//  #   Why a distinct `BitArray`?
//
//  A specialized `Array<bool>` would have to hand out `&mut bool` from `IndexMut` and `as_mut_slice`, which a packed
//  bit cannot provide. A distinct type is upfront about the proxy it hands out instead.
//
//  #   Why cursors?
//
//  Slices already provide iteration over an `Array`. Cursors are random-access positions, which can be moved around,
//  compared, and subtracted, and which know which container they belong to.

pub mod array;
pub mod bit_array;

pub use array::{Array, Cursor, IntoIter};
pub use bit_array::{BitArray, BitCursor, BitIter, BitRef};
