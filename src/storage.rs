//! Raw storage strategies for sequences.
//!
//! A `Storage<T>` is a block of slots, each able to hold a `T`, none of which is initialized by the storage itself.
//! The sequence owning the storage decides which slots to construct elements into, and is responsible for destructing
//! them before the storage releases its memory.

#[cfg(feature = "alloc")]
mod heap;
mod inline;

#[cfg(feature = "alloc")]
pub use heap::HeapStorage;
pub use inline::InlineStorage;

use core::{mem, ptr};

use crate::utils::StorageError;

/// The capability of providing raw slots for elements of type `T`.
///
/// A storage tracks its capacity, and nothing else: it does not know which of its slots currently hold a live element.
/// The owner of the storage, typically a sequence, is responsible for:
///
/// -   Only constructing into slots that are not live.
/// -   Only accessing, or destructing, slots that are live.
/// -   Destructing all live slots before calling `allocate`, `deallocate`, or dropping the storage.
///
/// Dropping a storage releases its memory, without dropping any element: elements still live at that point are
/// leaked.
///
/// #   Safety
///
/// Implementers guarantee that:
///
/// -   Addressable: after `allocate(n)` succeeds, `capacity()` is at least `n`, and `as_mut_ptr()` points to
///     `capacity()` properly aligned slots of `T`, valid for reads and writes.
/// -   Stable: the memory of the slots, and therefore their content, is only replaced or released by `allocate`,
///     `deallocate`, or dropping the storage. Moving the storage moves the content of its slots along, if need be.
/// -   Inert: the storage never reads, writes, nor drops the content of its slots.
pub unsafe trait Storage<T> {
    /// Returns a new, empty, storage of the same strategy.
    ///
    /// If the strategy is parameterized by an allocator, the new storage shares the allocator of `self`.
    fn empty_like(&self) -> Self
    where
        Self: Sized;

    /// Returns the number of addressable slots.
    ///
    /// Addressable is not constructed: slots are only live once an element has been constructed into them.
    fn capacity(&self) -> usize;

    /// Replaces the backing memory with a block of at least `capacity` slots.
    ///
    /// The content of the previous block, if any, is lost: all its live elements must have been destructed, or moved
    /// out, beforehand. On error, `self` is left unchanged.
    fn allocate(&mut self, capacity: usize) -> Result<(), StorageError>;

    /// Releases the backing memory, if any.
    ///
    /// All live elements must have been destructed, or moved out, beforehand. Idempotent.
    fn deallocate(&mut self);

    /// Returns a pointer to the first slot.
    ///
    /// The pointer is non-null and properly aligned, even if the capacity is 0.
    fn as_ptr(&self) -> *const T;

    /// Returns a pointer to the first slot.
    ///
    /// The pointer is non-null and properly aligned, even if the capacity is 0.
    fn as_mut_ptr(&mut self) -> *mut T;

    /// Constructs `value` in the slot at `index`.
    ///
    /// #   Safety
    ///
    /// -   Bounds: `index` must be strictly less than `self.capacity()`.
    /// -   Vacancy: the slot at `index` must not be live, or its element is leaked.
    #[inline]
    unsafe fn construct(&mut self, index: usize, value: T) {
        debug_assert!(index < self.capacity(), "{} >= {}", index, self.capacity());

        //  Safety:
        //  -   The slot is valid for writes, and properly aligned, as per Bounds pre-condition and Addressable.
        unsafe { self.as_mut_ptr().add(index).write(value) }
    }

    /// Destructs the element in the slot at `index`, in place.
    ///
    /// The capacity is unchanged.
    ///
    /// #   Safety
    ///
    /// -   Bounds: `index` must be strictly less than `self.capacity()`.
    /// -   Liveness: the slot at `index` must be live. It no longer is, after the call.
    #[inline]
    unsafe fn destruct(&mut self, index: usize) {
        debug_assert!(index < self.capacity(), "{} >= {}", index, self.capacity());

        //  Safety:
        //  -   The slot is valid for reads & writes, and properly aligned, as per Bounds pre-condition and Addressable.
        //  -   The slot holds a live element, as per Liveness pre-condition.
        unsafe { ptr::drop_in_place(self.as_mut_ptr().add(index)) }
    }

    /// Returns a reference to the element in the slot at `index`.
    ///
    /// #   Safety
    ///
    /// -   Bounds: `index` must be strictly less than `self.capacity()`.
    /// -   Liveness: the slot at `index` must be live.
    #[inline]
    unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert!(index < self.capacity(), "{} >= {}", index, self.capacity());

        //  Safety:
        //  -   The slot is valid for reads, and properly aligned, as per Bounds pre-condition and Addressable.
        //  -   The slot holds a live element, as per Liveness pre-condition.
        unsafe { &*self.as_ptr().add(index) }
    }

    /// Returns a mutable reference to the element in the slot at `index`.
    ///
    /// #   Safety
    ///
    /// -   Bounds: `index` must be strictly less than `self.capacity()`.
    /// -   Liveness: the slot at `index` must be live.
    #[inline]
    unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.capacity(), "{} >= {}", index, self.capacity());

        //  Safety:
        //  -   The slot is valid for reads & writes, and properly aligned, as per Bounds pre-condition and Addressable.
        //  -   The slot holds a live element, as per Liveness pre-condition.
        unsafe { &mut *self.as_mut_ptr().add(index) }
    }

    /// Exchanges the backing memory, and capacity, of `self` and `other`.
    ///
    /// Live elements follow their memory: the owners of both storages must exchange their bookkeeping too.
    #[inline]
    fn swap(&mut self, other: &mut Self)
    where
        Self: Sized,
    {
        mem::swap(self, other);
    }
}
