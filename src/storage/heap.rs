//  Heap storage, parameterized by an allocator.

use core::{alloc::Layout, fmt, marker::PhantomData, mem, ptr::NonNull};

use crate::utils::{
    StorageError,
    alloc::{Allocator, Global},
};

use super::Storage;

/// Heap allocated implementation of `Storage`.
///
/// The memory is obtained from the allocator `A`, which defaults to the global allocator. Zero-sized types never
/// allocate, and report a capacity of `usize::MAX`.
///
/// ```
/// #   use storage_array::storage::{HeapStorage, Storage};
/// let mut storage = HeapStorage::<u32>::new();
///
/// assert_eq!(0, storage.capacity());
///
/// storage.allocate(8).expect("allocation");
///
/// assert_eq!(8, storage.capacity());
/// ```
pub struct HeapStorage<T, A = Global>
where
    A: Allocator,
{
    //  Safety Invariants:
    //  -   Empty Dangling: if `capacity` is 0, `ptr` is dangling, yet properly aligned.
    //  -   Self-Allocated: if `capacity` is not 0, `ptr` was allocated by `allocator` with `Self::layout(capacity)`.
    //  -   Zero-Sized: if `T` is zero-sized, `capacity` is 0.
    ptr: NonNull<T>,
    capacity: usize,
    allocator: A,
    _marker: PhantomData<T>,
}

//
//  Creation
//

impl<T> HeapStorage<T, Global> {
    /// Returns a new, empty, instance.
    ///
    /// Does not allocate.
    pub const fn new() -> Self {
        Self::new_in(Global)
    }

    /// Returns a new instance, with at least `capacity` slots.
    ///
    /// #   Errors
    ///
    /// Returns an error if the layout of `capacity` slots overflows, or if the allocation fails.
    pub fn with_capacity(capacity: usize) -> Result<Self, StorageError> {
        let mut this = Self::new();

        this.allocate(capacity)?;

        Ok(this)
    }
}

impl<T, A> HeapStorage<T, A>
where
    A: Allocator,
{
    /// Returns a new, empty, instance, allocating from `allocator`.
    ///
    /// Does not allocate.
    pub const fn new_in(allocator: A) -> Self {
        //  Safety Invariant:
        //  -   Empty Dangling: a dangling, properly aligned, pointer with a capacity of 0.
        let ptr = NonNull::dangling();

        Self {
            ptr,
            capacity: 0,
            allocator,
            _marker: PhantomData,
        }
    }

    /// Returns a reference to the allocator.
    pub const fn allocator(&self) -> &A {
        &self.allocator
    }
}

//
//  Storage
//

//  Safety:
//  -   Addressable: `allocate` either allocates exactly `capacity` slots from `Self::layout`, or, for zero-sized types,
//      reports a capacity of `usize::MAX` which any properly aligned pointer can address.
//  -   Stable: the memory block is only replaced by `allocate`, and released by `deallocate` or `drop`. It lives on the
//      heap, so moving `self` does not move it.
//  -   Inert: no method reads, writes, or drops a slot.
unsafe impl<T, A> Storage<T> for HeapStorage<T, A>
where
    A: Allocator + Clone,
{
    #[inline]
    fn empty_like(&self) -> Self {
        Self::new_in(self.allocator.clone())
    }

    #[inline]
    fn capacity(&self) -> usize {
        if Self::IS_ZERO_SIZED { usize::MAX } else { self.capacity }
    }

    fn allocate(&mut self, capacity: usize) -> Result<(), StorageError> {
        if Self::IS_ZERO_SIZED {
            return Ok(());
        }

        if capacity == 0 {
            self.deallocate();
            return Ok(());
        }

        let layout = Self::layout(capacity)?;

        let block = self
            .allocator
            .allocate(layout)
            .map_err(|_| StorageError::AllocFailed { layout })?;

        trace!(
            "allocated {} slots of {} bytes, replacing {} slots",
            capacity,
            mem::size_of::<T>(),
            self.capacity
        );

        //  Only release the previous block once the new one is secured, so that `self` is unchanged on error.
        self.deallocate();

        //  Safety Invariant:
        //  -   Self-Allocated: `block` was just allocated by `self.allocator` with `Self::layout(capacity)`.
        self.ptr = block.cast();
        self.capacity = capacity;

        Ok(())
    }

    fn deallocate(&mut self) {
        if self.capacity == 0 {
            return;
        }

        //  Safety:
        //  -   Liveness: `self.ptr` is allocated, as `self.capacity` is not 0, as per Safety Invariants.
        //  -   Allocator: `self.ptr` was allocated by `self.allocator`, as per Self-Allocated Invariant.
        unsafe { Self::release(&self.allocator, self.ptr, self.capacity) };

        //  Safety Invariant:
        //  -   Empty Dangling: restored.
        self.ptr = NonNull::dangling();
        self.capacity = 0;
    }

    #[inline]
    fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    #[inline]
    fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }
}

//
//  Common traits
//

impl<T, A> Drop for HeapStorage<T, A>
where
    A: Allocator,
{
    fn drop(&mut self) {
        if self.capacity == 0 {
            return;
        }

        //  Safety:
        //  -   Liveness: `self.ptr` is allocated, as `self.capacity` is not 0, as per Safety Invariants.
        //  -   Allocator: `self.ptr` was allocated by `self.allocator`, as per Self-Allocated Invariant.
        unsafe { Self::release(&self.allocator, self.ptr, self.capacity) };
    }
}

impl<T, A> fmt::Debug for HeapStorage<T, A>
where
    A: Allocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        let capacity = if Self::IS_ZERO_SIZED { usize::MAX } else { self.capacity };

        f.debug_struct("HeapStorage")
            .field("ptr", &self.ptr)
            .field("capacity", &capacity)
            .finish_non_exhaustive()
    }
}

impl<T, A> Default for HeapStorage<T, A>
where
    A: Allocator + Default,
{
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

//  Safety:
//  -   Just like a `Vec<T, A>`: the storage owns its block, and elements are only reachable through its owner.
unsafe impl<T, A> Send for HeapStorage<T, A> where A: Allocator + Send, T: Send {}

unsafe impl<T, A> Sync for HeapStorage<T, A> where A: Allocator + Sync, T: Sync {}

//
//  Allocation implementation.
//

impl<T, A> HeapStorage<T, A>
where
    A: Allocator,
{
    const IS_ZERO_SIZED: bool = mem::size_of::<T>() == 0;

    fn layout(capacity: usize) -> Result<Layout, StorageError> {
        debug_assert!(capacity > 0);

        Layout::array::<T>(capacity).map_err(|_| StorageError::CapacityOverflow)
    }

    //  #   Safety
    //
    //  -   Liveness: `ptr` is currently allocated.
    //  -   Allocator: `ptr` was allocated by `allocator`, with `Self::layout(capacity)`.
    #[inline(never)]
    unsafe fn release(allocator: &A, ptr: NonNull<T>, capacity: usize) {
        let layout = Self::layout(capacity);

        #[cfg(debug_assertions)]
        let layout = layout.expect("valid layout");

        //  Safety:
        //  -   Valid since `ptr` was allocated with `Self::layout(capacity)` as per the Allocator pre-condition, which
        //      cannot succeed without `Self::layout`, a pure function, succeeding.
        #[cfg(not(debug_assertions))]
        let layout = unsafe { layout.unwrap_unchecked() };

        //  Safety:
        //  -   `ptr` is currently allocated, as per Liveness pre-condition.
        //  -   `layout` is the same as used for allocation, as per Allocator pre-condition.
        unsafe { allocator.deallocate(ptr.cast(), layout) }
    }
}

// mod tests
