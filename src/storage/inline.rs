//  Inline storage, of fixed capacity.

use core::{fmt, mem::MaybeUninit};

use crate::utils::StorageError;

use super::Storage;

/// Inline implementation of `Storage`, with a fixed capacity of `N` slots.
///
/// Never allocates: requests for up to `N` slots succeed, requests for more fail.
///
/// ```
/// #   use storage_array::{storage::{InlineStorage, Storage}, utils::StorageError};
/// let mut storage = InlineStorage::<u32, 4>::new();
///
/// assert_eq!(4, storage.capacity());
/// assert_eq!(Ok(()), storage.allocate(3));
/// assert_eq!(
///     Err(StorageError::CapacityExceeded { requested: 5, capacity: 4 }),
///     storage.allocate(5)
/// );
/// ```
pub struct InlineStorage<T, const N: usize> {
    slots: [MaybeUninit<T>; N],
}

impl<T, const N: usize> InlineStorage<T, N> {
    /// Returns a new instance, with all `N` slots available.
    pub const fn new() -> Self {
        Self {
            slots: [const { MaybeUninit::uninit() }; N],
        }
    }
}

//  Safety:
//  -   Addressable: the `N` slots are embedded, and `MaybeUninit<T>` has the layout of `T`.
//  -   Stable: the slots are only ever moved along with `self`.
//  -   Inert: `MaybeUninit` never drops its content, and no method reads or writes a slot.
unsafe impl<T, const N: usize> Storage<T> for InlineStorage<T, N> {
    #[inline]
    fn empty_like(&self) -> Self {
        Self::new()
    }

    #[inline]
    fn capacity(&self) -> usize {
        N
    }

    #[inline]
    fn allocate(&mut self, capacity: usize) -> Result<(), StorageError> {
        if capacity > N {
            return Err(StorageError::CapacityExceeded { requested: capacity, capacity: N });
        }

        Ok(())
    }

    #[inline]
    fn deallocate(&mut self) {}

    #[inline]
    fn as_ptr(&self) -> *const T {
        self.slots.as_ptr().cast()
    }

    #[inline]
    fn as_mut_ptr(&mut self) -> *mut T {
        self.slots.as_mut_ptr().cast()
    }
}

//
//  Common traits
//

impl<T, const N: usize> fmt::Debug for InlineStorage<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("InlineStorage").field("capacity", &N).finish_non_exhaustive()
    }
}

impl<T, const N: usize> Default for InlineStorage<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

// mod tests
