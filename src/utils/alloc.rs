//! Allocator abstraction of `HeapStorage`, stable or not.
//!
//! -   If only `alloc` is used, then provides the subset of the allocator API used by `HeapStorage`.
//! -   If `allocator_api` is used, then forwards the allocator API.
//!
//! Either way, `HeapStorage<T, A>` is written against `Allocator`, so that switching the feature on only widens the set
//! of allocators it accepts.

#[cfg(feature = "allocator_api")]
pub use ::alloc::alloc::{AllocError, Allocator, Global};

#[cfg(not(feature = "allocator_api"))]
pub use shim::{AllocError, Allocator, Global};

#[cfg(not(feature = "allocator_api"))]
pub(super) mod shim {
    use core::{
        alloc::Layout,
        error, fmt,
        ptr::{self, NonNull},
    };

    /// Failure to allocate a block, whether memory is exhausted or the layout is not supported by the allocator.
    #[derive(Copy, Clone, PartialEq, Eq, Debug)]
    pub struct AllocError;

    impl fmt::Display for AllocError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
            f.write_str("memory allocation failed")
        }
    }

    impl error::Error for AllocError {}

    /// A source of memory blocks, each described by a `Layout`.
    ///
    /// #   Safety
    ///
    /// -   Liveness: a block handed out remains valid until deallocated, or until the allocator and all its clones are
    ///     dropped, whichever comes first.
    /// -   Independence: a block handed out remains valid when the allocator is moved.
    /// -   Shallowness: clones of an allocator share its blocks, a block allocated by one may be deallocated by any.
    pub unsafe trait Allocator {
        /// Allocates a block fitting `layout`, whose content is uninitialized.
        fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError>;

        /// Returns the block at `ptr` to the allocator.
        ///
        /// #   Safety
        ///
        /// -   Liveness: the block at `ptr` must not have been deallocated already.
        /// -   Selfness: the block at `ptr` must come from `self`, or one of its clones.
        /// -   Layout: `layout` must be the one the block at `ptr` was allocated with.
        unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

        /// Returns `self` by reference, which is itself an allocator.
        fn by_ref(&self) -> &Self
        where
            Self: Sized,
        {
            self
        }
    }

    //  Safety:
    //  -   Liveness, Independence, Shallowness: forwarded to `A`.
    unsafe impl<A> Allocator for &A
    where
        A: ?Sized + Allocator,
    {
        #[inline]
        fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
            (**self).allocate(layout)
        }

        #[inline]
        unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
            //  Safety: forwarded.
            unsafe { (**self).deallocate(ptr, layout) }
        }
    }

    /// The allocator registered with `#[global_allocator]`, or the system allocator by default.
    #[derive(Copy, Clone, Default, Debug)]
    pub struct Global;

    //  Safety:
    //  -   Liveness, Independence, Shallowness: guaranteed by the global allocator.
    unsafe impl Allocator for Global {
        #[inline]
        fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
            if layout.size() == 0 {
                //  Dangling, yet properly aligned.
                let dangling = NonNull::new(ptr::without_provenance_mut::<u8>(layout.align())).ok_or(AllocError)?;

                return Ok(NonNull::slice_from_raw_parts(dangling, 0));
            }

            //  Safety:
            //  -   `layout` has a non-zero size.
            let raw_ptr = unsafe { ::alloc::alloc::alloc(layout) };

            let ptr = NonNull::new(raw_ptr).ok_or(AllocError)?;

            Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
        }

        #[inline]
        unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
            if layout.size() == 0 {
                return;
            }

            //  Safety:
            //  -   Liveness, Selfness, Layout: as per pre-conditions, and `ptr` is not zero-sized.
            unsafe { ::alloc::alloc::dealloc(ptr.as_ptr(), layout) }
        }
    }
} // mod shim

#[cfg(all(test, not(feature = "allocator_api")))]
mod tests {
    use core::alloc::Layout;

    use super::*;

    #[test]
    fn global_round_trip() {
        let layout = Layout::array::<u64>(4).expect("valid layout");

        let block = Global.allocate(layout).expect("allocation");

        assert_eq!(layout.size(), block.len());

        let ptr = block.cast::<u64>();

        assert_eq!(0, ptr.as_ptr() as usize % layout.align());

        //  Safety:
        //  -   `ptr` is valid for 4 writes of `u64`, and properly aligned.
        unsafe { ptr.as_ptr().write_bytes(0xAB, 4) };

        //  Safety:
        //  -   Liveness, Selfness, Layout: freshly allocated by `Global`, with `layout`.
        unsafe { Global.deallocate(block.cast(), layout) };
    }

    #[test]
    fn global_zero_sized() {
        let layout = Layout::from_size_align(0, 16).expect("valid layout");

        let block = Global.by_ref().allocate(layout).expect("allocation");

        assert_eq!(0, block.len());
        assert_eq!(0, block.cast::<u8>().as_ptr() as usize % 16);

        //  Safety:
        //  -   Zero-sized blocks are never actually deallocated.
        unsafe { Global.deallocate(block.cast(), layout) };
    }
} // mod tests
