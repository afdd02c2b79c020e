//  Shared pointer, and its control block.

use core::{
    cmp, fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    mem,
    ops::Deref,
    ptr::{self, NonNull},
    sync::atomic::{AtomicUsize, Ordering},
};

use ::alloc::boxed::Box;

/// A nullable handle to a reference-counted value.
///
/// Cloning a handle increments the reference count, dropping or resetting it decrements it, and the last handle
/// destroys the value. The value is either embedded in the control block, by `SharedPtr::new`, or allocated separately
/// and owned by the control block, by `SharedPtr::from_box`.
///
/// ```
/// #   use storage_array::pointers::SharedPtr;
/// let first = SharedPtr::new(5);
/// let second = first.clone();
///
/// assert_eq!(2, first.use_count());
/// assert_eq!(5, *second);
/// assert!(first.ptr_eq(&second));
///
/// drop(first);
///
/// assert_eq!(1, second.use_count());
/// ```
pub struct SharedPtr<T> {
    //  Safety Invariants:
    //  -   Null Together: `block` is `None` if and only if `ptr` is null.
    //  -   Counted: if `block` is `Some`, it points to a live control block, whose count accounts for `self`.
    //  -   Cached: if `block` is `Some`, `ptr` points to the value owned by this control block.
    block: Option<NonNull<ControlBlock<T>>>,
    ptr: *const T,
    _marker: PhantomData<T>,
}

//
//  Creation
//

impl<T> SharedPtr<T> {
    /// Returns a null handle.
    #[inline]
    pub const fn null() -> Self {
        Self {
            block: None,
            ptr: ptr::null(),
            _marker: PhantomData,
        }
    }

    /// Returns a handle to `value`, embedded in its control block.
    ///
    /// A single allocation holds both the count and the value.
    pub fn new(value: T) -> Self {
        Self::from_payload(Payload::InPlace(value))
    }

    /// Returns a handle to the value of `value`, owned by a separate control block.
    pub fn from_box(value: Box<T>) -> Self {
        let value = NonNull::from(Box::leak(value));

        Self::from_payload(Payload::Pointer(value))
    }

    /// Returns a handle to the value pointed to by `ptr`, or a null handle if `ptr` is null.
    ///
    /// #   Safety
    ///
    /// -   Boxed: if non-null, `ptr` must have been obtained from `Box::into_raw`.
    /// -   Exclusive: the value pointed to by `ptr` must not be used, nor freed, by the caller afterwards.
    pub unsafe fn from_raw(ptr: *mut T) -> Self {
        if ptr.is_null() {
            return Self::null();
        }

        //  Safety:
        //  -   Boxed, Exclusive: as per pre-conditions.
        let value = unsafe { Box::from_raw(ptr) };

        Self::from_box(value)
    }
}

//
//  Access
//

impl<T> SharedPtr<T> {
    /// Returns whether the handle is null.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.block.is_none()
    }

    /// Returns a reference to the value, if not null.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        if self.ptr.is_null() {
            return None;
        }

        //  Safety:
        //  -   `self.ptr` points to the live value of a live control block, as per Cached and Counted Invariants.
        //  -   The value is never mutably borrowed through a handle.
        Some(unsafe { &*self.ptr })
    }

    /// Returns a pointer to the value, or a null pointer.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    /// Returns the number of handles to the value, or 0 if null.
    ///
    /// The count may be stale by the time it is returned, if handles are cloned, or dropped, concurrently.
    #[inline]
    pub fn use_count(&self) -> usize {
        self.control_block().map_or(0, |block| block.count.load(Ordering::Relaxed))
    }

    /// Returns whether `self` and `other` point to the same value, or are both null.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        ptr::eq(self.ptr, other.ptr)
    }
}

//
//  Modification
//

impl<T> SharedPtr<T> {
    /// Releases the value, leaving the handle null.
    ///
    /// The value is destroyed if this was the last handle to it.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::null();
    }

    /// Releases the value, then takes ownership of `value`.
    pub fn reset_to(&mut self, value: Box<T>) {
        *self = Self::from_box(value);
    }

    /// Exchanges the values pointed to by `self` and `other`.
    ///
    /// No count is modified.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }
}

//
//  Common traits
//

impl<T> Clone for SharedPtr<T> {
    fn clone(&self) -> Self {
        if let Some(block) = self.control_block() {
            //  Relaxed: the new handle is derived from an existing one, hence the count cannot concurrently reach 0.
            let previous = block.count.fetch_add(1, Ordering::Relaxed);

            if previous > isize::MAX as usize {
                block.count.fetch_sub(1, Ordering::Relaxed);

                panic!("reference count overflow");
            }
        }

        Self {
            block: self.block,
            ptr: self.ptr,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for SharedPtr<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self.get() {
            Some(value) => f.debug_tuple("SharedPtr").field(value).finish(),
            None => f.write_str("SharedPtr(null)"),
        }
    }
}

impl<T> Default for SharedPtr<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> Deref for SharedPtr<T> {
    type Target = T;

    #[inline]
    #[track_caller]
    fn deref(&self) -> &T {
        match self.get() {
            Some(value) => value,
            None => panic!("dereferenced a null SharedPtr"),
        }
    }
}

impl<T> Drop for SharedPtr<T> {
    fn drop(&mut self) {
        let Some(block) = self.block else { return };

        //  AcqRel: the last handle observes all uses of the value by other handles before destroying it.
        //
        //  Safety:
        //  -   `block` is live, as per Counted Invariant.
        let previous = unsafe { block.as_ref() }.count.fetch_sub(1, Ordering::AcqRel);

        if previous != 1 {
            return;
        }

        //  Safety:
        //  -   Last: the count just reached 0, hence no other handle to `block` remains.
        unsafe { ControlBlock::release(block) };
    }
}

impl<T> Eq for SharedPtr<T> {}

impl<T> From<Box<T>> for SharedPtr<T> {
    fn from(value: Box<T>) -> Self {
        Self::from_box(value)
    }
}

impl<T> Hash for SharedPtr<T> {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.ptr.hash(state);
    }
}

impl<T> Ord for SharedPtr<T> {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.ptr.cmp(&other.ptr)
    }
}

impl<T> PartialEq for SharedPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T> PartialOrd for SharedPtr<T> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> fmt::Pointer for SharedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        fmt::Pointer::fmt(&self.ptr, f)
    }
}

//  Safety:
//  -   Just like `Arc<T>`: handles on different threads share `&T`, and the last one, on any thread, drops `T`.
unsafe impl<T> Send for SharedPtr<T> where T: Send + Sync {}

unsafe impl<T> Sync for SharedPtr<T> where T: Send + Sync {}

//
//  Implementation
//

impl<T> SharedPtr<T> {
    fn from_payload(payload: Payload<T>) -> Self {
        let block = Box::new(ControlBlock {
            count: AtomicUsize::new(1),
            payload,
        });

        let block = NonNull::from(Box::leak(block));

        //  Safety:
        //  -   `block` was just allocated, and is not otherwise referenced.
        let ptr = unsafe { block.as_ref() }.payload.as_ptr();

        Self {
            block: Some(block),
            ptr,
            _marker: PhantomData,
        }
    }

    fn control_block(&self) -> Option<&ControlBlock<T>> {
        //  Safety:
        //  -   `block` is live, as per Counted Invariant.
        self.block.map(|block| unsafe { block.as_ref() })
    }
}

//  The unit of ownership, shared by all handles to a value.
struct ControlBlock<T> {
    count: AtomicUsize,
    payload: Payload<T>,
}

//  The ownership strategy of the value.
enum Payload<T> {
    //  Separately allocated, by `Box`.
    Pointer(NonNull<T>),
    //  Embedded in the control block.
    InPlace(T),
}

impl<T> Payload<T> {
    fn as_ptr(&self) -> *const T {
        match self {
            Self::Pointer(value) => value.as_ptr().cast_const(),
            Self::InPlace(value) => ptr::from_ref(value),
        }
    }
}

impl<T> ControlBlock<T> {
    //  Destroys the value, then frees the block.
    //
    //  #   Safety
    //
    //  -   Allocated: `block` must have been allocated by `SharedPtr::from_payload`.
    //  -   Last: no handle to `block` may remain.
    unsafe fn release(block: NonNull<Self>) {
        //  Safety:
        //  -   Allocated: `block` was allocated by `Box`, and leaked.
        //  -   Last: `block` is not otherwise referenced.
        let block = unsafe { Box::from_raw(block.as_ptr()) };

        let ControlBlock { payload, .. } = *block;

        match payload {
            Payload::Pointer(value) => {
                trace!("finalizing pointer control block");

                //  Safety:
                //  -   `value` was obtained from `Box::leak`, in `SharedPtr::from_box`, and is dropped exactly once.
                drop(unsafe { Box::from_raw(value.as_ptr()) });
            }
            Payload::InPlace(value) => {
                trace!("finalizing in-place control block");

                drop(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::atomic::AtomicUsize, thread};

    use crate::testing::Tracked;

    use super::*;

    #[test]
    fn null() {
        let null = SharedPtr::<u32>::null();

        assert!(null.is_null());
        assert_eq!(None, null.get());
        assert_eq!(0, null.use_count());
        assert!(null.as_ptr().is_null());
        assert_eq!(null, SharedPtr::default());
        assert_eq!("SharedPtr(null)", format!("{null:?}"));

        let copy = null.clone();

        assert!(copy.is_null());
    }

    #[test]
    #[should_panic]
    fn null_deref() {
        let null = SharedPtr::<u32>::null();

        let _value: u32 = *null;
    }

    #[test]
    fn make_shared_protocol() {
        let first = SharedPtr::new(Tracked::new(5));

        let second = first.clone();
        let mut third = first.clone();
        let mut fourth = first.clone();

        assert_eq!(4, first.use_count());
        assert_eq!(5, *fourth.value());
        assert_eq!(1, Tracked::live());

        third.reset();
        fourth.reset();
        drop(second);

        assert_eq!(1, first.use_count());
        assert_eq!(0, third.use_count());
        assert_eq!(1, Tracked::live());

        drop(first);

        Tracked::expect_no_instances();
    }

    #[test]
    fn from_box_protocol() {
        let first = SharedPtr::from_box(Box::new(Tracked::new(7)));

        let second = first.clone();

        assert_eq!(2, second.use_count());
        assert_eq!(Some(7), second.get().map(|t| *t.value()));

        drop(first);

        assert_eq!(1, Tracked::live());

        drop(second);

        Tracked::expect_no_instances();
    }

    #[test]
    fn from_raw() {
        let raw = Box::into_raw(Box::new(Tracked::new(3)));

        //  Safety:
        //  -   Boxed, Exclusive: `raw` is fresh from `Box::into_raw`, and not used afterwards.
        let shared = unsafe { SharedPtr::from_raw(raw) };

        assert_eq!(raw.cast_const(), shared.as_ptr());
        assert_eq!(1, shared.use_count());

        //  Safety:
        //  -   Null pointers are accepted.
        let null = unsafe { SharedPtr::<Tracked>::from_raw(ptr::null_mut()) };

        assert!(null.is_null());

        drop(shared);

        Tracked::expect_no_instances();
    }

    #[test]
    fn reset_to() {
        let mut shared = SharedPtr::new(Tracked::new(1));
        let other = shared.clone();

        shared.reset_to(Box::new(Tracked::new(2)));

        assert_eq!(2, *shared.value());
        assert_eq!(1, *other.value());
        assert_eq!(1, other.use_count());
        assert_eq!(2, Tracked::live());

        drop((shared, other));

        Tracked::expect_no_instances();
    }

    #[test]
    fn swap() {
        let mut a = SharedPtr::new(1);
        let mut b = SharedPtr::null();

        a.swap(&mut b);

        assert!(a.is_null());
        assert_eq!(Some(&1), b.get());
    }

    #[test]
    fn move_leaves_null() {
        let mut source = SharedPtr::new(String::from("moved"));

        let target = mem::take(&mut source);

        assert!(source.is_null());
        assert_eq!("moved", target.as_str());
        assert_eq!(1, target.use_count());
    }

    #[test]
    fn comparisons() {
        let a = SharedPtr::new(1);
        let b = SharedPtr::new(1);
        let c = a.clone();

        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(a.as_ptr().cmp(&b.as_ptr()), a.cmp(&b));
        assert_eq!(format!("{:p}", a.as_ptr()), format!("{a:p}"));
        assert_eq!("SharedPtr(1)", format!("{a:?}"));
    }

    #[test]
    fn concurrent_clones() {
        const THREADS: usize = 8;
        const ROUNDS: usize = 1_000;

        let drops = AtomicUsize::new(0);

        {
            let shared = SharedPtr::new(DropCounter(&drops));

            thread::scope(|scope| {
                for _ in 0..THREADS {
                    let local = shared.clone();

                    scope.spawn(move || {
                        for _ in 0..ROUNDS {
                            let copy = local.clone();

                            assert!(copy.use_count() >= 2);
                        }
                    });
                }
            });

            assert_eq!(1, shared.use_count());
            assert_eq!(0, drops.load(Ordering::Relaxed));
        }

        assert_eq!(1, drops.load(Ordering::Relaxed));
    }

    struct DropCounter<'a>(&'a AtomicUsize);

    impl Drop for DropCounter<'_> {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }
} // mod tests
