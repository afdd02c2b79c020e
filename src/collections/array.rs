//! A growable sequence, generic over its storage.

use core::{
    cmp,
    convert::Infallible,
    fmt,
    hash::{Hash, Hasher},
    iter::FusedIterator,
    marker::PhantomData,
    mem::{self, ManuallyDrop},
    ops::{Add, AddAssign, Deref, DerefMut, Index, IndexMut, RangeBounds, Sub, SubAssign},
    ptr,
    slice::{self, SliceIndex},
};

#[cfg(feature = "alloc")]
use crate::storage::HeapStorage;

use crate::{
    storage::Storage,
    utils::{MismatchedCursorsError, OutOfRangeError, PushError, StorageError, resolve_range},
};

/// A growable sequence of `T`, generic over its storage.
///
/// The elements are stored contiguously, in the slots `[0, len)` of the storage.
///
/// ```
/// #   use storage_array::collections::Array;
/// let mut array: Array<i32> = Array::with_len(10);
///
/// array[0] = 1;
/// array.push(100);
///
/// assert_eq!(11, array.len());
/// assert_eq!(1, array[0]);
/// assert_eq!(100, array[10]);
/// ```
#[cfg(feature = "alloc")]
pub struct Array<T, S = HeapStorage<T>>
where
    S: Storage<T>,
{
    //  Safety Invariants:
    //  -   Live Prefix: the slots `[0, len)` of `storage` hold live elements, and no other slot does.
    //  -   Bounded: `len <= storage.capacity()`.
    storage: S,
    len: usize,
    _marker: PhantomData<T>,
}

/// A growable sequence of `T`, generic over its storage.
///
/// The elements are stored contiguously, in the slots `[0, len)` of the storage.
#[cfg(not(feature = "alloc"))]
pub struct Array<T, S>
where
    S: Storage<T>,
{
    //  Safety Invariants:
    //  -   Live Prefix: the slots `[0, len)` of `storage` hold live elements, and no other slot does.
    //  -   Bounded: `len <= storage.capacity()`.
    storage: S,
    len: usize,
    _marker: PhantomData<T>,
}

//
//  Creation
//

impl<T, S> Array<T, S>
where
    S: Storage<T>,
{
    /// Returns a new, empty, instance.
    ///
    /// Does not allocate.
    #[inline]
    pub fn new() -> Self
    where
        S: Default,
    {
        Self::new_in(S::default())
    }

    /// Returns a new, empty, instance over `storage`.
    ///
    /// Any capacity already held by `storage` is used as is: `storage` must not hold any live element.
    #[inline]
    pub const fn new_in(storage: S) -> Self {
        Self {
            storage,
            len: 0,
            _marker: PhantomData,
        }
    }

    /// Returns a new, empty, instance with a capacity of at least `capacity`.
    ///
    /// #   Panics
    ///
    /// If the storage cannot provide `capacity` slots.
    pub fn with_capacity(capacity: usize) -> Self
    where
        S: Default,
    {
        let mut this = Self::new();

        this.reserve(capacity);

        this
    }

    /// Returns a new instance of `len` default elements.
    ///
    /// #   Panics
    ///
    /// If the storage cannot provide `len` slots.
    pub fn with_len(len: usize) -> Self
    where
        S: Default,
        T: Default,
    {
        Self::from_fn(len, |_| T::default())
    }

    /// Returns a new instance of `len` clones of `value`.
    ///
    /// #   Panics
    ///
    /// If the storage cannot provide `len` slots.
    pub fn from_elem(value: T, len: usize) -> Self
    where
        S: Default,
        T: Clone,
    {
        Self::from_fn(len, |_| value.clone())
    }

    /// Returns a new instance of `len` elements, the element at index `i` being `fun(i)`.
    ///
    /// Should `fun` panic, the elements created so far are dropped, in reverse order, and the memory released.
    ///
    /// #   Panics
    ///
    /// If the storage cannot provide `len` slots.
    pub fn from_fn<F>(len: usize, mut fun: F) -> Self
    where
        S: Default,
        F: FnMut(usize) -> T,
    {
        let Ok(this) = Self::build(S::default(), len, |i| Ok::<_, Infallible>(fun(i)));

        this
    }

    /// Returns a new instance of `len` elements, the element at index `i` being `fun(i)`.
    ///
    /// Should `fun` fail, the elements created so far are dropped, in reverse order, the memory released, and the error
    /// returned.
    ///
    /// ```
    /// #   use storage_array::collections::Array;
    /// let result: Result<Array<u32>, _> = Array::try_from_fn(4, |i| if i < 2 { Ok(i as u32) } else { Err(i) });
    ///
    /// assert_eq!(Err(2), result);
    /// ```
    ///
    /// #   Panics
    ///
    /// If the storage cannot provide `len` slots.
    pub fn try_from_fn<E, F>(len: usize, fun: F) -> Result<Self, E>
    where
        S: Default,
        F: FnMut(usize) -> Result<T, E>,
    {
        Self::build(S::default(), len, fun)
    }
}

//
//  Size & Capacity
//

impl<T, S> Array<T, S>
where
    S: Storage<T>,
{
    const MIN_CAPACITY: usize = 4;

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether there are no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of elements the array can hold without relocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Returns a reference to the underlying storage.
    #[inline]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Ensures that the capacity is at least `capacity`.
    ///
    /// Never shrinks. On relocation, all elements are moved into the new storage before the old one is released.
    ///
    /// #   Panics
    ///
    /// If the storage cannot provide `capacity` slots.
    pub fn reserve(&mut self, capacity: usize) {
        if let Err(error) = self.try_reserve(capacity) {
            error.fail()
        }
    }

    /// Ensures that the capacity is at least `capacity`.
    ///
    /// Never shrinks. On error, `self` is left unchanged.
    pub fn try_reserve(&mut self, capacity: usize) -> Result<(), StorageError> {
        if capacity <= self.capacity() {
            return Ok(());
        }

        self.relocate(capacity)
    }

    /// Reduces the capacity to the number of elements, if the storage allows it.
    ///
    /// #   Panics
    ///
    /// If the storage cannot provide `len` slots.
    pub fn shrink_to_fit(&mut self) {
        if let Err(error) = self.try_shrink_to_fit() {
            error.fail()
        }
    }

    /// Reduces the capacity to the number of elements, if the storage allows it.
    ///
    /// On error, `self` is left unchanged.
    pub fn try_shrink_to_fit(&mut self) -> Result<(), StorageError> {
        if self.capacity() == self.len {
            return Ok(());
        }

        let fresh = self.fresh_storage(self.len)?;

        //  Fixed capacity storages cannot shrink.
        if fresh.capacity() >= self.capacity() {
            return Ok(());
        }

        self.relocate_into(fresh);

        Ok(())
    }
}

//
//  Access
//

impl<T, S> Array<T, S>
where
    S: Storage<T>,
{
    /// Returns a reference to the element at `index`.
    ///
    /// #   Errors
    ///
    /// Returns an error if `index` is out of range.
    #[inline]
    pub fn at(&self, index: usize) -> Result<&T, OutOfRangeError> {
        let len = self.len;

        self.as_slice().get(index).ok_or(OutOfRangeError { index, len })
    }

    /// Returns a mutable reference to the element at `index`.
    ///
    /// #   Errors
    ///
    /// Returns an error if `index` is out of range.
    #[inline]
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, OutOfRangeError> {
        let len = self.len;

        self.as_mut_slice().get_mut(index).ok_or(OutOfRangeError { index, len })
    }

    /// Returns a reference to the first element, if any.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.as_slice().first()
    }

    /// Returns a mutable reference to the first element, if any.
    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().first_mut()
    }

    /// Returns a reference to the last element, if any.
    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.as_slice().last()
    }

    /// Returns a mutable reference to the last element, if any.
    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    /// Returns the elements, as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        //  Safety:
        //  -   The pointer is non-null and properly aligned, as per the Storage guarantees.
        //  -   The first `self.len` slots are live, as per Live Prefix Invariant.
        unsafe { slice::from_raw_parts(self.storage.as_ptr(), self.len) }
    }

    /// Returns the elements, as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        //  Safety:
        //  -   The pointer is non-null and properly aligned, as per the Storage guarantees.
        //  -   The first `self.len` slots are live, as per Live Prefix Invariant.
        unsafe { slice::from_raw_parts_mut(self.storage.as_mut_ptr(), self.len) }
    }

    /// Returns a pointer to the first element.
    ///
    /// The pointer is valid until the next relocation.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.storage.as_ptr()
    }

    /// Returns a pointer to the first element.
    ///
    /// The pointer is valid until the next relocation.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.storage.as_mut_ptr()
    }

    /// Returns a cursor to the first element.
    #[inline]
    pub fn begin(&self) -> Cursor<'_, T> {
        Cursor::new(self.as_slice(), self.origin(), 0)
    }

    /// Returns a cursor one past the last element.
    #[inline]
    pub fn end(&self) -> Cursor<'_, T> {
        Cursor::new(self.as_slice(), self.origin(), self.len)
    }
}

//
//  Modification
//

impl<T, S> Array<T, S>
where
    S: Storage<T>,
{
    /// Appends `value`.
    ///
    /// If the array is full, its capacity is first doubled, amortizing the cost of relocation.
    ///
    /// #   Panics
    ///
    /// If the storage cannot provide the additional slot.
    #[inline]
    pub fn push(&mut self, value: T) {
        if let Err(error) = self.try_push(value) {
            error.error().fail()
        }
    }

    /// Appends `value`.
    ///
    /// #   Errors
    ///
    /// Returns an error, handing `value` back, if the storage cannot provide the additional slot. On error, `self` is
    /// left unchanged.
    pub fn try_push(&mut self, value: T) -> Result<(), PushError<T>> {
        if let Err(error) = self.grow(1) {
            return Err(PushError::new(value, error));
        }

        //  Safety:
        //  -   Bounds: `self.len < self.capacity()`, as per `grow`.
        unsafe { self.push_unchecked(value) };

        Ok(())
    }

    /// Appends the result of `fun`, returning a reference to it.
    ///
    /// The array grows before `fun` is invoked.
    ///
    /// #   Panics
    ///
    /// If the storage cannot provide the additional slot.
    pub fn push_with<F>(&mut self, fun: F) -> &mut T
    where
        F: FnOnce() -> T,
    {
        if let Err(error) = self.grow(1) {
            error.fail()
        }

        let index = self.len;

        //  Safety:
        //  -   Bounds: `self.len < self.capacity()`, as per `grow`.
        unsafe { self.push_unchecked(fun()) };

        //  Safety:
        //  -   Bounds, Liveness: just constructed.
        unsafe { self.storage.get_unchecked_mut(index) }
    }

    /// Appends clones of the elements in `range`.
    ///
    /// The array grows before any element is cloned, hence the clones are taken from their relocated originals.
    ///
    /// Should a clone panic, the clones appended so far remain.
    ///
    /// ```
    /// #   use storage_array::collections::Array;
    /// let mut array: Array<String> = Array::from(["a".to_string()]);
    ///
    /// for _ in 0..3 {
    ///     array.extend_from_within(0..1);
    /// }
    ///
    /// assert_eq!(4, array.len());
    /// assert!(array.iter().all(|s| s == "a"));
    /// ```
    ///
    /// #   Panics
    ///
    /// If `range` is out of range, or if the storage cannot provide the additional slots.
    pub fn extend_from_within<R>(&mut self, range: R)
    where
        R: RangeBounds<usize>,
        T: Clone,
    {
        let range = match resolve_range(range, self.len) {
            Ok(range) => range,
            Err(error) => panic!("{error}"),
        };

        if let Err(error) = self.grow(range.len()) {
            error.fail()
        }

        for index in range {
            //  Safety:
            //  -   Bounds, Liveness: `index` is within the original `[0, len)`, and elements are only appended.
            let value = unsafe { self.storage.get_unchecked(index) }.clone();

            //  Safety:
            //  -   Bounds: `grow` secured `range.len()` slots past the original `len`.
            unsafe { self.push_unchecked(value) };
        }
    }

    /// Removes the last element, and returns it, if any.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        self.len -= 1;

        //  Safety:
        //  -   The slot at `self.len` was live, and is no longer accounted for, hence is read exactly once.
        Some(unsafe { ptr::read(self.storage.as_ptr().add(self.len)) })
    }

    /// Drops the elements at, and after, `len`, if any.
    ///
    /// The capacity is unchanged.
    pub fn truncate(&mut self, len: usize) {
        while self.len > len {
            //  Decrement first, so that a panicking destructor leaks the element rather than dropping it twice.
            self.len -= 1;

            //  Safety:
            //  -   Bounds, Liveness: the slot at `self.len` was live.
            unsafe { self.storage.destruct(self.len) };
        }
    }

    /// Drops all elements.
    ///
    /// The capacity is unchanged.
    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Resizes the array to `len` elements, appending clones of `value` or dropping trailing elements as necessary.
    ///
    /// #   Panics
    ///
    /// If the storage cannot provide `len` slots.
    pub fn resize(&mut self, len: usize, value: T)
    where
        T: Clone,
    {
        self.resize_with(len, || value.clone());
    }

    /// Resizes the array to `len` elements, appending the results of `fun` or dropping trailing elements as necessary.
    ///
    /// Should `fun` panic, the elements appended so far remain.
    ///
    /// #   Panics
    ///
    /// If the storage cannot provide `len` slots.
    pub fn resize_with<F>(&mut self, len: usize, mut fun: F)
    where
        F: FnMut() -> T,
    {
        if len <= self.len {
            self.truncate(len);
            return;
        }

        if let Err(error) = self.grow(len - self.len) {
            error.fail()
        }

        while self.len < len {
            //  Safety:
            //  -   Bounds: `grow` secured `len` slots.
            unsafe { self.push_unchecked(fun()) };
        }
    }

    /// Exchanges the content of `self` and `other`, without moving any element.
    #[inline]
    pub fn swap_with(&mut self, other: &mut Self) {
        self.storage.swap(&mut other.storage);

        mem::swap(&mut self.len, &mut other.len);
    }
}

//
//  Common traits
//

impl<T, S> Clone for Array<T, S>
where
    T: Clone,
    S: Storage<T>,
{
    fn clone(&self) -> Self {
        let elements = self.as_slice();

        let Ok(this) = Self::build(self.storage.empty_like(), self.len, |i| Ok::<_, Infallible>(elements[i].clone()));

        this
    }

    fn clone_from(&mut self, source: &Self) {
        //  Copy and swap: should a clone panic, `self` is left untouched.
        let mut copy = source.clone();

        self.swap_with(&mut copy);
    }
}

impl<T, S> fmt::Debug for Array<T, S>
where
    T: fmt::Debug,
    S: Storage<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T, S> Default for Array<T, S>
where
    S: Default + Storage<T>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> Deref for Array<T, S>
where
    S: Storage<T>,
{
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, S> DerefMut for Array<T, S>
where
    S: Storage<T>,
{
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, S> Drop for Array<T, S>
where
    S: Storage<T>,
{
    fn drop(&mut self) {
        let elements: *mut [T] = self.as_mut_slice();

        //  Safety:
        //  -   `elements` are live, as per Live Prefix Invariant, and never accessed again.
        unsafe { ptr::drop_in_place(elements) };

        self.storage.deallocate();
    }
}

impl<T, S> Eq for Array<T, S>
where
    T: Eq,
    S: Storage<T>,
{
}

impl<T, S> Hash for Array<T, S>
where
    T: Hash,
    S: Storage<T>,
{
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.as_slice().hash(state);
    }
}

impl<T, S, I> Index<I> for Array<T, S>
where
    S: Storage<T>,
    I: SliceIndex<[T]>,
{
    type Output = I::Output;

    #[inline]
    fn index(&self, index: I) -> &Self::Output {
        &self.as_slice()[index]
    }
}

impl<T, S, I> IndexMut<I> for Array<T, S>
where
    S: Storage<T>,
    I: SliceIndex<[T]>,
{
    #[inline]
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        &mut self.as_mut_slice()[index]
    }
}

impl<T, S> Ord for Array<T, S>
where
    T: Ord,
    S: Storage<T>,
{
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<T, U, S, SU> PartialEq<Array<U, SU>> for Array<T, S>
where
    T: PartialEq<U>,
    S: Storage<T>,
    SU: Storage<U>,
{
    fn eq(&self, other: &Array<U, SU>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, U, S> PartialEq<[U]> for Array<T, S>
where
    T: PartialEq<U>,
    S: Storage<T>,
{
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T, U, S> PartialEq<&[U]> for Array<T, S>
where
    T: PartialEq<U>,
    S: Storage<T>,
{
    fn eq(&self, other: &&[U]) -> bool {
        self.as_slice() == *other
    }
}

impl<T, U, S, const N: usize> PartialEq<[U; N]> for Array<T, S>
where
    T: PartialEq<U>,
    S: Storage<T>,
{
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == other
    }
}

impl<T, S> PartialOrd for Array<T, S>
where
    T: PartialOrd,
    S: Storage<T>,
{
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

//
//  Conversions
//

impl<T, S> Extend<T> for Array<T, S>
where
    S: Storage<T>,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        let iter = iter.into_iter();

        let (lower, _) = iter.size_hint();

        if let Err(error) = self.grow(lower) {
            error.fail()
        }

        for value in iter {
            self.push(value);
        }
    }
}

impl<'a, T, S> Extend<&'a T> for Array<T, S>
where
    T: Copy + 'a,
    S: Storage<T>,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = &'a T>,
    {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, S, const N: usize> From<[T; N]> for Array<T, S>
where
    S: Default + Storage<T>,
{
    fn from(values: [T; N]) -> Self {
        let mut this = Self::with_capacity(N);

        this.extend(values);

        this
    }
}

impl<T, S> From<&[T]> for Array<T, S>
where
    T: Clone,
    S: Default + Storage<T>,
{
    fn from(values: &[T]) -> Self {
        let Ok(this) = Self::build(S::default(), values.len(), |i| Ok::<_, Infallible>(values[i].clone()));

        this
    }
}

impl<T, S> FromIterator<T> for Array<T, S>
where
    S: Default + Storage<T>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut this = Self::new();

        this.extend(iter);

        this
    }
}

impl<'a, T, S> IntoIterator for &'a Array<T, S>
where
    S: Storage<T>,
{
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, T, S> IntoIterator for &'a mut Array<T, S>
where
    S: Storage<T>,
{
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

impl<T, S> IntoIterator for Array<T, S>
where
    S: Storage<T>,
{
    type Item = T;
    type IntoIter = IntoIter<T, S>;

    fn into_iter(self) -> Self::IntoIter {
        let this = ManuallyDrop::new(self);

        //  Safety:
        //  -   `this` is never dropped, hence `storage` is only owned by the iterator.
        let storage = unsafe { ptr::read(&this.storage) };

        IntoIter {
            storage,
            front: 0,
            back: this.len,
            _marker: PhantomData,
        }
    }
}

//
//  Implementation
//

impl<T, S> Array<T, S>
where
    S: Storage<T>,
{
    //  Builds an array of `len` elements into `storage`, the element at index `i` being `fun(i)`.
    //
    //  On failure, the elements constructed so far are destructed in reverse order, and `storage` is released.
    fn build<E, F>(mut storage: S, len: usize, mut fun: F) -> Result<Self, E>
    where
        F: FnMut(usize) -> Result<T, E>,
    {
        if let Err(error) = storage.allocate(len) {
            error.fail()
        }

        let mut filler = Filler::new(storage);

        for index in 0..len {
            let value = fun(index)?;

            //  Safety:
            //  -   Bounds: `filler.len == index < len <= capacity`, as per Addressable.
            unsafe { filler.push(value) };
        }

        Ok(filler.finish())
    }

    //  Ensures there is room for `additional` more elements, doubling the capacity if it must grow.
    //
    //  On error, `self` is left unchanged.
    fn grow(&mut self, additional: usize) -> Result<(), StorageError> {
        let required = self.len.checked_add(additional).ok_or(StorageError::CapacityOverflow)?;

        if required <= self.capacity() {
            return Ok(());
        }

        let doubled = self.len.saturating_mul(2);
        let target = cmp::max(cmp::max(Self::MIN_CAPACITY, doubled), required);

        match self.relocate(target) {
            //  A storage with a hard limit may still fit the required capacity.
            Err(_) if target > required => self.relocate(required),
            result => result,
        }
    }

    //  Moves all elements into a fresh storage of at least `capacity` slots.
    //
    //  On error, `self` is left unchanged.
    fn relocate(&mut self, capacity: usize) -> Result<(), StorageError> {
        debug_assert!(capacity >= self.len);

        let fresh = self.fresh_storage(capacity)?;

        self.relocate_into(fresh);

        Ok(())
    }

    fn fresh_storage(&self, capacity: usize) -> Result<S, StorageError> {
        let mut fresh = self.storage.empty_like();

        fresh.allocate(capacity)?;

        Ok(fresh)
    }

    //  Moves all elements into `fresh`, then releases the current storage.
    fn relocate_into(&mut self, mut fresh: S) {
        debug_assert!(fresh.capacity() >= self.len);

        trace!(
            "relocating {} elements from {} to {} slots",
            self.len,
            self.storage.capacity(),
            fresh.capacity()
        );

        //  Safety:
        //  -   The first `self.len` slots of `self.storage` are live, as per Live Prefix Invariant.
        //  -   The first `self.len` slots of `fresh` are addressable, and vacant, as `fresh` was just allocated.
        //  -   Both storages are distinct, hence their slots do not overlap.
        unsafe { ptr::copy_nonoverlapping(self.storage.as_ptr(), fresh.as_mut_ptr(), self.len) };

        self.storage.swap(&mut fresh);

        //  The elements were moved out bitwise: `fresh` no longer holds any live element.
        fresh.deallocate();
    }

    //  #   Safety
    //
    //  -   Bounds: `self.len` must be strictly less than `self.capacity()`.
    #[inline]
    unsafe fn push_unchecked(&mut self, value: T) {
        //  Safety:
        //  -   Bounds: as per pre-condition.
        //  -   Vacancy: as per Live Prefix Invariant.
        unsafe { self.storage.construct(self.len, value) };

        self.len += 1;
    }

    #[inline]
    fn origin(&self) -> *const () {
        (self as *const Self).cast()
    }
}

//  Drop guard over a storage being filled, front to back.
//
//  Unless finished, the elements constructed so far are destructed in reverse order, and the storage released.
struct Filler<T, S>
where
    S: Storage<T>,
{
    storage: S,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T, S> Filler<T, S>
where
    S: Storage<T>,
{
    fn new(storage: S) -> Self {
        Self {
            storage,
            len: 0,
            _marker: PhantomData,
        }
    }

    //  #   Safety
    //
    //  -   Bounds: `self.len` must be strictly less than `self.storage.capacity()`.
    unsafe fn push(&mut self, value: T) {
        //  Safety:
        //  -   Bounds: as per pre-condition.
        //  -   Vacancy: only the first `self.len` slots were constructed.
        unsafe { self.storage.construct(self.len, value) };

        self.len += 1;
    }

    fn finish(self) -> Array<T, S> {
        let this = ManuallyDrop::new(self);

        //  Safety:
        //  -   `this` is never dropped, hence `storage` is only owned by the array.
        let storage = unsafe { ptr::read(&this.storage) };

        Array {
            storage,
            len: this.len,
            _marker: PhantomData,
        }
    }
}

impl<T, S> Drop for Filler<T, S>
where
    S: Storage<T>,
{
    fn drop(&mut self) {
        while self.len > 0 {
            self.len -= 1;

            //  Safety:
            //  -   Bounds, Liveness: the first `self.len` slots were constructed.
            unsafe { self.storage.destruct(self.len) };
        }

        self.storage.deallocate();
    }
}

/// A random-access position within an `Array`.
///
/// A cursor may point at any element, or one past the last. Cursors taken from different arrays cannot be related:
/// they compare unequal, are unordered, and their distance is an error.
///
/// ```
/// #   use storage_array::collections::Array;
/// let array: Array<u32> = Array::from([1, 2, 3]);
///
/// let mut cursor = array.begin();
/// cursor += 2;
///
/// assert_eq!(Some(&3), cursor.get());
/// assert_eq!(Ok(1), array.end() - cursor);
/// assert_eq!(None, array.end().get());
/// ```
pub struct Cursor<'a, T> {
    elements: &'a [T],
    origin: *const (),
    index: usize,
}

impl<'a, T> Cursor<'a, T> {
    const fn new(elements: &'a [T], origin: *const (), index: usize) -> Self {
        Self { elements, origin, index }
    }

    /// Returns the index of the position.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the element at this position, or `None` if one past the last.
    #[inline]
    pub fn get(&self) -> Option<&'a T> {
        self.elements.get(self.index)
    }

    /// Returns the number of steps from `self` to `other`.
    ///
    /// #   Errors
    ///
    /// Returns an error if `self` and `other` were not taken from the same array.
    #[inline]
    pub fn distance(&self, other: &Self) -> Result<isize, MismatchedCursorsError> {
        self.check(other)?;

        Ok(other.index.wrapping_sub(self.index) as isize)
    }

    /// Compares the positions of `self` and `other`.
    ///
    /// #   Errors
    ///
    /// Returns an error if `self` and `other` were not taken from the same array.
    #[inline]
    pub fn try_cmp(&self, other: &Self) -> Result<cmp::Ordering, MismatchedCursorsError> {
        self.check(other)?;

        Ok(self.index.cmp(&other.index))
    }

    fn check(&self, other: &Self) -> Result<(), MismatchedCursorsError> {
        if self.origin == other.origin {
            Ok(())
        } else {
            Err(MismatchedCursorsError)
        }
    }
}

impl<T> Add<usize> for Cursor<'_, T> {
    type Output = Self;

    #[inline]
    fn add(mut self, steps: usize) -> Self {
        self += steps;
        self
    }
}

impl<T> AddAssign<usize> for Cursor<'_, T> {
    #[inline]
    fn add_assign(&mut self, steps: usize) {
        let Some(index) = self.index.checked_add(steps) else {
            panic!("cursor overflow")
        };

        self.index = index;
    }
}

impl<T> Sub<usize> for Cursor<'_, T> {
    type Output = Self;

    #[inline]
    fn sub(mut self, steps: usize) -> Self {
        self -= steps;
        self
    }
}

impl<T> SubAssign<usize> for Cursor<'_, T> {
    #[inline]
    fn sub_assign(&mut self, steps: usize) {
        let Some(index) = self.index.checked_sub(steps) else {
            panic!("cursor moved before the first element")
        };

        self.index = index;
    }
}

impl<T> Sub for Cursor<'_, T> {
    type Output = Result<isize, MismatchedCursorsError>;

    #[inline]
    fn sub(self, other: Self) -> Self::Output {
        other.distance(&self)
    }
}

impl<T> Clone for Cursor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Cursor<'_, T> {}

impl<T> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("Cursor")
            .field("origin", &self.origin)
            .field("index", &self.index)
            .finish()
    }
}

impl<T> PartialEq for Cursor<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.try_cmp(other) == Ok(cmp::Ordering::Equal)
    }
}

impl<T> PartialOrd for Cursor<'_, T> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        self.try_cmp(other).ok()
    }
}

/// An owning iterator over the elements of an `Array`.
pub struct IntoIter<T, S>
where
    S: Storage<T>,
{
    //  Safety Invariants:
    //  -   Live Window: the slots `[front, back)` of `storage` hold live elements, and no other slot does.
    storage: S,
    front: usize,
    back: usize,
    _marker: PhantomData<T>,
}

impl<T, S> IntoIter<T, S>
where
    S: Storage<T>,
{
    /// Returns the remaining elements, as a slice.
    pub fn as_slice(&self) -> &[T] {
        //  Safety:
        //  -   The slots `[front, back)` are live, as per Live Window Invariant.
        unsafe { slice::from_raw_parts(self.storage.as_ptr().add(self.front), self.back - self.front) }
    }
}

impl<T, S> Iterator for IntoIter<T, S>
where
    S: Storage<T>,
{
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }

        self.front += 1;

        //  Safety:
        //  -   The slot at `front - 1` was live, and is no longer accounted for, hence is read exactly once.
        Some(unsafe { ptr::read(self.storage.as_ptr().add(self.front - 1)) })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;

        (len, Some(len))
    }
}

impl<T, S> DoubleEndedIterator for IntoIter<T, S>
where
    S: Storage<T>,
{
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }

        self.back -= 1;

        //  Safety:
        //  -   The slot at `back` was live, and is no longer accounted for, hence is read exactly once.
        Some(unsafe { ptr::read(self.storage.as_ptr().add(self.back)) })
    }
}

impl<T, S> ExactSizeIterator for IntoIter<T, S> where S: Storage<T> {}

impl<T, S> FusedIterator for IntoIter<T, S> where S: Storage<T> {}

impl<T, S> fmt::Debug for IntoIter<T, S>
where
    T: fmt::Debug,
    S: Storage<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

impl<T, S> Drop for IntoIter<T, S>
where
    S: Storage<T>,
{
    fn drop(&mut self) {
        let remaining: *mut [T] = {
            //  Safety:
            //  -   `front <= back <= capacity`, hence the pointer is within the block.
            let first = unsafe { self.storage.as_mut_ptr().add(self.front) };

            ptr::slice_from_raw_parts_mut(first, self.back - self.front)
        };

        //  Safety:
        //  -   The slots `[front, back)` are live, as per Live Window Invariant, and never accessed again.
        unsafe { ptr::drop_in_place(remaining) };

        self.storage.deallocate();
    }
}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use proptest::prelude::*;

    use crate::{storage::InlineStorage, testing::Tracked};

    use super::*;

    type Inline<T, const N: usize> = Array<T, InlineStorage<T, N>>;

    #[test]
    fn default() {
        let array = Array::<u32>::default();

        assert_eq!(0, array.len());
        assert_eq!(0, array.capacity());
        assert!(array.is_empty());
        assert_eq!(None, array.front());
        assert_eq!(None, array.back());
    }

    #[test]
    fn with_len() {
        let array = Array::<i32>::with_len(10);

        assert_eq!(10, array.len());
        assert_eq!(10, array.capacity());
        assert!(array.iter().all(|x| *x == 0));
    }

    #[test]
    fn from_literal() {
        let array = Array::<i32>::from([1, 2, 3, 4]);

        assert_elements(&array, &[1, 2, 3, 4]);
    }

    #[test]
    fn from_elem() {
        let array = Array::<i32>::from_elem(7, 5);

        assert_elements(&array, &[7, 7, 7, 7, 7]);
    }

    #[test]
    fn concrete_scenario() {
        let mut array = Array::<i32>::with_len(10);

        array[0] = 1;
        array.push(100);

        assert_eq!(11, array.len());
        assert_eq!(1, array[0]);
        assert_eq!(100, array[10]);
    }

    #[test]
    fn clone_independence() {
        let mut original = Array::<String>::from(["a".to_string(), "b".to_string()]);

        let mut copy = original.clone();

        assert_eq!(original, copy);

        copy[0].push('!');
        original.push("c".to_string());

        assert_elements(&original, &["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_elements(&copy, &["a!".to_string(), "b".to_string()]);

        drop(copy);

        assert_eq!(3, original.len());
    }

    #[test]
    fn move_leaves_empty() {
        let mut original = Array::<i32>::from([1, 2, 3]);

        let moved = mem::take(&mut original);

        assert_elements(&moved, &[1, 2, 3]);
        assert!(original.is_empty());
        assert_eq!(0, original.capacity());
    }

    #[test]
    fn sort() {
        let mut array = Array::<i32>::from([3, 1, 2, 5, 4]);

        array.as_mut_slice().sort();

        assert_elements(&array, &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn range_for() {
        let array = Array::<i32>::from([1, 2, 3]);

        let mut sum = 0;

        for x in &array {
            sum += *x;
        }

        assert_eq!(6, sum);
    }

    #[test]
    fn find() {
        let array = Array::<i32>::from([5, 6, 7]);

        assert_eq!(Some(1), array.iter().position(|x| *x == 6));
        assert_eq!(None, array.iter().position(|x| *x == 8));
    }

    #[test]
    fn push_many() {
        const N: usize = 5_000;

        let mut array = Array::<usize>::new();

        for i in 0..N {
            array.push(i);
        }

        assert_eq!(N, array.len());

        for i in 0..N {
            assert_eq!(i, array[i]);
        }
    }

    #[test]
    fn push_self_within() {
        const N: usize = 500;

        let mut array = Array::<String>::new();
        array.push("x".to_string());

        for _ in 0..N {
            array.extend_from_within(0..1);
        }

        assert_eq!(N + 1, array.len());
        assert!(array.iter().all(|s| s == "x"));
    }

    #[test]
    fn push_self_clone() {
        const N: usize = 500;

        let mut array = Array::<String>::new();
        array.push("x".to_string());

        for _ in 0..N {
            array.push(array[0].clone());
        }

        assert_eq!(N + 1, array.len());
        assert!(array.iter().all(|s| s == "x"));
    }

    #[test]
    fn push_with() {
        let mut array = Array::<String>::new();

        array.push_with(|| "a".to_string()).push('b');

        assert_elements(&array, &["ab".to_string()]);
    }

    #[test]
    fn extend_from_within_range() {
        let mut array = Array::<i32>::from([1, 2, 3]);

        array.extend_from_within(1..);
        array.extend_from_within(..=0);

        assert_elements(&array, &[1, 2, 3, 2, 3, 1]);
    }

    #[test]
    #[should_panic]
    fn extend_from_within_out_of_range() {
        let mut array = Array::<i32>::from([1, 2, 3]);

        array.extend_from_within(2..4);
    }

    #[test]
    fn data() {
        let array = Array::<i32>::from([4, 5]);

        assert_eq!(array.as_slice().as_ptr(), array.as_ptr());

        //  Safety:
        //  -   Both elements are live.
        unsafe {
            assert_eq!(4, *array.as_ptr());
            assert_eq!(5, *array.as_ptr().add(1));
        }
    }

    #[test]
    fn front_back() {
        let mut array = Array::<i32>::from([1, 2, 3]);

        assert_eq!(Some(&1), array.front());
        assert_eq!(Some(&3), array.back());

        *array.front_mut().expect("non-empty") = 10;
        *array.back_mut().expect("non-empty") = 30;

        assert_elements(&array, &[10, 2, 30]);
    }

    #[test]
    fn at() {
        let mut array = Array::<i32>::from([1, 2, 3]);

        assert_eq!(Ok(&2), array.at(1));
        assert_eq!(Err(OutOfRangeError { index: 3, len: 3 }), array.at(3));

        *array.at_mut(2).expect("in range") = 4;

        assert_eq!(Err(OutOfRangeError { index: 7, len: 3 }), array.at_mut(7).map(|x| *x));
        assert_elements(&array, &[1, 2, 4]);
    }

    #[test]
    #[should_panic]
    fn index_out_of_range() {
        let array = Array::<i32>::from([1, 2, 3]);

        let _ = array[3];
    }

    #[test]
    fn capacity() {
        let mut array = Array::<i32>::new();

        array.reserve(10);

        assert_eq!(10, array.capacity());

        array.extend([1, 2, 3, 4, 5, 6, 7, 8, 9]);

        array.shrink_to_fit();

        assert_eq!(9, array.capacity());
        assert_elements(&array, &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn superfluous_reserve() {
        let mut array = Array::<i32>::with_capacity(10);

        let ptr = array.as_ptr();

        array.reserve(5);

        assert_eq!(10, array.capacity());
        assert_eq!(ptr, array.as_ptr());
    }

    #[test]
    fn superfluous_shrink_to_fit() {
        let mut array = Array::<i32>::from([1, 2, 3]);

        let ptr = array.as_ptr();

        array.shrink_to_fit();

        assert_eq!(3, array.capacity());
        assert_eq!(ptr, array.as_ptr());
    }

    #[test]
    fn clear() {
        let mut array = Array::<Tracked>::from_fn(5, |i| Tracked::new(i as u32));

        let capacity = array.capacity();

        array.clear();

        assert!(array.is_empty());
        assert_eq!(capacity, array.capacity());

        Tracked::expect_no_instances();
    }

    #[test]
    fn pop() {
        let mut array = Array::<i32>::from([1, 2]);

        assert_eq!(Some(2), array.pop());
        assert_eq!(Some(1), array.pop());
        assert_eq!(None, array.pop());
        assert!(array.is_empty());
    }

    #[test]
    fn self_assign() {
        let mut array = Array::<i32>::from([1, 2, 3]);

        let copy = array.clone();

        array.clone_from(&copy);

        assert_eq!(copy, array);
    }

    #[test]
    fn resize() {
        let mut array = Array::<i32>::from([1, 2]);

        array.resize(4, 9);

        assert_elements(&array, &[1, 2, 9, 9]);

        array.resize(1, 0);

        assert_elements(&array, &[1]);

        let mut next = 0;

        array.resize_with(3, || {
            next += 1;
            next
        });

        assert_elements(&array, &[1, 1, 2]);
    }

    #[test]
    fn truncate_drops() {
        let mut array = Array::<Tracked>::from_fn(4, |i| Tracked::new(i as u32));

        array.truncate(2);

        assert_eq!(2, Tracked::live());

        array.truncate(3);

        assert_eq!(2, array.len());

        drop(array);

        Tracked::expect_no_instances();
    }

    #[test]
    fn swap_with() {
        let mut left = Array::<i32>::from([1, 2, 3]);
        let mut right = Array::<i32>::from([4]);

        left.swap_with(&mut right);

        assert_elements(&left, &[4]);
        assert_elements(&right, &[1, 2, 3]);
    }

    #[test]
    fn into_iter() {
        let array = Array::<Tracked>::from_fn(5, |i| Tracked::new(i as u32));

        let mut iter = array.into_iter();

        assert_eq!(5, iter.len());
        assert_eq!(Some(0), iter.next().map(|t| *t.value()));
        assert_eq!(Some(4), iter.next_back().map(|t| *t.value()));
        assert_eq!(3, iter.as_slice().len());

        drop(iter);

        Tracked::expect_no_instances();
    }

    #[test]
    fn collect() {
        let array: Array<i32> = (1..=4).collect();

        assert_elements(&array, &[1, 2, 3, 4]);

        let back: Vec<i32> = array.into_iter().rev().collect();

        assert_eq!(vec![4, 3, 2, 1], back);
    }

    #[test]
    fn compare() {
        let a = Array::<i32>::from([1, 2, 3]);
        let b = Array::<i32>::from([1, 2, 4]);

        assert!(a < b);
        assert_eq!(cmp::Ordering::Greater, b.cmp(&a));
        assert_eq!(a, [1, 2, 3]);
        assert_eq!(a, &[1, 2, 3][..]);
        assert_eq!("[1, 2, 3]", format!("{a:?}"));
    }

    #[test]
    fn cursors() {
        let array = Array::<i32>::from([1, 2, 3, 4]);

        let begin = array.begin();
        let end = array.end();

        assert_eq!(Ok(4), end - begin);
        assert_eq!(Ok(-4), begin - end);
        assert_eq!(Ok(4), begin.distance(&end));
        assert!(begin < end);

        let mut cursor = begin + 3;

        assert_eq!(Some(&4), cursor.get());

        cursor -= 1;

        assert_eq!(Some(&3), cursor.get());
        assert_eq!(2, cursor.index());
        assert_eq!(end - 2, cursor);

        let walked: Vec<i32> = {
            let mut cursor = array.begin();
            let mut walked = Vec::new();

            while cursor != array.end() {
                walked.extend(cursor.get());
                cursor += 1;
            }

            walked
        };

        assert_eq!(vec![1, 2, 3, 4], walked);
    }

    #[test]
    fn cursors_mismatched() {
        let a = Array::<i32>::from([1, 2, 3]);
        let b = Array::<i32>::from([1, 2, 3]);

        assert_eq!(Err(MismatchedCursorsError), a.end() - b.begin());
        assert_eq!(Err(MismatchedCursorsError), a.begin().try_cmp(&b.begin()));
        assert_ne!(a.begin(), b.begin());
        assert_eq!(None, a.begin().partial_cmp(&b.begin()));
    }

    #[test]
    fn inline_push() {
        let mut array = Inline::<i32, 3>::new();

        assert_eq!(3, array.capacity());

        array.extend([1, 2, 3]);

        let error = array.try_push(4).expect_err("full");

        assert_eq!(StorageError::CapacityExceeded { requested: 4, capacity: 3 }, error.error());
        assert_eq!(4, error.into_inner());
        assert_elements(&array, &[1, 2, 3]);
    }

    #[test]
    #[should_panic]
    fn inline_push_overflow() {
        let mut array = Inline::<i32, 1>::new();

        array.push(1);
        array.push(2);
    }

    #[test]
    fn inline_clone_and_shrink() {
        let mut array = Inline::<String, 4>::from(["a".to_string(), "b".to_string()]);

        array.shrink_to_fit();

        assert_eq!(4, array.capacity());

        let copy = array.clone();

        array.clear();

        assert_elements(&copy, &["a".to_string(), "b".to_string()]);

        let heap: Array<String> = copy.iter().cloned().collect();

        assert_eq!(heap, copy);
    }

    #[test]
    fn zero_sized() {
        let mut array = Array::<()>::new();

        for _ in 0..1_000 {
            array.push(());
        }

        assert_eq!(1_000, array.len());
        assert_eq!(usize::MAX, array.capacity());
        assert_eq!(Some(()), array.pop());
    }

    #[test]
    fn clone_unwinds() {
        let source = Array::<Tracked>::from_fn(10, |i| Tracked::new(i as u32));

        Tracked::panic_on_clone(5);

        let result = catch_unwind(AssertUnwindSafe(|| source.clone()));

        assert!(result.is_err());

        //  Only the source remains.
        assert_eq!(10, Tracked::live());
        assert_eq!(10, source.len());

        drop(source);

        Tracked::expect_no_instances();
    }

    #[test]
    fn clone_from_unwinds() {
        let source = Array::<Tracked>::from_fn(4, |i| Tracked::new(i as u32));
        let mut target = Array::<Tracked>::from_fn(2, |i| Tracked::new(10 + i as u32));

        Tracked::panic_on_clone(3);

        let result = catch_unwind(AssertUnwindSafe(|| target.clone_from(&source)));

        assert!(result.is_err());
        assert_eq!(6, Tracked::live());
        assert_eq!(vec![10, 11], target.iter().map(|t| *t.value()).collect::<Vec<_>>());

        target.clone_from(&source);

        assert_eq!(8, Tracked::live());
        assert_eq!(source, target);

        drop((source, target));

        Tracked::expect_no_instances();
    }

    #[test]
    fn try_from_fn_unwinds() {
        let result = Array::<Tracked>::try_from_fn(10, |i| if i < 7 { Ok(Tracked::new(i as u32)) } else { Err(i) });

        assert_eq!(Some(7), result.err());

        Tracked::expect_no_instances();
    }

    #[test]
    fn extend_from_within_unwinds() {
        let mut array = Array::<Tracked>::from_fn(4, |i| Tracked::new(i as u32));

        Tracked::panic_on_clone(3);

        let result = catch_unwind(AssertUnwindSafe(|| array.extend_from_within(..)));

        assert!(result.is_err());

        //  The clones appended so far remain.
        assert_eq!(6, array.len());
        assert_eq!(6, Tracked::live());

        drop(array);

        Tracked::expect_no_instances();
    }

    #[track_caller]
    fn assert_elements<T, S>(array: &Array<T, S>, expected: &[T])
    where
        T: fmt::Debug + PartialEq,
        S: Storage<T>,
    {
        assert_eq!(expected.len(), array.len(), "len");
        assert!(array.len() <= array.capacity(), "capacity");

        for (index, element) in expected.iter().enumerate() {
            assert_eq!(Ok(element), array.at(index), "at({index})");
        }
    }

    proptest! {
        #[test]
        fn push_preserves_order(values in proptest::collection::vec(any::<u32>(), 0..300)) {
            let mut array = Array::<u32>::new();

            for value in &values {
                array.push(*value);

                prop_assert!(array.len() <= array.capacity());
            }

            prop_assert_eq!(values.as_slice(), array.as_slice());
        }

        #[test]
        fn reserve_never_shrinks(first in 0usize..512, second in 0usize..512) {
            let mut array = Array::<u64>::new();

            array.reserve(first);

            prop_assert!(array.capacity() >= first);

            array.reserve(second);

            prop_assert!(array.capacity() >= first.max(second));
        }

        #[test]
        fn pop_mirrors_push(values in proptest::collection::vec(any::<i64>(), 0..100), pops in 0usize..120) {
            let mut array: Array<i64> = values.iter().copied().collect();
            let mut expected = values.clone();

            for _ in 0..pops {
                prop_assert_eq!(expected.pop(), array.pop());
            }

            prop_assert_eq!(expected.as_slice(), array.as_slice());
        }
    }
} // mod tests
