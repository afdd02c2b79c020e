//! A packed sequence of booleans, generic over its byte storage.
//!
//! Bit `i` lives in byte `i >> 3`, at position `i & 7`, see `BitChunk::split`.

use core::{
    cmp, fmt,
    hash::{Hash, Hasher},
    iter::FusedIterator,
    mem,
    ops::{Add, AddAssign, Index, Sub, SubAssign},
    ptr, slice,
};

#[cfg(feature = "alloc")]
use crate::storage::HeapStorage;

use crate::{
    storage::Storage,
    utils::{BitChunk, IndexInChunk, IndexOfChunk, MismatchedCursorsError, OutOfRangeError, StorageError},
};

/// A packed sequence of booleans, 8 to a byte, generic over its byte storage.
///
/// ```
/// #   use storage_array::collections::BitArray;
/// let mut bits: BitArray = BitArray::from([true, false, true]);
///
/// bits.push(true);
/// bits.at_mut(1).expect("in range").set(true);
///
/// assert_eq!(4, bits.count_ones());
/// assert!(bits[3]);
/// ```
#[cfg(feature = "alloc")]
pub struct BitArray<S = HeapStorage<u8>>
where
    S: Storage<u8>,
{
    //  Safety Invariants:
    //  -   Initialized: all `storage.capacity()` bytes are constructed.
    //  -   Clean Tail: all bits at, or past, `len` are zero.
    //  -   Bounded: `len <= self.capacity()`.
    storage: S,
    len: usize,
}

/// A packed sequence of booleans, 8 to a byte, generic over its byte storage.
#[cfg(not(feature = "alloc"))]
pub struct BitArray<S>
where
    S: Storage<u8>,
{
    //  Safety Invariants:
    //  -   Initialized: all `storage.capacity()` bytes are constructed.
    //  -   Clean Tail: all bits at, or past, `len` are zero.
    //  -   Bounded: `len <= self.capacity()`.
    storage: S,
    len: usize,
}

//
//  Creation
//

impl<S> BitArray<S>
where
    S: Storage<u8>,
{
    /// Returns a new, empty, instance.
    #[inline]
    pub fn new() -> Self
    where
        S: Default,
    {
        Self::new_in(S::default())
    }

    /// Returns a new, empty, instance over `storage`.
    ///
    /// Any capacity already held by `storage` is used, after being zeroed.
    pub fn new_in(mut storage: S) -> Self {
        Self::zero(&mut storage);

        Self { storage, len: 0 }
    }

    /// Returns a new, empty, instance with a capacity of at least `capacity` bits.
    ///
    /// #   Panics
    ///
    /// If the storage cannot provide enough bytes.
    pub fn with_capacity(capacity: usize) -> Self
    where
        S: Default,
    {
        let mut this = Self::new();

        this.reserve(capacity);

        this
    }

    /// Returns a new instance of `len` unset bits.
    ///
    /// #   Panics
    ///
    /// If the storage cannot provide enough bytes.
    pub fn with_len(len: usize) -> Self
    where
        S: Default,
    {
        Self::from_elem(false, len)
    }

    /// Returns a new instance of `len` bits, all set to `value`.
    ///
    /// #   Panics
    ///
    /// If the storage cannot provide enough bytes.
    pub fn from_elem(value: bool, len: usize) -> Self
    where
        S: Default,
    {
        let mut this = Self::with_capacity(len);

        this.resize(len, value);

        this
    }
}

//
//  Size & Capacity
//

impl<S> BitArray<S>
where
    S: Storage<u8>,
{
    const MIN_CAPACITY: usize = 64;

    /// Returns the number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether there are no bits.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of bits the array can hold without relocating.
    ///
    /// Always a multiple of 8, unless saturated.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity().saturating_mul(BitChunk::BITS)
    }

    /// Returns a reference to the underlying storage.
    #[inline]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns the bytes holding the bits.
    ///
    /// Bits past the length, in the last byte, are unset.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        //  Safety:
        //  -   The pointer is non-null and properly aligned, as per the Storage guarantees.
        //  -   `chunks_for(len) <= storage.capacity()`, as per Bounded Invariant, and those are initialized, as per
        //      Initialized Invariant.
        unsafe { slice::from_raw_parts(self.storage.as_ptr(), BitChunk::chunks_for(self.len)) }
    }

    /// Ensures that the capacity is at least `capacity` bits.
    ///
    /// Never shrinks.
    ///
    /// #   Panics
    ///
    /// If the storage cannot provide enough bytes.
    pub fn reserve(&mut self, capacity: usize) {
        if let Err(error) = self.try_reserve(capacity) {
            error.fail()
        }
    }

    /// Ensures that the capacity is at least `capacity` bits.
    ///
    /// Never shrinks. On error, `self` is left unchanged.
    pub fn try_reserve(&mut self, capacity: usize) -> Result<(), StorageError> {
        if capacity <= self.capacity() {
            return Ok(());
        }

        self.relocate(capacity)
    }

    /// Reduces the capacity to the fewest bytes holding all bits, if the storage allows it.
    ///
    /// #   Panics
    ///
    /// If the storage cannot provide enough bytes.
    pub fn shrink_to_fit(&mut self) {
        if let Err(error) = self.try_shrink_to_fit() {
            error.fail()
        }
    }

    /// Reduces the capacity to the fewest bytes holding all bits, if the storage allows it.
    ///
    /// On error, `self` is left unchanged.
    pub fn try_shrink_to_fit(&mut self) -> Result<(), StorageError> {
        if self.storage.capacity() == BitChunk::chunks_for(self.len) {
            return Ok(());
        }

        let fresh = self.fresh_storage(self.len)?;

        //  Fixed capacity storages cannot shrink.
        if fresh.capacity() >= self.storage.capacity() {
            return Ok(());
        }

        self.relocate_into(fresh);

        Ok(())
    }
}

//
//  Access
//

impl<S> BitArray<S>
where
    S: Storage<u8>,
{
    /// Returns the bit at `index`.
    ///
    /// #   Errors
    ///
    /// Returns an error if `index` is out of range.
    #[inline]
    pub fn at(&self, index: usize) -> Result<bool, OutOfRangeError> {
        self.check(index)?;

        Ok(self.bit(index))
    }

    /// Returns the bit at `index`, if in range.
    #[inline]
    pub fn get(&self, index: usize) -> Option<bool> {
        self.at(index).ok()
    }

    /// Returns a proxy to the bit at `index`.
    ///
    /// #   Errors
    ///
    /// Returns an error if `index` is out of range.
    #[inline]
    pub fn at_mut(&mut self, index: usize) -> Result<BitRef<'_>, OutOfRangeError> {
        self.check(index)?;

        let (of_chunk, in_chunk) = BitChunk::split(index);

        Ok(BitRef::new(&mut self.chunks_mut()[of_chunk.0], in_chunk))
    }

    /// Returns a proxy to the bit at `index`, if in range.
    #[inline]
    pub fn bit_mut(&mut self, index: usize) -> Option<BitRef<'_>> {
        self.at_mut(index).ok()
    }

    /// Sets the bit at `index` to `value`, returning its previous value.
    ///
    /// #   Errors
    ///
    /// Returns an error if `index` is out of range.
    #[inline]
    pub fn set(&mut self, index: usize, value: bool) -> Result<bool, OutOfRangeError> {
        self.at_mut(index).map(|mut bit| bit.replace(value))
    }

    /// Returns the first bit, if any.
    #[inline]
    pub fn front(&self) -> Option<bool> {
        self.get(0)
    }

    /// Returns the last bit, if any.
    #[inline]
    pub fn back(&self) -> Option<bool> {
        self.len.checked_sub(1).map(|index| self.bit(index))
    }

    /// Returns the number of set bits.
    pub fn count_ones(&self) -> usize {
        //  Bits past `len` are unset, as per Clean Tail Invariant.
        self.as_bytes().iter().map(|byte| BitChunk(*byte).count()).sum()
    }

    /// Returns an iterator over the bits.
    #[inline]
    pub fn iter(&self) -> BitIter<'_> {
        BitIter {
            front: self.begin(),
            back: self.end(),
        }
    }

    /// Returns a cursor to the first bit.
    #[inline]
    pub fn begin(&self) -> BitCursor<'_> {
        BitCursor::new(self.as_bytes(), self.origin(), self.len, 0)
    }

    /// Returns a cursor one past the last bit.
    #[inline]
    pub fn end(&self) -> BitCursor<'_> {
        BitCursor::new(self.as_bytes(), self.origin(), self.len, self.len)
    }
}

//
//  Modification
//

impl<S> BitArray<S>
where
    S: Storage<u8>,
{
    /// Appends `value`.
    ///
    /// If the array is full, its capacity is first doubled, amortizing the cost of relocation.
    ///
    /// #   Panics
    ///
    /// If the storage cannot provide the additional byte.
    #[inline]
    pub fn push(&mut self, value: bool) {
        if let Err(error) = self.try_push(value) {
            error.fail()
        }
    }

    /// Appends `value`.
    ///
    /// #   Errors
    ///
    /// Returns an error if the storage cannot provide the additional byte. On error, `self` is left unchanged.
    pub fn try_push(&mut self, value: bool) -> Result<(), StorageError> {
        self.grow(1)?;

        let index = self.len;

        self.len += 1;

        if value {
            self.assign(index, true);
        }

        Ok(())
    }

    /// Removes the last bit, and returns it, if any.
    #[inline]
    pub fn pop(&mut self) -> Option<bool> {
        let index = self.len.checked_sub(1)?;

        //  Clean Tail Invariant: the popped bit is reset.
        let value = self.assign(index, false);

        self.len = index;

        Some(value)
    }

    /// Drops the bits at, and after, `len`, if any.
    ///
    /// The capacity is unchanged.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }

        let (of_chunk, in_chunk) = BitChunk::split(len);

        let chunks = self.chunks_mut();

        let first_cleared = if in_chunk.0 == 0 {
            of_chunk.0
        } else {
            //  Keep the low `in_chunk` bits of the partial chunk.
            chunks[of_chunk.0] &= (1u8 << in_chunk.0) - 1;

            of_chunk.0 + 1
        };

        chunks[first_cleared..].fill(BitChunk::ALL_ZEROS.0);

        self.len = len;
    }

    /// Drops all bits.
    ///
    /// The capacity is unchanged.
    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Resizes the array to `len` bits, appending `value` or dropping trailing bits as necessary.
    ///
    /// #   Panics
    ///
    /// If the storage cannot provide enough bytes.
    pub fn resize(&mut self, len: usize, value: bool) {
        if len <= self.len {
            self.truncate(len);
            return;
        }

        if let Err(error) = self.grow(len - self.len) {
            error.fail()
        }

        let start = self.len;

        self.len = len;

        //  Appended bits are already unset, as per Clean Tail Invariant.
        if value {
            for index in start..len {
                self.assign(index, true);
            }
        }
    }

    /// Exchanges the content of `self` and `other`.
    #[inline]
    pub fn swap_with(&mut self, other: &mut Self) {
        self.storage.swap(&mut other.storage);

        mem::swap(&mut self.len, &mut other.len);
    }
}

//
//  Common traits
//

impl<S> Clone for BitArray<S>
where
    S: Storage<u8>,
{
    fn clone(&self) -> Self {
        let mut fresh = match self.fresh_storage(self.len) {
            Ok(fresh) => fresh,
            Err(error) => error.fail(),
        };

        let bytes = self.as_bytes();

        //  Safety:
        //  -   `fresh` holds at least `bytes.len()` bytes, as it was allocated for `self.len` bits.
        //  -   Both storages are distinct, hence do not overlap.
        unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), fresh.as_mut_ptr(), bytes.len()) };

        Self {
            storage: fresh,
            len: self.len,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        let mut copy = source.clone();

        self.swap_with(&mut copy);
    }
}

impl<S> fmt::Debug for BitArray<S>
where
    S: Storage<u8>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<S> Default for BitArray<S>
where
    S: Default + Storage<u8>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Eq for BitArray<S> where S: Storage<u8> {}

impl<S> Hash for BitArray<S>
where
    S: Storage<u8>,
{
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.len.hash(state);
        self.as_bytes().hash(state);
    }
}

impl<S> Index<usize> for BitArray<S>
where
    S: Storage<u8>,
{
    type Output = bool;

    #[inline]
    fn index(&self, index: usize) -> &bool {
        match self.at(index) {
            Ok(true) => &true,
            Ok(false) => &false,
            Err(error) => panic!("{error}"),
        }
    }
}

impl<S, SO> PartialEq<BitArray<SO>> for BitArray<S>
where
    S: Storage<u8>,
    SO: Storage<u8>,
{
    fn eq(&self, other: &BitArray<SO>) -> bool {
        //  Bits past `len` are unset on both sides, as per Clean Tail Invariant.
        self.len == other.len && self.as_bytes() == other.as_bytes()
    }
}

impl<S> PartialEq<[bool]> for BitArray<S>
where
    S: Storage<u8>,
{
    fn eq(&self, other: &[bool]) -> bool {
        self.len == other.len() && self.iter().eq(other.iter().copied())
    }
}

impl<S, const N: usize> PartialEq<[bool; N]> for BitArray<S>
where
    S: Storage<u8>,
{
    fn eq(&self, other: &[bool; N]) -> bool {
        <Self as PartialEq<[bool]>>::eq(self, other)
    }
}

//
//  Conversions
//

impl<S> Extend<bool> for BitArray<S>
where
    S: Storage<u8>,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = bool>,
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

impl<S, const N: usize> From<[bool; N]> for BitArray<S>
where
    S: Default + Storage<u8>,
{
    fn from(values: [bool; N]) -> Self {
        Self::from(values.as_slice())
    }
}

impl<S> From<&[bool]> for BitArray<S>
where
    S: Default + Storage<u8>,
{
    fn from(values: &[bool]) -> Self {
        let mut this = Self::with_capacity(values.len());

        this.extend(values.iter().copied());

        this
    }
}

impl<S> FromIterator<bool> for BitArray<S>
where
    S: Default + Storage<u8>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut this = Self::new();

        this.extend(iter);

        this
    }
}

impl<'a, S> IntoIterator for &'a BitArray<S>
where
    S: Storage<u8>,
{
    type Item = bool;
    type IntoIter = BitIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

//
//  Implementation
//

impl<S> BitArray<S>
where
    S: Storage<u8>,
{
    #[inline]
    fn check(&self, index: usize) -> Result<(), OutOfRangeError> {
        if index < self.len {
            Ok(())
        } else {
            Err(OutOfRangeError { index, len: self.len })
        }
    }

    //  Returns the bit at `index`, which must be strictly less than `self.len`.
    #[inline]
    fn bit(&self, index: usize) -> bool {
        debug_assert!(index < self.len, "{} >= {}", index, self.len);

        let (of_chunk, in_chunk) = BitChunk::split(index);

        BitChunk(self.as_bytes()[of_chunk.0]).is_set(in_chunk)
    }

    //  Assigns the bit at `index`, which must be strictly less than `self.len`, returning its previous value.
    #[inline]
    fn assign(&mut self, index: usize, value: bool) -> bool {
        debug_assert!(index < self.len, "{} >= {}", index, self.len);

        let (of_chunk, in_chunk) = BitChunk::split(index);

        BitRef::new(&mut self.chunks_mut()[of_chunk.0], in_chunk).replace(value)
    }

    //  Returns the bytes holding the `len` bits.
    #[inline]
    fn chunks_mut(&mut self) -> &mut [u8] {
        let chunks = BitChunk::chunks_for(self.len);

        //  Safety:
        //  -   The pointer is non-null and properly aligned, as per the Storage guarantees.
        //  -   `chunks <= storage.capacity()`, as per Bounded Invariant, and those are initialized, as per Initialized
        //      Invariant.
        unsafe { slice::from_raw_parts_mut(self.storage.as_mut_ptr(), chunks) }
    }

    //  Ensures there is room for `additional` more bits, doubling the capacity if it must grow.
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

    //  Copies all bits into a fresh storage of at least `capacity` bits.
    //
    //  On error, `self` is left unchanged.
    fn relocate(&mut self, capacity: usize) -> Result<(), StorageError> {
        debug_assert!(capacity >= self.len);

        let fresh = self.fresh_storage(capacity)?;

        self.relocate_into(fresh);

        Ok(())
    }

    //  Returns a fresh, zeroed, storage of at least `capacity` bits.
    fn fresh_storage(&self, capacity: usize) -> Result<S, StorageError> {
        let mut fresh = self.storage.empty_like();

        fresh.allocate(BitChunk::chunks_for(capacity))?;

        Self::zero(&mut fresh);

        Ok(fresh)
    }

    //  Copies all bits into `fresh`, then releases the current storage.
    //
    //  Complete chunks are copied whole, the bits of the last partial chunk one at a time.
    fn relocate_into(&mut self, mut fresh: S) {
        debug_assert!(fresh.capacity() >= BitChunk::chunks_for(self.len));

        trace!(
            "relocating {} bits from {} to {} bytes",
            self.len,
            self.storage.capacity(),
            fresh.capacity()
        );

        let (IndexOfChunk(complete), IndexInChunk(partial)) = BitChunk::split(self.len);

        //  Safety:
        //  -   The first `complete` bytes of `self.storage` are initialized, as per Initialized Invariant.
        //  -   `fresh` holds at least `chunks_for(len) >= complete` bytes.
        //  -   Both storages are distinct, hence do not overlap.
        unsafe { ptr::copy_nonoverlapping(self.storage.as_ptr(), fresh.as_mut_ptr(), complete) };

        if partial != 0 {
            let source = BitChunk(self.as_bytes()[complete]);
            let mut target = BitChunk::ALL_ZEROS;

            for bit in 0..partial {
                let bit = IndexInChunk(bit);

                target.assign(bit, source.is_set(bit));
            }

            //  Safety:
            //  -   `fresh` holds at least `chunks_for(len) == complete + 1` bytes.
            unsafe { fresh.as_mut_ptr().add(complete).write(target.0) };
        }

        self.storage.swap(&mut fresh);

        fresh.deallocate();
    }

    //  Zeroes all bytes of `storage`, establishing the Initialized and Clean Tail Invariants.
    fn zero(storage: &mut S) {
        let capacity = storage.capacity();

        //  Safety:
        //  -   `capacity` bytes are addressable, as per Addressable.
        unsafe { ptr::write_bytes(storage.as_mut_ptr(), 0, capacity) };
    }

    #[inline]
    fn origin(&self) -> *const () {
        (self as *const Self).cast()
    }
}

/// A proxy to a single bit of a `BitArray`.
///
/// Stands in for `&mut bool`, since a bit is not addressable on its own.
///
/// ```
/// #   use storage_array::collections::BitArray;
/// let mut bits: BitArray = BitArray::with_len(10);
///
/// let mut bit = bits.at_mut(9).expect("in range");
///
/// assert!(!bit.get());
/// assert!(bit.toggle());
/// assert!(bit.replace(false));
///
/// assert_eq!(0, bits.count_ones());
/// ```
pub struct BitRef<'a> {
    chunk: &'a mut u8,
    bit: IndexInChunk,
}

impl<'a> BitRef<'a> {
    /// Creates a proxy to the bit `bit` of `chunk`.
    ///
    /// #   Panics
    ///
    /// See `IndexInChunk`.
    #[inline]
    pub fn new(chunk: &'a mut u8, bit: IndexInChunk) -> Self {
        debug_assert!(bit.0 < BitChunk::BITS as u32);

        Self { chunk, bit }
    }

    /// Returns the value of the bit.
    #[inline]
    pub fn get(&self) -> bool {
        BitChunk(*self.chunk).is_set(self.bit)
    }

    /// Sets the bit to `value`, with an OR or an AND-NOT.
    #[inline]
    pub fn set(&mut self, value: bool) {
        self.replace(value);
    }

    /// Sets the bit to `value`, returning its previous value.
    #[inline]
    pub fn replace(&mut self, value: bool) -> bool {
        let mut chunk = BitChunk(*self.chunk);

        let previous = chunk.assign(self.bit, value);

        *self.chunk = chunk.0;

        previous
    }

    /// Flips the bit, returning its new value.
    #[inline]
    pub fn toggle(&mut self) -> bool {
        let value = !self.get();

        self.set(value);

        value
    }

    //  Position of the bit in memory, by address of its chunk, then index within.
    fn position(&self) -> (*const u8, u32) {
        (ptr::from_ref::<u8>(self.chunk), self.bit.0)
    }
}

impl From<BitRef<'_>> for bool {
    #[inline]
    fn from(bit: BitRef<'_>) -> bool {
        bit.get()
    }
}

impl fmt::Debug for BitRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_tuple("BitRef").field(&self.get()).finish()
    }
}

impl Eq for BitRef<'_> {}

impl Ord for BitRef<'_> {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.position().cmp(&other.position())
    }
}

impl PartialEq for BitRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.position() == other.position()
    }
}

impl PartialOrd for BitRef<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A random-access position within a `BitArray`.
///
/// The position is held as a chunk, and an offset within this chunk: stepping past offset 7 moves on to offset 0 of
/// the next chunk, and conversely.
///
/// ```
/// #   use storage_array::collections::BitArray;
/// let bits: BitArray = BitArray::from([true, false, true, false, false, false, false, false, false, true]);
///
/// let mut cursor = bits.begin() + 7;
/// cursor += 2;
///
/// assert_eq!(Some(true), cursor.get());
/// assert_eq!(Ok(1), bits.end() - cursor);
/// assert_eq!(Ok(10), bits.end() - bits.begin());
/// ```
pub struct BitCursor<'a> {
    chunks: &'a [u8],
    origin: *const (),
    len: usize,
    chunk: usize,
    offset: u32,
}

impl<'a> BitCursor<'a> {
    fn new(chunks: &'a [u8], origin: *const (), len: usize, index: usize) -> Self {
        let (IndexOfChunk(chunk), IndexInChunk(offset)) = BitChunk::split(index);

        Self {
            chunks,
            origin,
            len,
            chunk,
            offset,
        }
    }

    /// Returns the index of the position.
    ///
    /// #   Panics
    ///
    /// If the index overflows, which only a cursor moved far past the end can do.
    #[inline]
    pub fn index(&self) -> usize {
        match BitChunk::fuse(IndexOfChunk(self.chunk), IndexInChunk(self.offset)) {
            Some(index) => index,
            None => panic!("cursor overflow"),
        }
    }

    /// Returns the bit at this position, or `None` if one past the last.
    #[inline]
    pub fn get(&self) -> Option<bool> {
        if self.index() >= self.len {
            return None;
        }

        Some(BitChunk(self.chunks[self.chunk]).is_set(IndexInChunk(self.offset)))
    }

    /// Returns the number of steps from `self` to `other`.
    ///
    /// #   Errors
    ///
    /// Returns an error if `self` and `other` were not taken from the same array.
    pub fn distance(&self, other: &Self) -> Result<isize, MismatchedCursorsError> {
        self.check(other)?;

        let mut chunk_diff = other.chunk as isize - self.chunk as isize;
        let mut offset_diff = other.offset as isize - self.offset as isize;

        //  Borrow a chunk, should the offset wrap.
        if offset_diff < 0 {
            chunk_diff -= 1;
            offset_diff += BitChunk::BITS as isize;
        }

        Ok(chunk_diff * BitChunk::BITS as isize + offset_diff)
    }

    /// Compares the positions of `self` and `other`.
    ///
    /// #   Errors
    ///
    /// Returns an error if `self` and `other` were not taken from the same array.
    pub fn try_cmp(&self, other: &Self) -> Result<cmp::Ordering, MismatchedCursorsError> {
        self.check(other)?;

        Ok((self.chunk, self.offset).cmp(&(other.chunk, other.offset)))
    }

    fn check(&self, other: &Self) -> Result<(), MismatchedCursorsError> {
        if self.origin == other.origin {
            Ok(())
        } else {
            Err(MismatchedCursorsError)
        }
    }
}

impl Add<usize> for BitCursor<'_> {
    type Output = Self;

    #[inline]
    fn add(mut self, steps: usize) -> Self {
        self += steps;
        self
    }
}

impl AddAssign<usize> for BitCursor<'_> {
    fn add_assign(&mut self, steps: usize) {
        let (IndexOfChunk(chunks), IndexInChunk(offset)) = BitChunk::split(steps);

        let mut chunk = self.chunk.checked_add(chunks);
        let mut offset = self.offset + offset;

        if offset >= BitChunk::BITS as u32 {
            offset -= BitChunk::BITS as u32;
            chunk = chunk.and_then(|chunk| chunk.checked_add(1));
        }

        let Some(chunk) = chunk else {
            panic!("cursor overflow")
        };

        self.chunk = chunk;
        self.offset = offset;
    }
}

impl Sub<usize> for BitCursor<'_> {
    type Output = Self;

    #[inline]
    fn sub(mut self, steps: usize) -> Self {
        self -= steps;
        self
    }
}

impl SubAssign<usize> for BitCursor<'_> {
    fn sub_assign(&mut self, steps: usize) {
        let (IndexOfChunk(chunks), IndexInChunk(offset)) = BitChunk::split(steps);

        let mut chunk = self.chunk.checked_sub(chunks);
        let mut current = self.offset;

        if offset > current {
            current += BitChunk::BITS as u32;
            chunk = chunk.and_then(|chunk| chunk.checked_sub(1));
        }

        let Some(chunk) = chunk else {
            panic!("cursor moved before the first bit")
        };

        self.chunk = chunk;
        self.offset = current - offset;
    }
}

impl Sub for BitCursor<'_> {
    type Output = Result<isize, MismatchedCursorsError>;

    #[inline]
    fn sub(self, other: Self) -> Self::Output {
        other.distance(&self)
    }
}

impl Clone for BitCursor<'_> {
    fn clone(&self) -> Self {
        *self
    }
}

impl Copy for BitCursor<'_> {}

impl fmt::Debug for BitCursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("BitCursor")
            .field("origin", &self.origin)
            .field("chunk", &self.chunk)
            .field("offset", &self.offset)
            .finish()
    }
}

impl PartialEq for BitCursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.try_cmp(other) == Ok(cmp::Ordering::Equal)
    }
}

impl PartialOrd for BitCursor<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        self.try_cmp(other).ok()
    }
}

/// An iterator over the bits of a `BitArray`.
#[derive(Clone, Debug)]
pub struct BitIter<'a> {
    front: BitCursor<'a>,
    back: BitCursor<'a>,
}

impl Iterator for BitIter<'_> {
    type Item = bool;

    #[inline]
    fn next(&mut self) -> Option<bool> {
        if self.front == self.back {
            return None;
        }

        let value = self.front.get();

        self.front += 1;

        value
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back.index() - self.front.index();

        (len, Some(len))
    }
}

impl DoubleEndedIterator for BitIter<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<bool> {
        if self.front == self.back {
            return None;
        }

        self.back -= 1;

        self.back.get()
    }
}

impl ExactSizeIterator for BitIter<'_> {}

impl FusedIterator for BitIter<'_> {}

// mod tests
