//  See `BitChunk` type.
//
//  #   Why a dedicated type?
//
//  Methods on `u8` itself would require an extension trait, to be imported at every call site. A newtype carries its
//  methods along, and keeps a byte of bits from being mistaken for a byte of data.
//
//
//  #   Why `u8`?
//
//  The bit array is built atop a `Storage<u8>`, like any other `Array`, and therefore addresses its bits byte by byte:
//  bit `i` lives in byte `i >> 3`, at position `i & 7`.
//
//  A wider chunk would allow faster bulk operations, but would force the storage to hand out wider slots, and round up
//  every allocation to that width.

/// A chunk of 8 bits.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct BitChunk(pub u8);

/// The index of a chunk, in a sequence of chunks.
///
/// #   Why `usize`?
///
/// It indexes the bytes of a storage, and slices are indexed by `usize`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct IndexOfChunk(pub usize);

/// The index of a bit in a chunk.
///
/// Valid values are 0 to 7 inclusive, which `BitChunk::split` always produces.
///
/// #   Panics
///
/// In Debug, most operations taking an `IndexInChunk` will panic if its value is strictly greater than 7.
///
/// In Release, any high bit will be ignored (masked away).
///
/// #   Why `u32`?
///
/// It is nearly only ever used as the right-hand side of a shift, which takes a `u32`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct IndexInChunk(pub u32);

//
//  Constants.
//

impl BitChunk {
    /// Number of bits in a chunk.
    pub const BITS: usize = 8;

    /// An all-zeros bit chunk.
    pub const ALL_ZEROS: Self = Self(0);

    /// An all-ones bit chunk.
    pub const ALL_ONES: Self = Self(!0);
}

//
//  Static operations.
//

impl BitChunk {
    /// Splits a bit index into an index-of-chunk/index-in-chunk pair.
    ///
    /// #   Examples
    ///
    /// ```
    /// #   use storage_array::utils::BitChunk;
    /// let (of_chunk, in_chunk) = BitChunk::split(21);
    ///
    /// assert_eq!(2, of_chunk.0);
    /// assert_eq!(5, in_chunk.0);
    /// ```
    #[inline]
    pub const fn split(index: usize) -> (IndexOfChunk, IndexInChunk) {
        let of_chunk = IndexOfChunk(index >> 3);
        let in_chunk = IndexInChunk((index & 7) as u32);

        (of_chunk, in_chunk)
    }

    /// Fuses a pair of index-of-chunk/index-in-chunk into a bit index.
    ///
    /// Returns None if the bit index overflows. This will never happen for pairs obtained from `Self::split`.
    ///
    /// #   Panics
    ///
    /// See `IndexInChunk`.
    ///
    /// #   Examples
    ///
    /// ```
    /// #   use storage_array::utils::{BitChunk, IndexInChunk, IndexOfChunk};
    /// let index = BitChunk::fuse(IndexOfChunk(2), IndexInChunk(5)).expect("no overflow");
    ///
    /// assert_eq!(21, index);
    /// ```
    #[inline]
    pub const fn fuse(of_chunk: IndexOfChunk, in_chunk: IndexInChunk) -> Option<usize> {
        debug_assert!(in_chunk.0 < Self::BITS as _);

        //  FIXME: convert to `?` when it is const.
        let Some(index) = of_chunk.0.checked_mul(Self::BITS) else {
            return None;
        };

        //  Mask to ensure the addition only ever fills the low bits.
        let in_chunk = (in_chunk.0 as usize) % Self::BITS;

        Some(index | in_chunk)
    }

    /// Returns the number of chunks necessary to hold `bits` bits.
    ///
    /// ```
    /// #   use storage_array::utils::BitChunk;
    /// assert_eq!(0, BitChunk::chunks_for(0));
    /// assert_eq!(1, BitChunk::chunks_for(8));
    /// assert_eq!(2, BitChunk::chunks_for(9));
    /// ```
    #[inline]
    pub const fn chunks_for(bits: usize) -> usize {
        bits.div_ceil(Self::BITS)
    }
}

// mod static_tests

//
//  Bit operations.
//

impl BitChunk {
    /// Returns the number of bits set.
    ///
    /// ```
    /// #   use storage_array::utils::BitChunk;
    /// assert_eq!(0, BitChunk::ALL_ZEROS.count());
    /// assert_eq!(8, BitChunk::ALL_ONES.count());
    /// ```
    #[inline]
    pub const fn count(&self) -> usize {
        self.0.count_ones() as _
    }

    /// Returns whether the given bit is set.
    ///
    /// #   Panics
    ///
    /// See `IndexInChunk`.
    ///
    /// #   Examples
    ///
    /// ```
    /// #   use storage_array::utils::{BitChunk, IndexInChunk};
    /// let chunk = BitChunk(0b1001);
    ///
    /// assert!(chunk.is_set(IndexInChunk(0)));
    /// assert!(chunk.is_set(IndexInChunk(3)));
    ///
    /// for i in (1..=2).chain(4..=7) {
    ///     assert!(!chunk.is_set(IndexInChunk(i)));
    /// }
    /// ```
    #[inline]
    pub const fn is_set(&self, bit: IndexInChunk) -> bool {
        let mask = Self::bit_mask(bit);

        (self.0 & mask) != 0
    }

    /// Sets a bit, with an OR.
    ///
    /// Returns whether the bit is newly set, or not.
    ///
    /// #   Panics
    ///
    /// See `IndexInChunk`.
    ///
    /// #   Examples
    ///
    /// ```
    /// #   use storage_array::utils::{BitChunk, IndexInChunk};
    /// let mut chunk = BitChunk(0b1001);
    ///
    /// assert!(!chunk.set(IndexInChunk(0)));
    /// assert!(chunk.set(IndexInChunk(2)));
    ///
    /// assert_eq!(0b1101, chunk.0);
    /// ```
    #[inline]
    pub const fn set(&mut self, bit: IndexInChunk) -> bool {
        let mask = Self::bit_mask(bit);

        let result = (self.0 & mask) == 0;

        self.0 |= mask;

        result
    }

    /// Resets a bit, with an AND-NOT.
    ///
    /// Returns whether the bit was set, or not.
    ///
    /// #   Panics
    ///
    /// See `IndexInChunk`.
    ///
    /// #   Examples
    ///
    /// ```
    /// #   use storage_array::utils::{BitChunk, IndexInChunk};
    /// let mut chunk = BitChunk(0b1001);
    ///
    /// assert!(chunk.reset(IndexInChunk(0)));
    /// assert!(!chunk.reset(IndexInChunk(2)));
    ///
    /// assert_eq!(0b1000, chunk.0);
    /// ```
    #[inline]
    pub const fn reset(&mut self, bit: IndexInChunk) -> bool {
        let mask = Self::bit_mask(bit);

        let result = (self.0 & mask) != 0;

        self.0 &= !mask;

        result
    }

    /// Sets, or resets, a bit depending on `value`.
    ///
    /// Returns the previous value of the bit.
    #[inline]
    pub const fn assign(&mut self, bit: IndexInChunk, value: bool) -> bool {
        if value { !self.set(bit) } else { self.reset(bit) }
    }
}

// mod bit_tests

//
//  Implementation details
//

impl BitChunk {
    //  Mask of the bit.
    #[inline]
    const fn bit_mask(bit: IndexInChunk) -> u8 {
        debug_assert!(bit.0 < Self::BITS as _);

        //  Mask to ensure the shift doesn't overflow.
        let shift = bit.0 % Self::BITS as u32;

        1 << shift
    }
}
