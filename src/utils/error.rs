//  Errors.

use core::{
    alloc::Layout,
    error, fmt,
    ops::{Bound, Range, RangeBounds},
};

/// An index at, or past, the length of a sequence.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct OutOfRangeError {
    /// The offending index.
    pub index: usize,
    /// The length of the sequence, at the time of access.
    pub len: usize,
}

impl fmt::Display for OutOfRangeError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "index {} out of range for length {}", self.index, self.len)
    }
}

impl error::Error for OutOfRangeError {}

/// An error in obtaining backing memory from a storage.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StorageError {
    /// The requested capacity cannot be expressed, either as a number of slots or as a `Layout`.
    CapacityOverflow,
    /// The allocator could not provide a block of memory for this layout.
    AllocFailed {
        /// Layout of the failed request.
        layout: Layout,
    },
    /// A fixed-capacity storage was asked for more slots than it has.
    CapacityExceeded {
        /// Number of slots requested.
        requested: usize,
        /// Number of slots available.
        capacity: usize,
    },
}

impl StorageError {
    //  Turns the error into a fatal failure, for the infallible flavors of the fallible operations.
    //
    //  Allocation failures are routed to the global allocation error handler, just like `Vec` does.
    #[cold]
    #[inline(never)]
    #[track_caller]
    pub(crate) fn fail(self) -> ! {
        #[cfg(feature = "alloc")]
        if let Self::AllocFailed { layout } = self {
            ::alloc::alloc::handle_alloc_error(layout)
        }

        panic!("{self}")
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Self::CapacityOverflow => f.write_str("capacity overflow"),
            Self::AllocFailed { layout } => write!(
                f,
                "memory allocation of {} bytes (align {}) failed",
                layout.size(),
                layout.align()
            ),
            Self::CapacityExceeded { requested, capacity } => {
                write!(f, "requested {requested} slots from a storage of {capacity} slots")
            }
        }
    }
}

impl error::Error for StorageError {}

/// An error in pushing an element, handing the element back.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct PushError<T> {
    value: T,
    error: StorageError,
}

impl<T> PushError<T> {
    pub(crate) const fn new(value: T, error: StorageError) -> Self {
        Self { value, error }
    }

    /// Returns the reason for the failure.
    pub const fn error(&self) -> StorageError {
        self.error
    }

    /// Returns the element which could not be pushed.
    pub fn into_inner(self) -> T {
        self.value
    }
}

//  Manual, so as not to require `T: Debug` for `unwrap` & co.
impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("PushError").field("error", &self.error).finish_non_exhaustive()
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "failed to push element: {}", self.error)
    }
}

impl<T> error::Error for PushError<T> {}

/// An error in relating two cursors which do not point into the same container.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MismatchedCursorsError;

impl fmt::Display for MismatchedCursorsError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.write_str("cursors belong to different containers")
    }
}

impl error::Error for MismatchedCursorsError {}

//  Resolves `range` against a sequence of `len` elements.
//
//  Reports the first offending bound, if any.
pub(crate) fn resolve_range<R>(range: R, len: usize) -> Result<Range<usize>, OutOfRangeError>
where
    R: RangeBounds<usize>,
{
    let start = match range.start_bound() {
        Bound::Included(&start) => start,
        Bound::Excluded(&start) => start.checked_add(1).ok_or(OutOfRangeError { index: start, len })?,
        Bound::Unbounded => 0,
    };

    let end = match range.end_bound() {
        Bound::Included(&end) => end.checked_add(1).ok_or(OutOfRangeError { index: end, len })?,
        Bound::Excluded(&end) => end,
        Bound::Unbounded => len,
    };

    if end > len {
        return Err(OutOfRangeError { index: end, len });
    }

    if start > end {
        return Err(OutOfRangeError { index: start, len });
    }

    Ok(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_full() {
        assert_eq!(Ok(0..5), resolve_range(.., 5));
        assert_eq!(Ok(1..5), resolve_range(1.., 5));
        assert_eq!(Ok(0..3), resolve_range(..3, 5));
        assert_eq!(Ok(0..4), resolve_range(..=3, 5));
        assert_eq!(Ok(2..2), resolve_range(2..2, 5));
    }

    #[test]
    fn resolve_out_of_range() {
        assert_eq!(Err(OutOfRangeError { index: 6, len: 5 }), resolve_range(..6, 5));
        assert_eq!(Err(OutOfRangeError { index: 6, len: 5 }), resolve_range(..=5, 5));
        assert_eq!(Err(OutOfRangeError { index: 4, len: 5 }), resolve_range(4..3, 5));
        assert_eq!(
            Err(OutOfRangeError { index: usize::MAX, len: 5 }),
            resolve_range(..=usize::MAX, 5)
        );
    }

    #[test]
    fn display() {
        let error = OutOfRangeError { index: 7, len: 3 };

        assert_eq!("index 7 out of range for length 3", error.to_string());

        let error = StorageError::CapacityExceeded { requested: 8, capacity: 4 };

        assert_eq!("requested 8 slots from a storage of 4 slots", error.to_string());
    }
} // mod tests
