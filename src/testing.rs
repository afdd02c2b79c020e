//  Test utilities.
//
//  `Tracked` registers every live instance in a thread-local set, so that tests can assert that no instance was
//  leaked, and so that destructing the same instance twice fails loudly. It can also be armed to panic on a given
//  clone, to exercise unwinding paths.

use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
    fmt,
};

thread_local! {
    static LIVE: RefCell<HashSet<u64>> = RefCell::new(HashSet::new());
    static NEXT_ID: Cell<u64> = const { Cell::new(0) };
    static CLONES_BEFORE_PANIC: Cell<Option<usize>> = const { Cell::new(None) };
}

/// An instance-tracking value.
pub(crate) struct Tracked<T = u32> {
    id: u64,
    value: T,
}

impl<T> Tracked<T> {
    /// Creates, and registers, a new instance.
    pub(crate) fn new(value: T) -> Self {
        let id = NEXT_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });

        LIVE.with(|live| live.borrow_mut().insert(id));

        Self { id, value }
    }

    /// Returns the wrapped value.
    pub(crate) fn value(&self) -> &T {
        &self.value
    }
}

impl Tracked {
    /// Returns the number of live instances, on this thread.
    pub(crate) fn live() -> usize {
        LIVE.with(|live| live.borrow().len())
    }

    /// Asserts that no instance is live, on this thread.
    #[track_caller]
    pub(crate) fn expect_no_instances() {
        assert_eq!(0, Self::live(), "leaked instances");
    }

    /// Arms the `n`-th clone, from now on, to panic.
    pub(crate) fn panic_on_clone(n: usize) {
        assert!(n > 0);

        CLONES_BEFORE_PANIC.with(|count| count.set(Some(n)));
    }

    /// Disarms any pending panic.
    pub(crate) fn disarm() {
        CLONES_BEFORE_PANIC.with(|count| count.set(None));
    }
}

impl<T> Clone for Tracked<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        let armed = CLONES_BEFORE_PANIC.with(|count| match count.get() {
            Some(1) => {
                count.set(None);
                true
            }
            Some(n) => {
                count.set(Some(n - 1));
                false
            }
            None => false,
        });

        if armed {
            panic!("clone of instance {} failed", self.id);
        }

        Self::new(self.value.clone())
    }
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        let removed = LIVE.with(|live| live.borrow_mut().remove(&self.id));

        assert!(removed, "instance {} destructed twice", self.id);
    }
}

impl<T> fmt::Debug for Tracked<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_tuple("Tracked").field(&self.value).finish()
    }
}

impl<T> Default for Tracked<T>
where
    T: Default,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> PartialEq for Tracked<T>
where
    T: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_count() {
        let a = Tracked::new(1);
        let b = a.clone();

        assert_eq!(2, Tracked::live());
        assert_eq!(a, b);

        drop(a);
        drop(b);

        Tracked::expect_no_instances();
    }

    #[test]
    fn armed_clone() {
        let a = Tracked::new(1);

        Tracked::panic_on_clone(2);

        let b = a.clone();

        let result = std::panic::catch_unwind(|| a.clone());

        assert!(result.is_err());
        assert_eq!(2, Tracked::live());

        let c = a.clone();

        assert_eq!(3, Tracked::live());

        drop((a, b, c));

        Tracked::expect_no_instances();
    }
} // mod tests
