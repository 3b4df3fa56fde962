//! Scoped write access to a read-only bag.

use std::ops::{Deref, DerefMut};

use crate::variables::bag::ReadOnlyToggle;

/// Guard that makes a bag writable for its lifetime.
///
/// The read-only flag observed at acquisition is put back when the guard is
/// dropped, including during unwinding.
#[derive(Debug)]
pub struct WritableScope<'a, B: ReadOnlyToggle> {
    bag: &'a mut B,
    was_read_only: bool,
}

impl<'a, B: ReadOnlyToggle> WritableScope<'a, B> {
    /// Capture the bag's flag and clear it if set.
    pub fn acquire(bag: &'a mut B) -> Self {
        let was_read_only = bag.is_read_only();
        if was_read_only {
            bag.set_read_only(false);
        }
        Self { bag, was_read_only }
    }
}

impl<B: ReadOnlyToggle> Deref for WritableScope<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.bag
    }
}

impl<B: ReadOnlyToggle> DerefMut for WritableScope<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.bag
    }
}

impl<B: ReadOnlyToggle> Drop for WritableScope<'_, B> {
    fn drop(&mut self) {
        self.bag.set_read_only(self.was_read_only);
    }
}
