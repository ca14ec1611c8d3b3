use std::ops::{Deref, DerefMut};

/// Owns a raw SQLite handle and releases it with `dropper` when dropped.
pub(crate) struct CBox<T: Copy> {
    value: T,
    dropper: fn(T),
}

impl<T: Copy> CBox<T> {
    pub(crate) fn new(value: T, dropper: fn(T)) -> Self {
        Self { value, dropper }
    }
}

impl<T: Copy> Deref for CBox<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T: Copy> DerefMut for CBox<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.value
    }
}

impl<T: Copy> Drop for CBox<T> {
    fn drop(&mut self) {
        (self.dropper)(self.value);
    }
}
