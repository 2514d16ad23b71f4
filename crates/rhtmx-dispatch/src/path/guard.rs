//! Scoped snapshot that restores path state on every exit path
//!
//! A [`SnapshotGuard`] takes a snapshot when created and restores it when
//! dropped, which includes unwinding out of a panicking handler. While alive
//! it dereferences to the guarded value, so nested matching runs through it.

use std::ops::{Deref, DerefMut};

use super::{PathState, Snapshot};

/// Anything that owns a [`PathState`] cursor.
pub trait PathCursor {
    fn path_state(&self) -> &PathState;
    fn path_state_mut(&mut self) -> &mut PathState;
}

impl PathCursor for PathState {
    fn path_state(&self) -> &PathState {
        self
    }

    fn path_state_mut(&mut self) -> &mut PathState {
        self
    }
}

/// RAII guard around a path snapshot.
///
/// # Examples
///
/// ```
/// use rhtmx_dispatch::path::{PathState, SnapshotGuard};
///
/// let mut state = PathState::new("", "/posts/1");
/// {
///     let mut guard = SnapshotGuard::new(&mut state);
///     guard.advance("/posts".len());
///     assert_eq!(guard.remaining(), "/1");
/// }
/// assert_eq!(state.remaining(), "/posts/1");
/// ```
pub struct SnapshotGuard<'a, T: PathCursor + ?Sized> {
    inner: &'a mut T,
    snapshot: Snapshot,
    armed: bool,
}

impl<'a, T: PathCursor + ?Sized> SnapshotGuard<'a, T> {
    pub fn new(inner: &'a mut T) -> Self {
        let snapshot = inner.path_state().snapshot();
        Self {
            inner,
            snapshot,
            armed: true,
        }
    }

    /// Keeps the current path state; the guard no longer restores on drop.
    pub fn commit(mut self) {
        self.armed = false;
    }

    /// The snapshot this guard will restore.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot
    }
}

impl<T: PathCursor + ?Sized> Deref for SnapshotGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.inner
    }
}

impl<T: PathCursor + ?Sized> DerefMut for SnapshotGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.inner
    }
}

impl<T: PathCursor + ?Sized> Drop for SnapshotGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.inner.path_state_mut().restore(self.snapshot);
        }
    }
}
