//! Path state for a single request walk
//!
//! The request path is stored once and split at a cursor: everything before
//! the cursor has been consumed by enclosing matchers, everything after it is
//! still to be matched. Because both halves are views over one string,
//! `consumed() + remaining()` always reconstructs the original path.

pub mod guard;

pub use guard::{PathCursor, SnapshotGuard};

/// Opaque token returned by [`PathState::snapshot`].
///
/// Restoring a snapshot returns the cursor to exactly the position it had when
/// the snapshot was taken, no matter how many matches happened in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot(usize);

/// Consumed-prefix / remaining-path split of the current request.
///
/// # Examples
///
/// ```
/// use rhtmx_dispatch::path::PathState;
///
/// let mut state = PathState::new("", "/users/42");
/// let snapshot = state.snapshot();
///
/// assert!(state.advance("/users".len()));
/// assert_eq!(state.consumed(), "/users");
/// assert_eq!(state.remaining(), "/42");
///
/// state.restore(snapshot);
/// assert_eq!(state.consumed(), "");
/// assert_eq!(state.remaining(), "/users/42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathState {
    path: String,
    cursor: usize,
}

impl PathState {
    /// Creates a path state from an already-consumed prefix and the rest of
    /// the path (CGI `SCRIPT_NAME` / `PATH_INFO`).
    pub fn new(consumed: &str, remaining: &str) -> Self {
        let mut path = String::with_capacity(consumed.len() + remaining.len());
        path.push_str(consumed);
        path.push_str(remaining);

        Self {
            path,
            cursor: consumed.len(),
        }
    }

    /// The portion of the path matched by enclosing operators.
    pub fn consumed(&self) -> &str {
        &self.path[..self.cursor]
    }

    /// The unconsumed suffix; begins with `/` or is empty.
    pub fn remaining(&self) -> &str {
        &self.path[self.cursor..]
    }

    /// The full path (`consumed() + remaining()`).
    pub fn full(&self) -> &str {
        &self.path
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.cursor)
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.cursor = snapshot.0;
    }

    /// Moves `len` bytes from the front of `remaining()` onto `consumed()`.
    ///
    /// Returns `false` and leaves the state untouched when `len` overruns the
    /// remaining path or does not fall on a character boundary.
    pub fn advance(&mut self, len: usize) -> bool {
        let target = self.cursor + len;
        if target > self.path.len() || !self.path.is_char_boundary(target) {
            return false;
        }
        self.cursor = target;
        true
    }

    /// Consumes `prefix` if `remaining()` starts with it.
    pub fn consume_prefix(&mut self, prefix: &str) -> bool {
        self.remaining().starts_with(prefix) && self.advance(prefix.len())
    }

    /// Whether the whole path has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.cursor == self.path.len()
    }
}
