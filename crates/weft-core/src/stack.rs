//! A stack whose public interface has no check-then-act race

use parking_lot::Mutex;

/// Errors returned by stack operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StackError {
    /// Pop attempted while the stack was empty
    #[error("pop from an empty stack")]
    Empty,
}

/// A LIFO container safe for concurrent use through `&self`.
///
/// The classic `empty()` / `top()` / `pop()` protocol is racy even when
/// each call locks internally: another thread can mutate the stack
/// between the calls. This type removes the race at the interface level
/// instead: observing and removing the top element is one guarded step
/// ([`pop`](Self::pop)), there is deliberately no `top()`/`peek()`, and
/// no operation ever hands out a reference into the guarded storage.
///
/// [`is_empty`](Self::is_empty) and [`len`](Self::len) remain available
/// but their answers are stale the instant they return on a shared
/// stack; callers needing atomicity across observe-then-act must use
/// `pop` and handle [`StackError::Empty`].
pub struct ThreadSafeStack<T> {
    items: Mutex<Vec<T>>,
}

impl<T> ThreadSafeStack<T> {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    /// Create an empty stack with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Push a value onto the stack.
    pub fn push(&self, value: T) {
        self.items.lock().push(value);
    }

    /// Remove and return the top element.
    ///
    /// Observation and removal happen as one guarded step: no two
    /// concurrent callers can ever observe and remove the same element,
    /// and a push can never land between a caller's emptiness check and
    /// its removal. Moving the element out of the storage cannot fail,
    /// so a popped value is never lost.
    ///
    /// Fails with [`StackError::Empty`] if the stack is empty at the
    /// instant the guard is held; never blocks waiting for an element.
    pub fn pop(&self) -> Result<T, StackError> {
        self.items.lock().pop().ok_or(StackError::Empty)
    }

    /// Remove the top element, writing it through `out`.
    ///
    /// Same semantics as [`pop`](Self::pop); on failure `*out` is left
    /// unchanged. Convenient when the caller already owns a slot for the
    /// result.
    pub fn pop_into(&self, out: &mut T) -> Result<(), StackError> {
        let mut items = self.items.lock();
        match items.pop() {
            Some(value) => {
                *out = value;
                Ok(())
            }
            None => Err(StackError::Empty),
        }
    }

    /// Check whether the stack was empty at the instant of the call.
    ///
    /// On a shared stack the answer may be outdated before it is
    /// returned; do not build check-then-act sequences on it.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Number of elements at the instant of the call.
    ///
    /// Same staleness caveat as [`is_empty`](Self::is_empty).
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Consume the stack and return its storage, bottom first.
    ///
    /// Taking `self` by value proves no other thread can still reach the
    /// stack, so the storage can be handed out directly.
    pub fn into_inner(self) -> Vec<T> {
        self.items.into_inner()
    }
}

impl<T> Default for ThreadSafeStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for ThreadSafeStack<T> {
    /// Snapshot the source under its guard.
    fn clone(&self) -> Self {
        Self {
            items: Mutex::new(self.items.lock().clone()),
        }
    }
}
