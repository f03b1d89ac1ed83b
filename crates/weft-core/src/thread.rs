//! Join-on-drop ownership of a spawned thread

use std::panic;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle, Thread};

static NEXT_THREAD_NUM: AtomicU64 = AtomicU64::new(1);

/// Errors from misusing an emptied thread wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ThreadError {
    /// The wrapper no longer owns a joinable thread
    #[error("wrapper does not own a joinable thread")]
    NotJoinable,
}

/// Owns one spawned thread and joins it before going away.
///
/// Whatever path leaves the scope (normal return, `?`, unwinding), the
/// owned thread is joined exactly once, so the thread can never outlive
/// the data it borrows from the creating scope's environment by
/// accident. There is deliberately no detach operation: the wrapper's
/// lifetime *is* the bound on the thread's lifetime.
///
/// Ownership is movable (return it, store it in a container, hand it to
/// [`take_from`](Self::take_from)); after the handle moves out, the
/// emptied wrapper's drop is a no-op. The wrapper is not copyable.
#[derive(Debug)]
pub struct ScopedThread<T = ()> {
    handle: Option<JoinHandle<T>>,
}

impl<T> ScopedThread<T> {
    /// Take ownership of a started thread.
    ///
    /// A `JoinHandle` is joinable by construction, so wrapping one cannot
    /// fail; the not-joinable case only arises when adopting out of
    /// another wrapper, see [`take_from`](Self::take_from).
    pub fn new(handle: JoinHandle<T>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Adopt the thread owned by another wrapper.
    ///
    /// Fails with [`ThreadError::NotJoinable`] if `other` no longer owns
    /// one. On success `other` is emptied and its drop becomes a no-op.
    pub fn take_from(other: &mut ScopedThread<T>) -> Result<Self, ThreadError> {
        match other.handle.take() {
            Some(handle) => Ok(Self::new(handle)),
            None => Err(ThreadError::NotJoinable),
        }
    }

    /// Join the owned thread now instead of at drop.
    ///
    /// Returns the thread's result. If the thread panicked, the panic is
    /// resumed on the calling thread. Fails with
    /// [`ThreadError::NotJoinable`] if the handle was already taken.
    pub fn join(mut self) -> Result<T, ThreadError> {
        let handle = self.handle.take().ok_or(ThreadError::NotJoinable)?;
        match handle.join() {
            Ok(value) => Ok(value),
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// Check whether this wrapper still owns a thread.
    pub fn is_joinable(&self) -> bool {
        self.handle.is_some()
    }

    /// The owned thread, if any.
    pub fn thread(&self) -> Option<&Thread> {
        self.handle.as_ref().map(JoinHandle::thread)
    }
}

impl<T> ScopedThread<T>
where
    T: Send + 'static,
{
    /// Spawn a named thread and own it.
    pub fn spawn<F>(f: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let num = NEXT_THREAD_NUM.fetch_add(1, Ordering::Relaxed);
        let handle = thread::Builder::new()
            .name(format!("weft-thread-{}", num))
            .spawn(f)
            .expect("Failed to spawn thread");
        Self::new(handle)
    }
}

impl<T> Drop for ScopedThread<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(payload) = handle.join() {
                // Surface the child's panic unless this thread is already
                // unwinding (a double panic would abort)
                if !thread::panicking() {
                    panic::resume_unwind(payload);
                }
            }
        }
    }
}
