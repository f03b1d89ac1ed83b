//! Lock capability trait and the default physical lock

use parking_lot::lock_api::RawMutex as _;
use parking_lot::RawMutex;

/// Capability contract satisfied by any mutex-like resource.
///
/// Everything else in this module is generic over `Lockable`, so guards,
/// hierarchies, and multi-acquisition compose over any implementor.
///
/// Implementations must guarantee that at most one thread holds the lock
/// at a time. Reentrant acquisition by the holding thread is not supported
/// and may deadlock.
pub trait Lockable {
    /// Acquire the lock, blocking the calling thread until it is free.
    fn lock(&self);

    /// Attempt to acquire the lock without blocking.
    ///
    /// Returns `true` if the lock was acquired.
    fn try_lock(&self) -> bool;

    /// Release the lock.
    ///
    /// The calling thread must currently hold the lock. Releasing a lock
    /// held by another thread (or not held at all) is a logic error.
    fn unlock(&self);
}

/// Default physical lock backed by `parking_lot::RawMutex`.
///
/// A thin, non-reentrant mutex with no data attached, suitable for
/// wrapping in [`HierarchicalLock`](crate::lock::HierarchicalLock) or
/// passing to [`multi_lock`](crate::lock::multi_lock).
pub struct RawLock {
    raw: RawMutex,
}

impl RawLock {
    /// Create a new unlocked `RawLock`.
    pub const fn new() -> Self {
        Self {
            raw: <RawMutex as parking_lot::lock_api::RawMutex>::INIT,
        }
    }

    /// Check whether the lock is currently held by some thread.
    ///
    /// The answer is stale the instant it is produced; use it for
    /// diagnostics and tests, never for synchronization decisions.
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }
}

impl Default for RawLock {
    fn default() -> Self {
        Self::new()
    }
}

impl Lockable for RawLock {
    fn lock(&self) {
        self.raw.lock();
    }

    fn try_lock(&self) -> bool {
        self.raw.try_lock()
    }

    fn unlock(&self) {
        // Contract: the caller holds the lock (see trait docs).
        unsafe { self.raw.unlock() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_lock_starts_unlocked() {
        let lock = RawLock::new();
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_raw_lock_lock_unlock() {
        let lock = RawLock::new();

        lock.lock();
        assert!(lock.is_locked());

        lock.unlock();
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_raw_lock_try_lock_contended() {
        let lock = RawLock::new();

        assert!(lock.try_lock());
        assert!(lock.is_locked());

        // Second attempt from anywhere must fail while held
        std::thread::scope(|s| {
            s.spawn(|| {
                assert!(!lock.try_lock());
            });
        });

        lock.unlock();
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_raw_lock_default() {
        let lock = RawLock::default();
        assert!(!lock.is_locked());
    }
}
