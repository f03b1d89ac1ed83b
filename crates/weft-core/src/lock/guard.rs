//! RAII guards for automatic lock release

use crate::lock::Lockable;

/// Errors that can occur when driving a [`MovableGuard`] manually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    /// `lock` called while the guard already owns the lock
    #[error("guard already owns the lock")]
    AlreadyOwned,

    /// `unlock` called while the guard does not own the lock
    #[error("guard does not own the lock")]
    NotOwned,
}

/// Scoped RAII guard: releases the lock exactly once, on drop.
///
/// The guard releases on every exit path, including unwinding, which
/// prevents deadlocks caused by a forgotten or skipped release. There is
/// no early-unlock or transfer surface; use [`MovableGuard`] when the
/// critical section needs shrinking or ownership has to travel.
pub struct LockGuard<'a, L: Lockable + ?Sized> {
    lock: &'a L,
}

impl<'a, L: Lockable + ?Sized> LockGuard<'a, L> {
    /// Acquire the lock and guard it.
    pub fn acquire(lock: &'a L) -> Self {
        lock.lock();
        Self { lock }
    }

    /// Guard a lock the calling thread already holds, without re-locking.
    ///
    /// The caller must actually hold the lock; adopting an unheld lock
    /// leads to a spurious release on drop.
    pub fn adopt(lock: &'a L) -> Self {
        Self { lock }
    }
}

impl<L: Lockable + ?Sized> Drop for LockGuard<'_, L> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}

/// Movable RAII guard with deferred acquisition and early release.
///
/// Unlike [`LockGuard`], a `MovableGuard` can be constructed without
/// owning the lock (`defer`), released and re-acquired within one scope,
/// returned from functions, and stored in containers. Moving the guard
/// moves responsibility for the release with it; the moved-from binding
/// is statically unusable, so a lock can never be released twice.
pub struct MovableGuard<'a, L: Lockable + ?Sized> {
    lock: &'a L,
    owned: bool,
}

impl<'a, L: Lockable + ?Sized> MovableGuard<'a, L> {
    /// Acquire the lock and guard it.
    pub fn acquire(lock: &'a L) -> Self {
        lock.lock();
        Self { lock, owned: true }
    }

    /// Guard a lock the calling thread already holds, without re-locking.
    ///
    /// The caller must actually hold the lock.
    pub fn adopt(lock: &'a L) -> Self {
        Self { lock, owned: true }
    }

    /// Bind to a lock without acquiring it.
    ///
    /// The guard starts out not owning the lock; acquire later with
    /// [`lock`](Self::lock) or [`try_lock`](Self::try_lock).
    pub fn defer(lock: &'a L) -> Self {
        Self { lock, owned: false }
    }

    /// Acquire the guarded lock, blocking until it is free.
    pub fn lock(&mut self) -> Result<(), GuardError> {
        if self.owned {
            return Err(GuardError::AlreadyOwned);
        }
        self.lock.lock();
        self.owned = true;
        Ok(())
    }

    /// Attempt to acquire the guarded lock without blocking.
    ///
    /// `Ok(false)` means the attempt did not acquire the lock; the guard
    /// state is unchanged.
    pub fn try_lock(&mut self) -> Result<bool, GuardError> {
        if self.owned {
            return Err(GuardError::AlreadyOwned);
        }
        if self.lock.try_lock() {
            self.owned = true;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Release the lock early, before the guard is dropped.
    ///
    /// Useful to shrink a critical section around expensive work that
    /// does not touch the shared data. The guard may re-acquire with
    /// [`lock`](Self::lock) afterwards.
    pub fn unlock(&mut self) -> Result<(), GuardError> {
        if !self.owned {
            return Err(GuardError::NotOwned);
        }
        self.owned = false;
        self.lock.unlock();
        Ok(())
    }

    /// Check whether this guard currently owns the lock.
    pub fn owns(&self) -> bool {
        self.owned
    }
}

impl<L: Lockable + ?Sized> Drop for MovableGuard<'_, L> {
    fn drop(&mut self) {
        if self.owned {
            self.lock.unlock();
        }
    }
}
